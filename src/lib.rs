//! # PackStream codec
//!
//! PackStream is the binary serialization format used by the Bolt protocol
//! to carry values between Neo4j clients and servers. This crate converts
//! between an in-memory [`Value`] tree and the self-describing byte form:
//! one marker byte, an optional big-endian size prefix, then the payload.
//!
//! ## Supported Types
//!
//! - **Null**: single byte marker
//! - **Boolean**: true/false markers
//! - **Integer**: variable-length encoding (-2^63 to 2^63-1), smallest band wins
//! - **Float**: 64-bit IEEE 754
//! - **String**: UTF-8 encoded, variable length prefix
//! - **Bytes**: raw bytes, variable length prefix
//! - **List**: heterogeneous collections
//! - **Map**: string keys to arbitrary values
//! - **Structure**: signature-tagged field sequences (the Bolt message envelope)
//!
//! Streamed lists and maps (unsized, terminated by an end-of-stream marker)
//! are accepted on decode; the encoder always emits sized forms.
//!
//! ## Encoding
//!
//! ```
//! use packstream::{to_bytes, Value};
//!
//! let bytes = to_bytes(&Value::List(vec![Value::Integer(42)])).unwrap();
//! assert_eq!(&bytes[..], &[0x91, 0x2A]);
//! ```
//!
//! ## Decoding
//!
//! ```
//! use packstream::{from_bytes, Value};
//!
//! let (value, consumed) = from_bytes(&[0x91, 0x2A]).unwrap();
//! assert_eq!(value, Value::List(vec![Value::Integer(42)]));
//! assert_eq!(consumed, 2);
//! ```
//!
//! [`Encoder`] and [`Decoder`] wrap arbitrary [`std::io::Write`] /
//! [`std::io::Read`] streams for the non-buffered case. [`Decoder::decode_into`]
//! narrows a wire value into a typed target (see [`Assign`]); the
//! [`Packer`]/[`Unpacker`] traits let a type speak PackStream for itself.

#![warn(missing_docs)]

pub mod assign;
pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod temporal;
pub mod value;

pub use assign::Assign;
pub use decoder::{from_bytes, Decoder};
pub use encoder::{to_bytes, Encoder};
pub use temporal::Timestamp;
pub use value::{Structure, Value};

use std::io::{self, Read};

use thiserror::Error;

/// PackStream errors.
///
/// Every kind is terminal for the current encode or decode call; after an
/// error the underlying stream sits at an indeterminate position and must
/// not be reused for the same message.
#[derive(Debug, Error)]
pub enum PackStreamError {
    /// Source ended before the marker, size or payload was complete
    #[error("unexpected end of PackStream data")]
    Truncated,
    /// Marker byte falls in a reserved range
    #[error("unknown PackStream marker: 0x{0:02X}")]
    UnknownMarker(u8),
    /// End-of-stream marker outside a streamed collection boundary
    #[error("end-of-stream marker outside a streamed collection")]
    UnexpectedEndOfStream,
    /// Wire value's shape is not assignable to the requested target
    #[error("{0} does not fit the requested target")]
    TypeMismatch(&'static str),
    /// Value length or magnitude exceeds the largest band for its type
    #[error("{0} too large for PackStream encoding")]
    ValueTooLarge(&'static str),
    /// Map key decoded to a non-string value
    #[error("map keys must be strings")]
    InvalidKey,
    /// Underlying reader or writer failed (non-EOF)
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

/// Implemented by values that produce their own PackStream bytes.
///
/// The encoder writes the produced bytes verbatim, without inspecting or
/// wrapping them; they must form exactly one valid PackStream value.
pub trait Packer {
    /// Produce the complete byte representation of `self`.
    fn pack(&self) -> Result<Vec<u8>, PackStreamError>;
}

/// Implemented by values that consume their own PackStream payload.
///
/// [`Decoder::decode_custom`] reads the one-byte marker and then hands it
/// over together with the source, positioned at the payload. The
/// implementation must read exactly the payload bytes belonging to that
/// marker, no more and no less; the decoder's cursor advances by whatever
/// is read.
pub trait Unpacker {
    /// Consume the payload for `marker` from `source` into `self`.
    fn unpack(&mut self, marker: u8, source: &mut dyn Read) -> Result<(), PackStreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn roundtrip(value: &Value) -> Value {
        let bytes = to_bytes(value).unwrap();
        let (decoded, consumed) = from_bytes(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        decoded
    }

    #[test]
    fn roundtrip_null() {
        let value = Value::Null;
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn roundtrip_bool() {
        for v in [true, false] {
            let value = Value::Boolean(v);
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn roundtrip_int() {
        for v in [
            0i64,
            1,
            -1,
            127,
            -16,
            128,
            -17,
            -128,
            1000,
            -1000,
            32767,
            -32768,
            32768,
            2_147_483_647,
            -2_147_483_648,
            2_147_483_648,
            i64::MAX,
            i64::MIN,
        ] {
            let value = Value::Integer(v);
            assert_eq!(roundtrip(&value), value, "failed for {}", v);
        }
    }

    #[test]
    fn roundtrip_float() {
        for v in [0.0f64, 1.0, -1.0, 1.1, 3.14159, f64::MAX, f64::MIN] {
            let value = Value::Float(v);
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn roundtrip_string() {
        for s in ["", "a", "hello", "hello world", &"x".repeat(100), &"y".repeat(70_000)] {
            let value = Value::String(s.to_string());
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn roundtrip_bytes() {
        for b in [vec![], vec![1u8], vec![1, 2, 3], vec![0u8; 300]] {
            let value = Value::Bytes(b);
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn roundtrip_list() {
        let value = Value::List(vec![
            Value::Integer(1),
            Value::String("two".into()),
            Value::Boolean(true),
            Value::Null,
        ]);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn roundtrip_map() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::Integer(1));
        map.insert("b".to_string(), Value::String("hello".into()));
        map.insert("c".to_string(), Value::Boolean(false));
        let value = Value::Map(map);
        // Unordered pair-set equality comes from HashMap's PartialEq.
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn roundtrip_structure() {
        let s = Structure::new(
            0x2A,
            vec![
                Value::String("hello".into()),
                Value::List(vec![Value::Integer(55)]),
                Value::Map(HashMap::new()),
            ],
        );
        let value = Value::Structure(s);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn roundtrip_deeply_nested() {
        let mut inner = HashMap::new();
        inner.insert(
            "items".to_string(),
            Value::List(vec![Value::Integer(1), Value::Integer(2)]),
        );
        let value = Value::List(vec![Value::Map(inner.clone()), Value::Map(inner)]);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn canonical_reencode_is_byte_identical() {
        // A canonical buffer decodes and re-encodes to itself.
        for bytes in [
            vec![0x2Au8],
            vec![0xC9, 0x00, 0x80],
            vec![0x91, 0x91, 0x85, 0x68, 0x65, 0x6C, 0x6C, 0x6F],
            vec![0xB2, 0x2A, 0x85, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x91, 0x37],
        ] {
            let (value, _) = from_bytes(&bytes).unwrap();
            assert_eq!(&to_bytes(&value).unwrap()[..], &bytes[..]);
        }
    }

    #[test]
    fn streamed_input_reencodes_sized() {
        // Streamed containers are a decode-time shape only.
        let (value, _) = from_bytes(&[0xD7, 0x2A, 0x2B, 0xDF]).unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Integer(42), Value::Integer(43)])
        );
        assert_eq!(&to_bytes(&value).unwrap()[..], &[0x92, 0x2A, 0x2B]);
    }

    #[test]
    fn every_strict_prefix_is_truncated() {
        let value = Value::Structure(Structure::new(
            0x2A,
            vec![
                Value::String("hello".into()),
                Value::List(vec![Value::Integer(300), Value::Float(1.1)]),
                Value::Bytes(vec![1, 2, 3]),
            ],
        ));
        let bytes = to_bytes(&value).unwrap();
        for len in 0..bytes.len() {
            let err = from_bytes(&bytes[..len]).unwrap_err();
            assert!(
                matches!(err, PackStreamError::Truncated),
                "prefix of {} bytes gave {:?}",
                len,
                err
            );
        }
    }
}
