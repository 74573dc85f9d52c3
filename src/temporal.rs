//! Wall-clock timestamps over PackStream.
//!
//! The codec itself has no time type. The wire convention carries an
//! instant as the number of nanoseconds since the Unix epoch, packed as a
//! plain integer, with `0` reserved for the zero (absent) time. This
//! adapter implements that convention on top of the codec's extension
//! hook and typed-target surface.

use std::io::{self, Read};

use chrono::{DateTime, Utc};

use crate::encoder::to_bytes;
use crate::marker::{is_tiny_int, INT_16, INT_32, INT_64, INT_8, NULL};
use crate::value::Value;
use crate::{Assign, PackStreamError, Packer, Unpacker};

/// An instant carried on the wire as epoch nanoseconds.
///
/// The zero timestamp encodes as integer `0`. This makes the epoch instant
/// itself indistinguishable from the zero value on the wire; callers that
/// must tell them apart need a different convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    /// Wrap an instant.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(Some(instant))
    }

    /// The zero timestamp.
    pub fn zero() -> Self {
        Self(None)
    }

    /// Check if this is the zero timestamp.
    pub fn is_zero(&self) -> bool {
        self.0.is_none()
    }

    /// The wrapped instant, if any.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// Build from epoch nanoseconds; `0` is the zero timestamp.
    pub fn from_unix_nanos(nanos: i64) -> Self {
        if nanos == 0 {
            Self(None)
        } else {
            Self(Some(DateTime::from_timestamp_nanos(nanos)))
        }
    }

    /// The wire integer for this timestamp.
    ///
    /// Instants beyond roughly the year 2262 do not fit 64-bit nanoseconds.
    pub fn to_value(&self) -> Result<Value, PackStreamError> {
        match self.0 {
            None => Ok(Value::Integer(0)),
            Some(instant) => instant
                .timestamp_nanos_opt()
                .map(Value::Integer)
                .ok_or(PackStreamError::ValueTooLarge("timestamp")),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::new(instant)
    }
}

impl Packer for Timestamp {
    fn pack(&self) -> Result<Vec<u8>, PackStreamError> {
        Ok(to_bytes(&self.to_value()?)?.to_vec())
    }
}

impl Unpacker for Timestamp {
    fn unpack(&mut self, marker: u8, source: &mut dyn Read) -> Result<(), PackStreamError> {
        let nanos = match marker {
            NULL => {
                *self = Timestamp::zero();
                return Ok(());
            }
            m if is_tiny_int(m) => i64::from(m as i8),
            INT_8 => {
                let mut buf = [0u8; 1];
                fill(source, &mut buf)?;
                i64::from(buf[0] as i8)
            }
            INT_16 => {
                let mut buf = [0u8; 2];
                fill(source, &mut buf)?;
                i64::from(i16::from_be_bytes(buf))
            }
            INT_32 => {
                let mut buf = [0u8; 4];
                fill(source, &mut buf)?;
                i64::from(i32::from_be_bytes(buf))
            }
            INT_64 => {
                let mut buf = [0u8; 8];
                fill(source, &mut buf)?;
                i64::from_be_bytes(buf)
            }
            _ => return Err(PackStreamError::TypeMismatch("non-integer timestamp")),
        };
        *self = Timestamp::from_unix_nanos(nanos);
        Ok(())
    }
}

impl Assign for Timestamp {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => *self = Timestamp::zero(),
            Value::Integer(nanos) => *self = Timestamp::from_unix_nanos(nanos),
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

fn fill(source: &mut dyn Read, buf: &mut [u8]) -> Result<(), PackStreamError> {
    source.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => PackStreamError::Truncated,
        _ => PackStreamError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decoder, Encoder};
    use std::io::Cursor;

    #[test]
    fn zero_packs_as_integer_zero() {
        assert_eq!(Timestamp::zero().pack().unwrap(), vec![0x00]);
        assert_eq!(Timestamp::zero().to_value().unwrap(), Value::Integer(0));
    }

    #[test]
    fn known_instant_bytes() {
        // One second past the epoch: 1_000_000_000 nanoseconds, int32 band.
        let ts = Timestamp::from_unix_nanos(1_000_000_000);
        assert_eq!(ts.pack().unwrap(), vec![0xCA, 0x3B, 0x9A, 0xCA, 0x00]);
    }

    #[test]
    fn roundtrip_through_the_hook() {
        let ts = Timestamp::from_unix_nanos(1_714_857_600_123_456_789);

        let mut encoder = Encoder::new(Vec::new());
        encoder.encode_custom(&ts).unwrap();
        let bytes = encoder.into_inner();

        let mut decoded = Timestamp::zero();
        let mut decoder = Decoder::new(Cursor::new(&bytes[..]));
        decoder.decode_custom(&mut decoded).unwrap();

        assert_eq!(decoded, ts);
        assert_eq!(
            decoded.datetime().unwrap().timestamp_nanos_opt(),
            Some(1_714_857_600_123_456_789)
        );
    }

    #[test]
    fn hook_consumes_exactly_the_payload() {
        // Timestamp bytes followed by another value.
        let mut bytes = Timestamp::from_unix_nanos(42_000_000_000).pack().unwrap();
        bytes.push(0xC3);

        let mut decoder = Decoder::new(Cursor::new(&bytes[..]));
        let mut ts = Timestamp::zero();
        decoder.decode_custom(&mut ts).unwrap();
        assert_eq!(decoder.decode_any().unwrap(), Value::Boolean(true));
    }

    #[test]
    fn tiny_and_wide_bands_decode() {
        for nanos in [1i64, -16, 127, 1000, 100_000, 42_000_000_000, i64::MAX] {
            let bytes = to_bytes(&Value::Integer(nanos)).unwrap();
            let mut ts = Timestamp::zero();
            let mut decoder = Decoder::new(Cursor::new(&bytes[..]));
            decoder.decode_custom(&mut ts).unwrap();
            assert_eq!(ts, Timestamp::from_unix_nanos(nanos), "nanos {}", nanos);
        }
    }

    #[test]
    fn null_marker_yields_zero() {
        let mut ts = Timestamp::from_unix_nanos(42);
        let mut decoder = Decoder::new(Cursor::new(&[0xC0][..]));
        decoder.decode_custom(&mut ts).unwrap();
        assert!(ts.is_zero());
    }

    #[test]
    fn zero_wire_integer_is_the_zero_time() {
        let mut ts = Timestamp::from_unix_nanos(42);
        let mut decoder = Decoder::new(Cursor::new(&[0x00][..]));
        decoder.decode_custom(&mut ts).unwrap();
        assert!(ts.is_zero());
    }

    #[test]
    fn non_integer_wire_is_a_mismatch() {
        let mut ts = Timestamp::zero();
        let mut decoder = Decoder::new(Cursor::new(&[0x85, b'h', b'e', b'l', b'l', b'o'][..]));
        let err = decoder.decode_custom(&mut ts).unwrap_err();
        assert!(matches!(err, PackStreamError::TypeMismatch(_)));
    }

    #[test]
    fn truncated_payload() {
        let mut ts = Timestamp::zero();
        let mut decoder = Decoder::new(Cursor::new(&[0xCB, 0x00][..]));
        let err = decoder.decode_custom(&mut ts).unwrap_err();
        assert!(matches!(err, PackStreamError::Truncated));
    }

    #[test]
    fn assign_from_wire_integer() {
        let mut ts = Timestamp::zero();
        let encoded = to_bytes(&Value::Integer(1_000_000_000)).unwrap();
        let mut decoder = Decoder::new(Cursor::new(&encoded[..]));
        decoder.decode_into(&mut ts).unwrap();
        assert_eq!(ts, Timestamp::from_unix_nanos(1_000_000_000));

        let mut decoder = Decoder::new(Cursor::new(&[0xC0][..]));
        decoder.decode_into(&mut ts).unwrap();
        assert!(ts.is_zero());
    }
}
