//! PackStream encoder: [`Value`] → bytes.

use std::collections::HashMap;
use std::io::Write;

use bytes::{BufMut, BytesMut};

use crate::marker::*;
use crate::value::{Structure, Value};
use crate::{PackStreamError, Packer};

/// PackStream encoder over an arbitrary byte sink.
///
/// Writes pass straight through to the sink; nothing larger than a size
/// prefix is buffered. Sink failures surface as [`PackStreamError::Io`] and
/// leave the stream desynchronized.
pub struct Encoder<W: Write> {
    sink: W,
}

impl<W: Write> Encoder<W> {
    /// Create a new encoder writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Consume the encoder and return the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Encode one complete value.
    pub fn encode(&mut self, value: &Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => self.encode_null(),
            Value::Boolean(b) => self.encode_bool(*b),
            Value::Integer(i) => self.encode_int(*i),
            Value::Float(f) => self.encode_float(*f),
            Value::String(s) => self.encode_string(s),
            Value::Bytes(b) => self.encode_bytes(b),
            Value::List(l) => self.encode_list(l),
            Value::Map(m) => self.encode_map(m),
            Value::Structure(s) => self.encode_structure(s),
        }
    }

    /// Write a value that produces its own bytes, verbatim.
    pub fn encode_custom(&mut self, value: &impl Packer) -> Result<(), PackStreamError> {
        let bytes = value.pack()?;
        self.put_slice(&bytes)
    }

    /// Encode null.
    pub fn encode_null(&mut self) -> Result<(), PackStreamError> {
        self.put_u8(NULL)
    }

    /// Encode a boolean.
    pub fn encode_bool(&mut self, value: bool) -> Result<(), PackStreamError> {
        self.put_u8(if value { TRUE } else { FALSE })
    }

    /// Encode an integer into the narrowest band that carries it.
    pub fn encode_int(&mut self, value: i64) -> Result<(), PackStreamError> {
        if fits_tiny_int(value) {
            // Tiny int: the marker byte is the value.
            self.put_u8(value as u8)
        } else if value >= i64::from(i8::MIN) && value <= i64::from(i8::MAX) {
            self.put_u8(INT_8)?;
            self.put_i8(value as i8)
        } else if value >= i64::from(i16::MIN) && value <= i64::from(i16::MAX) {
            self.put_u8(INT_16)?;
            self.put_i16(value as i16)
        } else if value >= i64::from(i32::MIN) && value <= i64::from(i32::MAX) {
            self.put_u8(INT_32)?;
            self.put_i32(value as i32)
        } else {
            self.put_u8(INT_64)?;
            self.put_i64(value)
        }
    }

    /// Encode an unsigned integer. Values above `i64::MAX` have no band.
    pub fn encode_uint(&mut self, value: u64) -> Result<(), PackStreamError> {
        let value =
            i64::try_from(value).map_err(|_| PackStreamError::ValueTooLarge("unsigned integer"))?;
        self.encode_int(value)
    }

    /// Encode a float. The payload is always 8 bytes.
    pub fn encode_float(&mut self, value: f64) -> Result<(), PackStreamError> {
        self.put_u8(FLOAT_64)?;
        self.put_f64(value)
    }

    /// Encode a string (size = byte length, not char count).
    pub fn encode_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        let bytes = value.as_bytes();
        let len = bytes.len();

        if len > u32::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("string"));
        }

        if len <= TINY_MAX_LEN {
            self.put_u8(TINY_STRING_BASE | len as u8)?;
        } else if len <= u8::MAX as usize {
            self.put_u8(STRING_8)?;
            self.put_u8(len as u8)?;
        } else if len <= u16::MAX as usize {
            self.put_u8(STRING_16)?;
            self.put_u16(len as u16)?;
        } else {
            self.put_u8(STRING_32)?;
            self.put_u32(len as u32)?;
        }

        self.put_slice(bytes)
    }

    /// Encode raw bytes. No tiny form exists.
    pub fn encode_bytes(&mut self, value: &[u8]) -> Result<(), PackStreamError> {
        let len = value.len();

        if len > u32::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("bytes"));
        }

        if len <= u8::MAX as usize {
            self.put_u8(BYTES_8)?;
            self.put_u8(len as u8)?;
        } else if len <= u16::MAX as usize {
            self.put_u8(BYTES_16)?;
            self.put_u16(len as u16)?;
        } else {
            self.put_u8(BYTES_32)?;
            self.put_u32(len as u32)?;
        }

        self.put_slice(value)
    }

    /// Encode a list, recursing into its elements.
    pub fn encode_list(&mut self, values: &[Value]) -> Result<(), PackStreamError> {
        let len = values.len();

        if len > u32::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("list"));
        }

        if len <= TINY_MAX_LEN {
            self.put_u8(TINY_LIST_BASE | len as u8)?;
        } else if len <= u8::MAX as usize {
            self.put_u8(LIST_8)?;
            self.put_u8(len as u8)?;
        } else if len <= u16::MAX as usize {
            self.put_u8(LIST_16)?;
            self.put_u16(len as u16)?;
        } else {
            self.put_u8(LIST_32)?;
            self.put_u32(len as u32)?;
        }

        for value in values {
            self.encode(value)?;
        }

        Ok(())
    }

    /// Encode a map, writing key then value per entry.
    pub fn encode_map(&mut self, map: &HashMap<String, Value>) -> Result<(), PackStreamError> {
        let len = map.len();

        if len > u32::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("map"));
        }

        if len <= TINY_MAX_LEN {
            self.put_u8(TINY_MAP_BASE | len as u8)?;
        } else if len <= u8::MAX as usize {
            self.put_u8(MAP_8)?;
            self.put_u8(len as u8)?;
        } else if len <= u16::MAX as usize {
            self.put_u8(MAP_16)?;
            self.put_u16(len as u16)?;
        } else {
            self.put_u8(MAP_32)?;
            self.put_u32(len as u32)?;
        }

        for (key, value) in map {
            self.encode_string(key)?;
            self.encode(value)?;
        }

        Ok(())
    }

    /// Encode a structure: size class, signature byte, then fields.
    pub fn encode_structure(&mut self, s: &Structure) -> Result<(), PackStreamError> {
        let len = s.fields.len();

        // No 32-bit form for structures.
        if len > u16::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("structure fields"));
        }

        if len <= TINY_MAX_LEN {
            self.put_u8(TINY_STRUCT_BASE | len as u8)?;
        } else if len <= u8::MAX as usize {
            self.put_u8(STRUCT_8)?;
            self.put_u8(len as u8)?;
        } else {
            self.put_u8(STRUCT_16)?;
            self.put_u16(len as u16)?;
        }

        self.put_u8(s.signature)?;

        for field in &s.fields {
            self.encode(field)?;
        }

        Ok(())
    }

    // Low-level big-endian writes

    fn put_u8(&mut self, v: u8) -> Result<(), PackStreamError> {
        self.sink.write_all(&[v])?;
        Ok(())
    }

    fn put_u16(&mut self, v: u16) -> Result<(), PackStreamError> {
        self.sink.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn put_u32(&mut self, v: u32) -> Result<(), PackStreamError> {
        self.sink.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn put_i8(&mut self, v: i8) -> Result<(), PackStreamError> {
        self.sink.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn put_i16(&mut self, v: i16) -> Result<(), PackStreamError> {
        self.sink.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn put_i32(&mut self, v: i32) -> Result<(), PackStreamError> {
        self.sink.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn put_i64(&mut self, v: i64) -> Result<(), PackStreamError> {
        self.sink.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn put_f64(&mut self, v: f64) -> Result<(), PackStreamError> {
        self.sink.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn put_slice(&mut self, p: &[u8]) -> Result<(), PackStreamError> {
        self.sink.write_all(p)?;
        Ok(())
    }
}

/// Encode a single value into an in-memory buffer.
pub fn to_bytes(value: &Value) -> Result<BytesMut, PackStreamError> {
    let mut encoder = Encoder::new(BytesMut::with_capacity(256).writer());
    encoder.encode(value)?;
    Ok(encoder.into_inner().into_inner())
}
