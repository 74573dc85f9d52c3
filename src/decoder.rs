//! PackStream decoder: bytes → [`Value`].

use std::collections::HashMap;
use std::io::{self, Cursor, Read};

use crate::assign::Assign;
use crate::marker::*;
use crate::value::{Structure, Value};
use crate::{PackStreamError, Unpacker};

/// PackStream decoder over an arbitrary byte source.
///
/// One call reads one complete value. After an error the source sits at an
/// indeterminate position and must not be handed back to the same decoder.
pub struct Decoder<R: Read> {
    source: R,
}

impl<R: Read> Decoder<R> {
    /// Create a new decoder reading from `source`.
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Consume the decoder and return the source.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Decode the next value.
    ///
    /// An exhausted source reports [`PackStreamError::Truncated`]; use
    /// [`Decoder::try_decode_any`] to distinguish a clean end of input.
    pub fn decode_any(&mut self) -> Result<Value, PackStreamError> {
        let marker = self.read_u8()?;
        self.read_value(marker)
    }

    /// Decode the next value, or `None` if the source ends cleanly before
    /// the marker byte.
    pub fn try_decode_any(&mut self) -> Result<Option<Value>, PackStreamError> {
        let mut buf = [0u8; 1];
        loop {
            match self.source.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return self.read_value(buf[0]).map(Some),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PackStreamError::Io(e)),
            }
        }
    }

    /// Decode one value and fit it into a typed target.
    ///
    /// The wire value must be assignable to the target's shape, else
    /// [`PackStreamError::TypeMismatch`]; see [`Assign`] for the shapes.
    pub fn decode_into<T: Assign>(&mut self, target: &mut T) -> Result<(), PackStreamError> {
        let value = self.decode_any()?;
        target.assign(value)
    }

    /// Decode one value through the target's own [`Unpacker`] hook.
    ///
    /// Reads the marker byte, then hands marker and source to the target,
    /// which must consume exactly the payload for that marker.
    pub fn decode_custom<T: Unpacker>(&mut self, target: &mut T) -> Result<(), PackStreamError> {
        let marker = self.read_u8()?;
        target.unpack(marker, &mut self.source)
    }

    /// Dispatch on an already-read marker byte.
    fn read_value(&mut self, marker: u8) -> Result<Value, PackStreamError> {
        match marker {
            NULL => Ok(Value::Null),
            TRUE => Ok(Value::Boolean(true)),
            FALSE => Ok(Value::Boolean(false)),

            FLOAT_64 => Ok(Value::Float(self.read_f64()?)),

            INT_8 => Ok(Value::Integer(i64::from(self.read_i8()?))),
            INT_16 => Ok(Value::Integer(i64::from(self.read_i16()?))),
            INT_32 => Ok(Value::Integer(i64::from(self.read_i32()?))),
            INT_64 => Ok(Value::Integer(self.read_i64()?)),

            // Tiny int: the marker byte itself, sign-extended.
            0x00..=0x7F | 0xF0..=0xFF => Ok(Value::Integer(i64::from(marker as i8))),

            m @ 0x80..=0x8F => self.read_string_data((m & 0x0F) as usize),
            STRING_8 => {
                let len = self.read_u8()? as usize;
                self.read_string_data(len)
            }
            STRING_16 => {
                let len = self.read_u16()? as usize;
                self.read_string_data(len)
            }
            STRING_32 => {
                let len = self.read_u32()? as usize;
                self.read_string_data(len)
            }

            BYTES_8 => {
                let len = self.read_u8()? as usize;
                self.read_bytes_data(len)
            }
            BYTES_16 => {
                let len = self.read_u16()? as usize;
                self.read_bytes_data(len)
            }
            BYTES_32 => {
                let len = self.read_u32()? as usize;
                self.read_bytes_data(len)
            }

            m @ 0x90..=0x9F => self.read_list_data((m & 0x0F) as usize),
            LIST_8 => {
                let len = self.read_u8()? as usize;
                self.read_list_data(len)
            }
            LIST_16 => {
                let len = self.read_u16()? as usize;
                self.read_list_data(len)
            }
            LIST_32 => {
                let len = self.read_u32()? as usize;
                self.read_list_data(len)
            }
            LIST_STREAM => self.read_streamed_list(),

            m @ 0xA0..=0xAF => self.read_map_data((m & 0x0F) as usize),
            MAP_8 => {
                let len = self.read_u8()? as usize;
                self.read_map_data(len)
            }
            MAP_16 => {
                let len = self.read_u16()? as usize;
                self.read_map_data(len)
            }
            MAP_32 => {
                let len = self.read_u32()? as usize;
                self.read_map_data(len)
            }
            MAP_STREAM => self.read_streamed_map(),

            m @ 0xB0..=0xBF => self.read_struct_data((m & 0x0F) as usize),
            STRUCT_8 => {
                let len = self.read_u8()? as usize;
                self.read_struct_data(len)
            }
            STRUCT_16 => {
                let len = self.read_u16()? as usize;
                self.read_struct_data(len)
            }

            // Only a streamed-container loop may consume the terminator.
            END_OF_STREAM => Err(PackStreamError::UnexpectedEndOfStream),

            _ => Err(PackStreamError::UnknownMarker(marker)),
        }
    }

    fn read_string_data(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut data = vec![0u8; len];
        self.fill(&mut data)?;
        let s = String::from_utf8(data)
            .map_err(|_| PackStreamError::TypeMismatch("non-UTF-8 string payload"))?;
        Ok(Value::String(s))
    }

    fn read_bytes_data(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut data = vec![0u8; len];
        self.fill(&mut data)?;
        Ok(Value::Bytes(data))
    }

    fn read_list_data(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.decode_any()?);
        }
        Ok(Value::List(items))
    }

    fn read_map_data(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut map = HashMap::with_capacity(len.min(1024));
        for _ in 0..len {
            let key = match self.decode_any()? {
                Value::String(s) => s,
                _ => return Err(PackStreamError::InvalidKey),
            };
            let value = self.decode_any()?;
            // Duplicate wire keys: last one wins.
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn read_struct_data(&mut self, field_count: usize) -> Result<Value, PackStreamError> {
        let signature = self.read_u8()?;
        let mut fields = Vec::with_capacity(field_count.min(64));
        for _ in 0..field_count {
            fields.push(self.decode_any()?);
        }
        Ok(Value::Structure(Structure::new(signature, fields)))
    }

    fn read_streamed_list(&mut self) -> Result<Value, PackStreamError> {
        let mut items = Vec::new();
        loop {
            let marker = self.read_u8()?;
            if marker == END_OF_STREAM {
                break;
            }
            items.push(self.read_value(marker)?);
        }
        Ok(Value::List(items))
    }

    fn read_streamed_map(&mut self) -> Result<Value, PackStreamError> {
        let mut map = HashMap::new();
        loop {
            let marker = self.read_u8()?;
            if marker == END_OF_STREAM {
                break;
            }
            let key = match self.read_value(marker)? {
                Value::String(s) => s,
                _ => return Err(PackStreamError::InvalidKey),
            };
            // The terminator is legal only at the pair boundary; between a
            // key and its value it is a malformed stream.
            let value = self.decode_any()?;
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    // Low-level big-endian reads

    fn read_u8(&mut self) -> Result<u8, PackStreamError> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    fn read_i8(&mut self) -> Result<i8, PackStreamError> {
        Ok(self.read_u8()? as i8)
    }

    fn read_u16(&mut self) -> Result<u16, PackStreamError> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_i16(&mut self) -> Result<i16, PackStreamError> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32, PackStreamError> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_i32(&mut self) -> Result<i32, PackStreamError> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    fn read_i64(&mut self) -> Result<i64, PackStreamError> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    fn read_f64(&mut self) -> Result<f64, PackStreamError> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }

    /// Fill `buf` completely. Running out of input is [`PackStreamError::Truncated`];
    /// any other reader failure is [`PackStreamError::Io`].
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), PackStreamError> {
        self.source.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => PackStreamError::Truncated,
            _ => PackStreamError::Io(e),
        })
    }
}

/// Decode a single value from an in-memory buffer.
///
/// Returns the value together with the number of bytes consumed; trailing
/// bytes are left untouched.
pub fn from_bytes(data: &[u8]) -> Result<(Value, usize), PackStreamError> {
    let mut source = Cursor::new(data);
    let mut decoder = Decoder::new(&mut source);
    let value = decoder.decode_any()?;
    Ok((value, source.position() as usize))
}
