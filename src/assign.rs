//! Typed decode targets.
//!
//! [`crate::Decoder::decode_into`] first materializes the wire value, then
//! fits it into the caller's target through [`Assign`]. Each implementation
//! accepts exactly its own kind family (no float/integer coercion), resets
//! to its zero value on wire null, and reports anything else as
//! [`PackStreamError::TypeMismatch`].

use std::collections::HashMap;

use crate::value::{Structure, Value};
use crate::PackStreamError;

/// Fit one decoded wire value into `self`.
pub trait Assign {
    /// Overwrite or merge `self` with `value`, checking shape and range.
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError>;
}

/// The generic target: takes any wire value as-is.
impl Assign for Value {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        *self = value;
        Ok(())
    }
}

impl Assign for bool {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => *self = false,
            Value::Boolean(b) => *self = b,
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

// Integer targets narrow the 64-bit wire value into their own band.
// Negative values into unsigned targets and out-of-range values are both
// shape errors, not truncations.
macro_rules! assign_int {
    ($($t:ty),*) => {$(
        impl Assign for $t {
            fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
                match value {
                    Value::Null => *self = 0,
                    Value::Integer(v) => {
                        *self = <$t>::try_from(v)
                            .map_err(|_| PackStreamError::TypeMismatch("out-of-range Integer"))?;
                    }
                    other => return Err(PackStreamError::TypeMismatch(other.type_name())),
                }
                Ok(())
            }
        }
    )*};
}

assign_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl Assign for f64 {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => *self = 0.0,
            Value::Float(f) => *self = f,
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

impl Assign for f32 {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => *self = 0.0,
            Value::Float(f) => {
                let narrowed = f as f32;
                if f.is_finite() && narrowed.is_infinite() {
                    return Err(PackStreamError::TypeMismatch("out-of-range Float"));
                }
                *self = narrowed;
            }
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

impl Assign for String {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => self.clear(),
            Value::String(s) => *self = s,
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

impl Assign for Vec<u8> {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => self.clear(),
            Value::Bytes(b) => *self = b,
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

impl Assign for Vec<Value> {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => self.clear(),
            Value::List(items) => *self = items,
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

/// Fixed-length target: keeps the first `N` wire elements, discards any
/// surplus, and null-fills the shortfall.
impl<const N: usize> Assign for [Value; N] {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => {
                for slot in self.iter_mut() {
                    *slot = Value::Null;
                }
            }
            Value::List(items) => {
                let mut items = items.into_iter();
                for slot in self.iter_mut() {
                    *slot = items.next().unwrap_or(Value::Null);
                }
            }
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

/// Map target with merge semantics: wire entries overwrite equal keys,
/// preexisting entries otherwise survive. Wire null clears the map.
impl Assign for HashMap<String, Value> {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => self.clear(),
            Value::Map(entries) => {
                for (key, value) in entries {
                    self.insert(key, value);
                }
            }
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}

/// Structure target. Accepts any signature; applications that dispatch on
/// signatures do so above the codec or through [`crate::Unpacker`].
impl Assign for Structure {
    fn assign(&mut self, value: Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => *self = Structure::default(),
            Value::Structure(s) => *self = s,
            other => return Err(PackStreamError::TypeMismatch(other.type_name())),
        }
        Ok(())
    }
}
