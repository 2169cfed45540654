use serde::{Deserialize, Serialize};
use std::fmt;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

///
/// Value
///
/// Dynamic value vocabulary crossing the store boundary: statement
/// parameters, row cells, and composite key components all travel as
/// `Value`. `List` only appears as a parameter (IN / NOT IN bindings),
/// never as a row cell.
///

#[remain::sorted]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Bytes(Vec<u8>),
    Float(f64),
    Int(i64),
    List(Vec<Value>),
    Null,
    Text(String),
    Timestamp(OffsetDateTime),
    Uint(u64),
    Uuid(Uuid),
}

impl Value {
    /// True when the value is the zero/default of its shape. Drives
    /// new-entity detection: an entity is new iff every key component
    /// is zero.
    #[must_use]
    #[expect(clippy::float_cmp)]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Bool(v) => !v,
            Self::Bytes(v) => v.is_empty(),
            Self::Float(v) => *v == 0.0,
            Self::Int(v) => *v == 0,
            Self::List(v) => v.is_empty(),
            Self::Null => true,
            Self::Text(v) => v.is_empty(),
            Self::Timestamp(v) => *v == OffsetDateTime::UNIX_EPOCH,
            Self::Uint(v) => *v == 0,
            Self::Uuid(v) => v.is_nil(),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Variant name for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "bytes",
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::List(_) => "list",
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Uint(_) => "uint",
            Self::Uuid(_) => "uuid",
        }
    }
}

impl fmt::Display for Value {
    /// Key-string rendering. `Null` renders empty, timestamps render
    /// RFC 3339 (falling back to the unix second count if the year is
    /// out of formatting range).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Bytes(v) => {
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::List(v) => {
                let mut first = true;
                for item in v {
                    if !first {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                    first = false;
                }
                Ok(())
            }
            Self::Null => Ok(()),
            Self::Text(v) => f.write_str(v),
            Self::Timestamp(v) => match v.format(&Rfc3339) {
                Ok(s) => f.write_str(&s),
                Err(_) => write!(f, "{}", v.unix_timestamp()),
            },
            Self::Uint(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
        }
    }
}

// ------------------------------------------------------------------
// Conversions
// ------------------------------------------------------------------

macro_rules! value_from_int {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

macro_rules! value_from_uint {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::Uint(u64::from(v))
            }
        }
    )*};
}

value_from_int!(i8, i16, i32, i64);
value_from_uint!(u8, u16, u32, u64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
