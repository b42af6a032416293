//! The closed runtime value taxonomy.
//!
//! Every value answers its [`Ty`]; nullability lives on the column/type,
//! so a single [`Value::Null`] inhabits any nullable slot.

mod compare;
mod convert;

use core::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::types::Ty;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 8-bit integer.
    Int8(i8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 8-bit integer.
    UInt8(u8),
    /// Unsigned 16-bit integer.
    UInt16(u16),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// Fixed-point decimal: `mantissa / 10^scale`.
    Decimal {
        /// Scaled integer representation.
        mantissa: i128,
        /// Total digits.
        precision: u8,
        /// Digits after the point.
        scale: u8,
    },
    /// String.
    String(String),
    /// Fixed-width string, NUL-padded to `width` bytes.
    FixedString {
        /// The padded bytes.
        bytes: String,
        /// Declared width.
        width: usize,
    },
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time at second precision.
    DateTime(NaiveDateTime),
    /// UUID.
    Uuid(Uuid),
    /// Homogeneous array. The element type makes empty arrays typed.
    Array {
        /// Element type.
        elem: Ty,
        /// Elements.
        items: Vec<Value>,
    },
    /// Positional tuple.
    Tuple(Vec<Value>),
    /// Key/value map with insertion-ordered entries.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Returns this value's type.
    #[must_use]
    pub fn ty(&self) -> Ty {
        match self {
            Self::Null => Ty::Nullable(Box::new(Ty::Nothing)),
            Self::Bool(_) => Ty::Bool,
            Self::Int8(_) => Ty::Int8,
            Self::Int16(_) => Ty::Int16,
            Self::Int32(_) => Ty::Int32,
            Self::Int64(_) => Ty::Int64,
            Self::UInt8(_) => Ty::UInt8,
            Self::UInt16(_) => Ty::UInt16,
            Self::UInt32(_) => Ty::UInt32,
            Self::UInt64(_) => Ty::UInt64,
            Self::Float32(_) => Ty::Float32,
            Self::Float64(_) => Ty::Float64,
            Self::Decimal {
                precision, scale, ..
            } => Ty::Decimal {
                precision: *precision,
                scale: *scale,
            },
            Self::String(_) => Ty::String,
            Self::FixedString { width, .. } => Ty::FixedString(*width),
            Self::Date(_) => Ty::Date,
            Self::DateTime(_) => Ty::DateTime { timezone: None },
            Self::Uuid(_) => Ty::Uuid,
            Self::Array { elem, .. } => Ty::Array(Box::new(elem.clone())),
            Self::Tuple(items) => {
                Ty::Tuple(items.iter().map(|v| (None, v.ty())).collect())
            }
            Self::Map(entries) => {
                let (k, v) = entries.first().map_or((Ty::Nothing, Ty::Nothing), |(k, v)| {
                    (k.ty(), v.ty())
                });
                Ty::Map(Box::new(k), Box::new(v))
            }
        }
    }

    /// True for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// SQL truthiness: non-null booleans that are true and non-null
    /// numbers that are non-zero.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Decimal { mantissa, .. } => *mantissa != 0,
            Self::Float32(v) => *v != 0.0,
            Self::Float64(v) => *v != 0.0,
            other => other.as_i128().is_some_and(|n| n != 0),
        }
    }

    /// Signed 128-bit view of integer-kind values (including Bool).
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Bool(b) => Some(i128::from(*b)),
            Self::Int8(n) => Some(i128::from(*n)),
            Self::Int16(n) => Some(i128::from(*n)),
            Self::Int32(n) => Some(i128::from(*n)),
            Self::Int64(n) => Some(i128::from(*n)),
            Self::UInt8(n) => Some(i128::from(*n)),
            Self::UInt16(n) => Some(i128::from(*n)),
            Self::UInt32(n) => Some(i128::from(*n)),
            Self::UInt64(n) => Some(i128::from(*n)),
            _ => None,
        }
    }

    /// 64-bit float view of numeric-kind values (including Bool and
    /// Decimal).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float32(v) => Some(f64::from(*v)),
            Self::Float64(v) => Some(*v),
            Self::Decimal {
                mantissa, scale, ..
            } => Some(*mantissa as f64 / 10f64.powi(i32::from(*scale))),
            other => other.as_i128().map(|n| n as f64),
        }
    }

    /// The string content of String/FixedString values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::FixedString { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// True for any numeric kind (including Bool, which orders with
    /// numbers).
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Bool(_)
                | Self::Int8(_)
                | Self::Int16(_)
                | Self::Int32(_)
                | Self::Int64(_)
                | Self::UInt8(_)
                | Self::UInt16(_)
                | Self::UInt32(_)
                | Self::UInt64(_)
                | Self::Float32(_)
                | Self::Float64(_)
                | Self::Decimal { .. }
        )
    }

    /// The grouping/deduplication key of this value. NULL stringifies to
    /// the sentinel `NULL`, keeping it a distinct group from every
    /// non-null value.
    #[must_use]
    pub fn group_key(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            other => other.to_string(),
        }
    }

    /// The default value for a slot of the given type (used for INSERT
    /// columns without an explicit value or DEFAULT expression).
    #[must_use]
    pub fn default_for(ty: &Ty) -> Self {
        match ty {
            Ty::Nothing | Ty::Nullable(_) => Self::Null,
            Ty::LowCardinality(inner) => Self::default_for(inner),
            Ty::Bool => Self::Bool(false),
            Ty::Int8 => Self::Int8(0),
            Ty::Int16 => Self::Int16(0),
            Ty::Int32 => Self::Int32(0),
            Ty::Int64 => Self::Int64(0),
            Ty::UInt8 => Self::UInt8(0),
            Ty::UInt16 => Self::UInt16(0),
            Ty::UInt32 => Self::UInt32(0),
            Ty::UInt64 => Self::UInt64(0),
            Ty::Float32 => Self::Float32(0.0),
            Ty::Float64 => Self::Float64(0.0),
            Ty::Decimal { precision, scale } => Self::Decimal {
                mantissa: 0,
                precision: *precision,
                scale: *scale,
            },
            Ty::String => Self::String(String::new()),
            Ty::FixedString(width) => Self::FixedString {
                bytes: "\0".repeat(*width),
                width: *width,
            },
            Ty::Date => Self::Date(NaiveDate::default()),
            Ty::DateTime { .. } | Ty::DateTime64 { .. } => {
                Self::DateTime(NaiveDateTime::default())
            }
            Ty::Uuid => Self::Uuid(Uuid::nil()),
            Ty::Array(elem) => Self::Array {
                elem: (**elem).clone(),
                items: Vec::new(),
            },
            Ty::Tuple(elems) => {
                Self::Tuple(elems.iter().map(|(_, t)| Self::default_for(t)).collect())
            }
            Ty::Map(..) => Self::Map(Vec::new()),
        }
    }
}

/// Renders a value nested inside a composite: strings are quoted.
fn fmt_nested(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "'{s}'"),
        Value::FixedString { bytes, .. } => write!(f, "'{bytes}'"),
        other => write!(f, "{other}"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int8(n) => write!(f, "{n}"),
            Self::Int16(n) => write!(f, "{n}"),
            Self::Int32(n) => write!(f, "{n}"),
            Self::Int64(n) => write!(f, "{n}"),
            Self::UInt8(n) => write!(f, "{n}"),
            Self::UInt16(n) => write!(f, "{n}"),
            Self::UInt32(n) => write!(f, "{n}"),
            Self::UInt64(n) => write!(f, "{n}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Decimal {
                mantissa, scale, ..
            } => {
                if *scale == 0 {
                    return write!(f, "{mantissa}");
                }
                let divisor = 10i128.pow(u32::from(*scale));
                let sign = if *mantissa < 0 { "-" } else { "" };
                let abs = mantissa.unsigned_abs();
                let divisor = divisor.unsigned_abs();
                write!(
                    f,
                    "{sign}{}.{:0width$}",
                    abs / divisor,
                    abs % divisor,
                    width = usize::from(*scale)
                )
            }
            Self::String(s) => f.write_str(s),
            Self::FixedString { bytes, .. } => f.write_str(bytes),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Array { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_nested(item, f)?;
                }
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_nested(item, f)?;
                }
                f.write_str(")")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_nested(k, f)?;
                    f.write_str(": ")?;
                    fmt_nested(v, f)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ty_of_scalars() {
        assert_eq!(Value::Int64(1).ty(), Ty::Int64);
        assert_eq!(Value::UInt8(1).ty(), Ty::UInt8);
        assert_eq!(Value::String(String::from("x")).ty(), Ty::String);
        assert_eq!(
            Value::Null.ty(),
            Ty::Nullable(Box::new(Ty::Nothing))
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int64(-3).is_truthy());
        assert!(!Value::Int64(0).is_truthy());
        assert!(Value::Float64(0.5).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::String(String::from("yes")).is_truthy());
    }

    #[test]
    fn test_group_key_null_sentinel() {
        assert_eq!(Value::Null.group_key(), "NULL");
        assert_eq!(Value::String(String::from("NULL")).group_key(), "NULL");
        assert_eq!(Value::Int64(7).group_key(), "7");
    }

    #[test]
    fn test_decimal_display() {
        let d = Value::Decimal {
            mantissa: -12345,
            precision: 10,
            scale: 2,
        };
        assert_eq!(d.to_string(), "-123.45");
        let d = Value::Decimal {
            mantissa: 5,
            precision: 10,
            scale: 3,
        };
        assert_eq!(d.to_string(), "0.005");
    }

    #[test]
    fn test_composite_display() {
        let arr = Value::Array {
            elem: Ty::String,
            items: vec![
                Value::String(String::from("a")),
                Value::Null,
            ],
        };
        assert_eq!(arr.to_string(), "['a', NULL]");

        let tup = Value::Tuple(vec![Value::Int64(1), Value::String(String::from("x"))]);
        assert_eq!(tup.to_string(), "(1, 'x')");
    }

    #[test]
    fn test_float_display_is_minimal() {
        assert_eq!(Value::Float64(45.0).to_string(), "45");
        assert_eq!(Value::Float64(4.5).to_string(), "4.5");
    }

    #[test]
    fn test_default_for() {
        assert_eq!(Value::default_for(&Ty::Int32), Value::Int32(0));
        assert_eq!(
            Value::default_for(&Ty::Nullable(Box::new(Ty::Int32))),
            Value::Null
        );
        let Value::FixedString { bytes, width } =
            Value::default_for(&Ty::FixedString(3))
        else {
            panic!("expected fixed string");
        };
        assert_eq!(width, 3);
        assert_eq!(bytes.len(), 3);
    }
}
