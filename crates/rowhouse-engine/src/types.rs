//! The closed runtime type taxonomy.
//!
//! DDL and CAST type expressions arrive either as parsed [`DataType`]
//! nodes or as free-form strings (`CAST(x, 'Nullable(Int64)')`); both
//! normalize into [`Ty`].

use core::fmt;

use rowhouse_sql::ast::{DataType, TypeArg};
use rowhouse_sql::Parser;

use crate::error::{EngineError, Result};

/// A runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    /// The type of a bare NULL and the element type of `[]`.
    /// Not constructible from DDL.
    Nothing,
    /// Boolean.
    Bool,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Fixed-point decimal.
    Decimal {
        /// Total digits.
        precision: u8,
        /// Digits after the point.
        scale: u8,
    },
    /// Variable-length string.
    String,
    /// Fixed-width byte string.
    FixedString(usize),
    /// Calendar date.
    Date,
    /// Date and time at second precision, optionally labeled with a
    /// timezone.
    DateTime {
        /// Timezone label; informational only.
        timezone: Option<std::string::String>,
    },
    /// Date and time with declared sub-second precision. Values collapse
    /// to second precision.
    DateTime64 {
        /// Sub-second digits.
        precision: u32,
        /// Timezone label; informational only.
        timezone: Option<std::string::String>,
    },
    /// UUID.
    Uuid,
    /// Homogeneous array.
    Array(Box<Ty>),
    /// Positional tuple, optionally with element names.
    Tuple(Vec<(Option<std::string::String>, Ty)>),
    /// Key/value map.
    Map(Box<Ty>, Box<Ty>),
    /// A slot that additionally admits NULL.
    Nullable(Box<Ty>),
    /// Dictionary-encoded wrapper; identity at the value level.
    LowCardinality(Box<Ty>),
}

impl Ty {
    /// Parses a free-form type string such as `"Array(Nullable(Int64))"`.
    ///
    /// # Errors
    ///
    /// Returns a `type` error when the string is not a valid type.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input);
        let node = parser
            .parse_data_type()
            .and_then(|node| {
                parser.expect_end()?;
                Ok(node)
            })
            .map_err(|e| EngineError::type_error(format!("invalid type '{input}': {e}")))?;
        Self::from_data_type(&node)
    }

    /// Normalizes a parsed [`DataType`] node into a [`Ty`].
    ///
    /// # Errors
    ///
    /// Returns a `type` error for unknown names or malformed parameters.
    #[allow(clippy::too_many_lines)]
    pub fn from_data_type(node: &DataType) -> Result<Self> {
        let name = node.name.to_ascii_lowercase();
        match name.as_str() {
            "int8" | "tinyint" => Self::expect_no_args(node, Self::Int8),
            "int16" | "smallint" => Self::expect_no_args(node, Self::Int16),
            "int32" | "int" | "integer" => Self::expect_no_args(node, Self::Int32),
            "int64" | "bigint" => Self::expect_no_args(node, Self::Int64),
            "uint8" => Self::expect_no_args(node, Self::UInt8),
            "uint16" => Self::expect_no_args(node, Self::UInt16),
            "uint32" => Self::expect_no_args(node, Self::UInt32),
            "uint64" => Self::expect_no_args(node, Self::UInt64),
            "float32" | "float" => Self::expect_no_args(node, Self::Float32),
            "float64" | "double" => Self::expect_no_args(node, Self::Float64),
            "string" | "text" | "varchar" | "char" => Ok(Self::String),
            "bool" | "boolean" => Self::expect_no_args(node, Self::Bool),
            "date" => Self::expect_no_args(node, Self::Date),
            "uuid" => Self::expect_no_args(node, Self::Uuid),
            // Enum values carry no runtime identity of their own here.
            "enum8" | "enum16" => Ok(Self::String),
            "fixedstring" => match node.args.as_slice() {
                [TypeArg::Integer(n)] if *n > 0 => {
                    Ok(Self::FixedString(usize::try_from(*n).map_err(|_| {
                        EngineError::type_error("FixedString width out of range")
                    })?))
                }
                _ => Err(EngineError::type_error(
                    "FixedString requires a positive width",
                )),
            },
            "decimal" => {
                let (precision, scale) = match node.args.as_slice() {
                    [TypeArg::Integer(p)] => (*p, 0),
                    [TypeArg::Integer(p), TypeArg::Integer(s)] => (*p, *s),
                    _ => {
                        return Err(EngineError::type_error(
                            "Decimal requires precision and optional scale",
                        ))
                    }
                };
                Self::decimal_checked(precision, scale)
            }
            "decimal32" | "decimal64" | "decimal128" | "decimal256" => {
                let precision = match name.as_str() {
                    "decimal32" => 9,
                    "decimal64" => 18,
                    "decimal128" => 38,
                    _ => 76,
                };
                let scale = match node.args.as_slice() {
                    [TypeArg::Integer(s)] => *s,
                    [] => 0,
                    _ => {
                        return Err(EngineError::type_error(
                            "sized Decimal takes a single scale",
                        ))
                    }
                };
                Self::decimal_checked(precision, scale)
            }
            "datetime" | "timestamp" => {
                let timezone = match node.args.as_slice() {
                    [] => None,
                    [TypeArg::String(tz)] => Some(tz.clone()),
                    _ => {
                        return Err(EngineError::type_error(
                            "DateTime takes an optional timezone string",
                        ))
                    }
                };
                Ok(Self::DateTime { timezone })
            }
            "datetime64" => {
                let (precision, timezone) = match node.args.as_slice() {
                    [TypeArg::Integer(p)] => (*p, None),
                    [TypeArg::Integer(p), TypeArg::String(tz)] => (*p, Some(tz.clone())),
                    _ => {
                        return Err(EngineError::type_error(
                            "DateTime64 requires a precision and optional timezone",
                        ))
                    }
                };
                let precision = u32::try_from(precision)
                    .ok()
                    .filter(|p| *p <= 9)
                    .ok_or_else(|| {
                        EngineError::type_error("DateTime64 precision must be 0..=9")
                    })?;
                Ok(Self::DateTime64 {
                    precision,
                    timezone,
                })
            }
            "array" => match node.args.as_slice() {
                [TypeArg::Type(inner)] => {
                    Ok(Self::Array(Box::new(Self::from_data_type(inner)?)))
                }
                _ => Err(EngineError::type_error("Array requires one element type")),
            },
            "nullable" => match node.args.as_slice() {
                [TypeArg::Type(inner)] => {
                    let inner = Self::from_data_type(inner)?;
                    if matches!(inner, Self::Nullable(_)) {
                        return Err(EngineError::type_error("Nullable cannot nest"));
                    }
                    Ok(Self::Nullable(Box::new(inner)))
                }
                _ => Err(EngineError::type_error("Nullable requires one inner type")),
            },
            "lowcardinality" => match node.args.as_slice() {
                [TypeArg::Type(inner)] => Ok(Self::LowCardinality(Box::new(
                    Self::from_data_type(inner)?,
                ))),
                _ => Err(EngineError::type_error(
                    "LowCardinality requires one inner type",
                )),
            },
            "map" => match node.args.as_slice() {
                [TypeArg::Type(k), TypeArg::Type(v)] => Ok(Self::Map(
                    Box::new(Self::from_data_type(k)?),
                    Box::new(Self::from_data_type(v)?),
                )),
                _ => Err(EngineError::type_error("Map requires key and value types")),
            },
            "tuple" => {
                if node.args.is_empty() {
                    return Err(EngineError::type_error(
                        "Tuple requires at least one element type",
                    ));
                }
                let mut elems = Vec::with_capacity(node.args.len());
                for arg in &node.args {
                    match arg {
                        TypeArg::Type(t) => elems.push((None, Self::from_data_type(t)?)),
                        TypeArg::Named { name, data_type } => {
                            elems.push((Some(name.clone()), Self::from_data_type(data_type)?));
                        }
                        _ => {
                            return Err(EngineError::type_error(
                                "Tuple elements must be types",
                            ))
                        }
                    }
                }
                Ok(Self::Tuple(elems))
            }
            // A CAST(x, 'Nullable(Int64)') carries the whole type
            // expression as one string.
            _ if node.args.is_empty() && node.name.contains('(') => Self::parse(&node.name),
            _ => Err(EngineError::type_error(format!(
                "unknown type '{}'",
                node.name
            ))),
        }
    }

    fn expect_no_args(node: &DataType, ty: Self) -> Result<Self> {
        if node.args.is_empty() {
            Ok(ty)
        } else {
            Err(EngineError::type_error(format!(
                "type '{}' takes no parameters",
                node.name
            )))
        }
    }

    fn decimal_checked(precision: i64, scale: i64) -> Result<Self> {
        let precision = u8::try_from(precision)
            .ok()
            .filter(|p| (1..=76).contains(p))
            .ok_or_else(|| EngineError::type_error("Decimal precision must be 1..=76"))?;
        let scale = u8::try_from(scale)
            .ok()
            .filter(|s| *s <= precision)
            .ok_or_else(|| {
                EngineError::type_error("Decimal scale must not exceed its precision")
            })?;
        Ok(Self::Decimal { precision, scale })
    }

    /// True if the slot admits NULL.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Nullable(_) | Self::Nothing => true,
            Self::LowCardinality(inner) => inner.is_nullable(),
            _ => false,
        }
    }

    /// Strips `Nullable` and `LowCardinality` wrappers.
    #[must_use]
    pub fn strip_wrappers(&self) -> &Self {
        match self {
            Self::Nullable(inner) | Self::LowCardinality(inner) => inner.strip_wrappers(),
            other => other,
        }
    }

    /// True for integer and floating-point kinds (and Decimal).
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
                | Self::Float32
                | Self::Float64
                | Self::Decimal { .. }
        )
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nothing => f.write_str("Nothing"),
            Self::Bool => f.write_str("Bool"),
            Self::Int8 => f.write_str("Int8"),
            Self::Int16 => f.write_str("Int16"),
            Self::Int32 => f.write_str("Int32"),
            Self::Int64 => f.write_str("Int64"),
            Self::UInt8 => f.write_str("UInt8"),
            Self::UInt16 => f.write_str("UInt16"),
            Self::UInt32 => f.write_str("UInt32"),
            Self::UInt64 => f.write_str("UInt64"),
            Self::Float32 => f.write_str("Float32"),
            Self::Float64 => f.write_str("Float64"),
            Self::Decimal { precision, scale } => {
                write!(f, "Decimal({precision}, {scale})")
            }
            Self::String => f.write_str("String"),
            Self::FixedString(n) => write!(f, "FixedString({n})"),
            Self::Date => f.write_str("Date"),
            Self::DateTime { timezone: None } => f.write_str("DateTime"),
            Self::DateTime { timezone: Some(tz) } => write!(f, "DateTime('{tz}')"),
            Self::DateTime64 {
                precision,
                timezone: None,
            } => write!(f, "DateTime64({precision})"),
            Self::DateTime64 {
                precision,
                timezone: Some(tz),
            } => write!(f, "DateTime64({precision}, '{tz}')"),
            Self::Uuid => f.write_str("UUID"),
            Self::Array(inner) => write!(f, "Array({inner})"),
            Self::Tuple(elems) => {
                f.write_str("Tuple(")?;
                for (i, (name, ty)) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match name {
                        Some(name) => write!(f, "{name} {ty}")?,
                        None => write!(f, "{ty}")?,
                    }
                }
                f.write_str(")")
            }
            Self::Map(k, v) => write!(f, "Map({k}, {v})"),
            Self::Nullable(inner) => write!(f, "Nullable({inner})"),
            Self::LowCardinality(inner) => write!(f, "LowCardinality({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_types() {
        assert_eq!(Ty::parse("Int64").unwrap(), Ty::Int64);
        assert_eq!(Ty::parse("int64").unwrap(), Ty::Int64);
        assert_eq!(Ty::parse("BIGINT").unwrap(), Ty::Int64);
        assert_eq!(Ty::parse("String").unwrap(), Ty::String);
        assert_eq!(Ty::parse("UUID").unwrap(), Ty::Uuid);
    }

    #[test]
    fn test_parse_nested_types() {
        assert_eq!(
            Ty::parse("Array(Nullable(Int64))").unwrap(),
            Ty::Array(Box::new(Ty::Nullable(Box::new(Ty::Int64))))
        );
        assert_eq!(
            Ty::parse("Map(String, UInt64)").unwrap(),
            Ty::Map(Box::new(Ty::String), Box::new(Ty::UInt64))
        );
    }

    #[test]
    fn test_parse_parameterized_types() {
        assert_eq!(
            Ty::parse("Decimal(10, 2)").unwrap(),
            Ty::Decimal {
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(
            Ty::parse("Decimal64(4)").unwrap(),
            Ty::Decimal {
                precision: 18,
                scale: 4
            }
        );
        assert_eq!(Ty::parse("FixedString(16)").unwrap(), Ty::FixedString(16));
        assert_eq!(
            Ty::parse("DateTime64(3, 'UTC')").unwrap(),
            Ty::DateTime64 {
                precision: 3,
                timezone: Some(String::from("UTC"))
            }
        );
    }

    #[test]
    fn test_enum_normalizes_to_string() {
        assert_eq!(Ty::parse("Enum8('a' = 1, 'b' = 2)").unwrap(), Ty::String);
    }

    #[test]
    fn test_named_tuple() {
        let ty = Ty::parse("Tuple(id Int64, name String)").unwrap();
        assert_eq!(ty.to_string(), "Tuple(id Int64, name String)");
    }

    #[test]
    fn test_unknown_type_fails() {
        assert!(Ty::parse("Whatever").is_err());
        assert!(Ty::parse("Nullable(Nullable(Int8))").is_err());
    }

    #[test]
    fn test_strip_wrappers() {
        let ty = Ty::parse("LowCardinality(Nullable(String))").unwrap();
        assert_eq!(*ty.strip_wrappers(), Ty::String);
        assert!(ty.is_nullable());
        assert!(Ty::parse("Nullable(Int8)").unwrap().is_nullable());
        assert!(!Ty::parse("Int8").unwrap().is_nullable());
    }

    #[test]
    fn test_display_round_trip() {
        for s in [
            "Nullable(Int64)",
            "Array(String)",
            "Map(String, Array(Int64))",
            "Decimal(10, 2)",
            "DateTime('UTC')",
            "FixedString(4)",
        ] {
            assert_eq!(Ty::parse(s).unwrap().to_string(), s);
        }
    }
}
