//! Value conversion: the CAST path and the `to*` conversion functions.
//!
//! A NULL source always converts to NULL. Everything else goes through
//! the target type's construction rules, which fail with a `conversion`
//! error for out-of-range or unparseable inputs. Numeric and date/time
//! parsing is invariant: `str::parse` plus fixed ISO-8601 formats.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::Value;
use crate::error::{EngineError, Result};
use crate::types::Ty;

/// Accepted datetime formats, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses an ISO-8601 date (`YYYY-MM-DD`).
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::conversion(format!("cannot parse '{s}' as Date")))
}

/// Parses an ISO-8601 datetime, with or without a `T` separator and
/// fractional seconds; a bare date becomes midnight.
pub(crate) fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let trimmed = s.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(EngineError::conversion(format!(
        "cannot parse '{s}' as DateTime"
    )))
}

impl Value {
    /// Converts this value to the given type.
    ///
    /// # Errors
    ///
    /// Returns a `conversion` error for overflow or unparseable input and
    /// a `type` error for impossible source/target pairs.
    pub fn cast(&self, ty: &Ty) -> Result<Self> {
        if self.is_null() {
            return Ok(Self::Null);
        }
        match ty {
            Ty::Nullable(inner) | Ty::LowCardinality(inner) => self.cast(inner),
            Ty::Nothing => Err(EngineError::type_error("cannot cast to Nothing")),
            Ty::Bool => self.to_bool().map(Self::Bool),
            Ty::Int8 => self.to_signed(i128::from(i8::MIN), i128::from(i8::MAX), ty),
            Ty::Int16 => self.to_signed(i128::from(i16::MIN), i128::from(i16::MAX), ty),
            Ty::Int32 => self.to_signed(i128::from(i32::MIN), i128::from(i32::MAX), ty),
            Ty::Int64 => self.to_signed(i128::from(i64::MIN), i128::from(i64::MAX), ty),
            Ty::UInt8 => self.to_signed(0, i128::from(u8::MAX), ty),
            Ty::UInt16 => self.to_signed(0, i128::from(u16::MAX), ty),
            Ty::UInt32 => self.to_signed(0, i128::from(u32::MAX), ty),
            Ty::UInt64 => self.to_signed(0, i128::from(u64::MAX), ty),
            Ty::Float32 => {
                let v = self.to_f64_checked()?;
                #[allow(clippy::cast_possible_truncation)]
                Ok(Self::Float32(v as f32))
            }
            Ty::Float64 => Ok(Self::Float64(self.to_f64_checked()?)),
            Ty::Decimal { precision, scale } => self.to_decimal(*precision, *scale),
            Ty::String => Ok(Self::String(self.to_string())),
            Ty::FixedString(width) => {
                let mut bytes = match self.as_str() {
                    Some(s) => String::from(s),
                    None => self.to_string(),
                };
                // Strip padding before re-measuring against the width.
                while bytes.ends_with('\0') {
                    bytes.pop();
                }
                if bytes.len() > *width {
                    return Err(EngineError::conversion(format!(
                        "value too long for FixedString({width})"
                    )));
                }
                bytes.push_str(&"\0".repeat(width - bytes.len()));
                Ok(Self::FixedString {
                    bytes,
                    width: *width,
                })
            }
            Ty::Date => self.to_date().map(Self::Date),
            Ty::DateTime { .. } | Ty::DateTime64 { .. } => {
                self.to_datetime().map(Self::DateTime)
            }
            Ty::Uuid => match self {
                Self::Uuid(u) => Ok(Self::Uuid(*u)),
                other => match other.as_str() {
                    Some(s) => Uuid::parse_str(s.trim()).map(Self::Uuid).map_err(|_| {
                        EngineError::conversion(format!("cannot parse '{s}' as UUID"))
                    }),
                    None => Err(Self::bad_cast(other, ty)),
                },
            },
            Ty::Array(elem) => match self {
                Self::Array { items, .. } => {
                    let items = items
                        .iter()
                        .map(|item| item.cast(elem))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Self::Array {
                        elem: (**elem).clone(),
                        items,
                    })
                }
                other => Err(Self::bad_cast(other, ty)),
            },
            Ty::Tuple(elems) => match self {
                Self::Tuple(items) if items.len() == elems.len() => {
                    let items = items
                        .iter()
                        .zip(elems.iter())
                        .map(|(item, (_, t))| item.cast(t))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Self::Tuple(items))
                }
                Self::Tuple(_) => Err(EngineError::conversion(format!(
                    "tuple arity mismatch casting to {ty}"
                ))),
                other => Err(Self::bad_cast(other, ty)),
            },
            Ty::Map(key, value) => match self {
                Self::Map(entries) => {
                    let entries = entries
                        .iter()
                        .map(|(k, v)| Ok((k.cast(key)?, v.cast(value)?)))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Self::Map(entries))
                }
                other => Err(Self::bad_cast(other, ty)),
            },
        }
    }

    fn bad_cast(value: &Self, ty: &Ty) -> EngineError {
        EngineError::type_error(format!("cannot cast {} to {}", value.ty(), ty))
    }

    fn to_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other if other.is_numeric() => Ok(other.is_truthy()),
            other => match other.as_str() {
                Some(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(true),
                    "false" | "0" => Ok(false),
                    _ => Err(EngineError::conversion(format!(
                        "cannot parse '{s}' as Bool"
                    ))),
                },
                None => Err(Self::bad_cast(other, &Ty::Bool)),
            },
        }
    }

    /// Signed 128-bit view with truncation of fractional kinds.
    fn to_i128_trunc(&self) -> Result<i128> {
        if let Some(n) = self.as_i128() {
            return Ok(n);
        }
        match self {
            Self::Float32(_) | Self::Float64(_) => {
                let v = self.as_f64().unwrap_or_default();
                if !v.is_finite() || v <= i128::MIN as f64 || v >= i128::MAX as f64 {
                    return Err(EngineError::conversion(format!(
                        "float {v} is out of integer range"
                    )));
                }
                #[allow(clippy::cast_possible_truncation)]
                Ok(v.trunc() as i128)
            }
            Self::Decimal {
                mantissa, scale, ..
            } => Ok(mantissa / 10i128.pow(u32::from(*scale))),
            Self::Date(d) => Ok(i128::from(
                d.signed_duration_since(NaiveDate::default()).num_days(),
            )),
            Self::DateTime(dt) => Ok(i128::from(dt.and_utc().timestamp())),
            other => match other.as_str() {
                Some(s) => s.trim().parse::<i128>().map_err(|_| {
                    EngineError::conversion(format!("cannot parse '{s}' as an integer"))
                }),
                None => Err(EngineError::type_error(format!(
                    "cannot convert {} to an integer",
                    other.ty()
                ))),
            },
        }
    }

    fn to_signed(&self, min: i128, max: i128, ty: &Ty) -> Result<Self> {
        let n = self.to_i128_trunc()?;
        if n < min || n > max {
            return Err(EngineError::conversion(format!(
                "value {n} is out of range for {ty}"
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(match ty {
            Ty::Int8 => Self::Int8(n as i8),
            Ty::Int16 => Self::Int16(n as i16),
            Ty::Int32 => Self::Int32(n as i32),
            Ty::Int64 => Self::Int64(n as i64),
            Ty::UInt8 => Self::UInt8(n as u8),
            Ty::UInt16 => Self::UInt16(n as u16),
            Ty::UInt32 => Self::UInt32(n as u32),
            _ => Self::UInt64(n as u64),
        })
    }

    fn to_f64_checked(&self) -> Result<f64> {
        if let Some(v) = self.as_f64() {
            return Ok(v);
        }
        match self.as_str() {
            Some(s) => s.trim().parse::<f64>().map_err(|_| {
                EngineError::conversion(format!("cannot parse '{s}' as a float"))
            }),
            None => Err(EngineError::type_error(format!(
                "cannot convert {} to a float",
                self.ty()
            ))),
        }
    }

    fn to_decimal(&self, precision: u8, scale: u8) -> Result<Self> {
        let v = self.to_f64_checked()?;
        let scaled = v * 10f64.powi(i32::from(scale));
        if !scaled.is_finite() {
            return Err(EngineError::conversion("decimal value is not finite"));
        }
        #[allow(clippy::cast_possible_truncation)]
        let mantissa = scaled.round() as i128;
        let limit = 10i128.pow(u32::from(precision));
        if mantissa.abs() >= limit {
            return Err(EngineError::conversion(format!(
                "value {v} overflows Decimal({precision}, {scale})"
            )));
        }
        Ok(Self::Decimal {
            mantissa,
            precision,
            scale,
        })
    }

    fn to_date(&self) -> Result<NaiveDate> {
        match self {
            Self::Date(d) => Ok(*d),
            Self::DateTime(dt) => Ok(dt.date()),
            other if other.is_numeric() => {
                let days = other.to_i128_trunc()?;
                let epoch = NaiveDate::default();
                let date = if days >= 0 {
                    u64::try_from(days)
                        .ok()
                        .and_then(|d| epoch.checked_add_days(chrono::Days::new(d)))
                } else {
                    u64::try_from(-days)
                        .ok()
                        .and_then(|d| epoch.checked_sub_days(chrono::Days::new(d)))
                };
                date.ok_or_else(|| {
                    EngineError::conversion(format!("day offset {days} is out of range"))
                })
            }
            other => match other.as_str() {
                Some(s) => parse_date(s),
                None => Err(EngineError::type_error(format!(
                    "cannot convert {} to Date",
                    other.ty()
                ))),
            },
        }
    }

    fn to_datetime(&self) -> Result<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Ok(*dt),
            Self::Date(d) => d.and_hms_opt(0, 0, 0).ok_or_else(|| {
                EngineError::conversion("date is out of datetime range")
            }),
            other if other.is_numeric() => {
                let secs = other.to_i128_trunc()?;
                i64::try_from(secs)
                    .ok()
                    .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| {
                        EngineError::conversion(format!(
                            "timestamp {secs} is out of range"
                        ))
                    })
            }
            other => match other.as_str() {
                Some(s) => parse_datetime(s),
                None => Err(EngineError::type_error(format!(
                    "cannot convert {} to DateTime",
                    other.ty()
                ))),
            },
        }
    }
}
