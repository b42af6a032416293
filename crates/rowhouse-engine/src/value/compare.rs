//! Ordering and equality across value kinds.

use std::cmp::Ordering;

use super::Value;
use crate::error::{EngineError, Result};

impl Value {
    /// Total ordering used by ORDER BY, BETWEEN, and min/max.
    ///
    /// NULL orders strictly before every non-null value. Cross-kind
    /// numeric comparisons use the signed 128-bit view when both sides
    /// are integers and fall back to 64-bit floats otherwise. Date and
    /// datetime mix by converting the date to midnight.
    ///
    /// # Errors
    ///
    /// Returns a `type` error for incompatible categories and for maps,
    /// which do not order.
    pub fn compare(&self, other: &Self) -> Result<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Ok(Ordering::Equal),
            (Self::Null, _) => Ok(Ordering::Less),
            (_, Self::Null) => Ok(Ordering::Greater),

            (Self::Map(_), _) | (_, Self::Map(_)) => Err(EngineError::type_error(
                "map values do not support ordering",
            )),

            (a, b) if a.is_numeric() && b.is_numeric() => {
                if let (Some(x), Some(y)) = (a.as_i128(), b.as_i128()) {
                    return Ok(x.cmp(&y));
                }
                match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => Ok(x.total_cmp(&y)),
                    _ => Err(Self::incomparable(a, b)),
                }
            }

            (Self::String(_) | Self::FixedString { .. }, Self::String(_) | Self::FixedString { .. }) => {
                match (self.as_str(), other.as_str()) {
                    (Some(a), Some(b)) => Ok(a.as_bytes().cmp(b.as_bytes())),
                    _ => Err(Self::incomparable(self, other)),
                }
            }

            (Self::Date(a), Self::Date(b)) => Ok(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Ok(a.cmp(b)),
            (Self::Date(a), Self::DateTime(b)) => {
                Ok(a.and_hms_opt(0, 0, 0).map_or(Ordering::Less, |dt| dt.cmp(b)))
            }
            (Self::DateTime(a), Self::Date(b)) => {
                Ok(b.and_hms_opt(0, 0, 0).map_or(Ordering::Greater, |dt| a.cmp(&dt)))
            }

            (Self::Uuid(a), Self::Uuid(b)) => Ok(a.cmp(b)),

            (Self::Array { items: a, .. }, Self::Array { items: b, .. })
            | (Self::Tuple(a), Self::Tuple(b)) => Self::compare_elementwise(a, b),

            (a, b) => Err(Self::incomparable(a, b)),
        }
    }

    /// Lexicographic element comparison; an exhausted shorter side is
    /// less.
    fn compare_elementwise(a: &[Self], b: &[Self]) -> Result<Ordering> {
        for (x, y) in a.iter().zip(b.iter()) {
            match x.compare(y)? {
                Ordering::Equal => {}
                non_eq => return Ok(non_eq),
            }
        }
        Ok(a.len().cmp(&b.len()))
    }

    fn incomparable(a: &Self, b: &Self) -> EngineError {
        EngineError::type_error(format!("cannot compare {} with {}", a.ty(), b.ty()))
    }

    /// Structural equality used by IN lists, USING joins, and map keys.
    ///
    /// A NULL operand never equals anything at the top level (SQL
    /// semantics); NULLs nested inside arrays, tuples, and maps compare
    /// equal to each other so composites behave structurally. Numeric
    /// kinds compare through the 64-bit float fallback.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        Self::eq_impl(self, other)
    }

    fn eq_impl(a: &Self, b: &Self) -> bool {
        match (a, b) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            (x, y) if x.is_numeric() && y.is_numeric() => {
                if let (Some(m), Some(n)) = (x.as_i128(), y.as_i128()) {
                    return m == n;
                }
                match (x.as_f64(), y.as_f64()) {
                    (Some(m), Some(n)) => m == n,
                    _ => false,
                }
            }
            (Self::String(_) | Self::FixedString { .. }, Self::String(_) | Self::FixedString { .. }) => {
                a.as_str() == b.as_str()
            }
            (Self::Date(x), Self::Date(y)) => x == y,
            (Self::DateTime(x), Self::DateTime(y)) => x == y,
            (Self::Date(x), Self::DateTime(y)) => {
                x.and_hms_opt(0, 0, 0).is_some_and(|dt| dt == *y)
            }
            (Self::DateTime(x), Self::Date(y)) => {
                y.and_hms_opt(0, 0, 0).is_some_and(|dt| *x == dt)
            }
            (Self::Uuid(x), Self::Uuid(y)) => x == y,
            (Self::Array { items: x, .. }, Self::Array { items: y, .. })
            | (Self::Tuple(x), Self::Tuple(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(m, n)| Self::eq_impl(m, n))
            }
            // Maps equate by set-of-entries.
            (Self::Map(x), Self::Map(y)) => {
                x.len() == y.len()
                    && x.iter().all(|(k, v)| {
                        y.iter()
                            .any(|(k2, v2)| Self::eq_impl(k, k2) && Self::eq_impl(v, v2))
                    })
            }
            _ => false,
        }
    }
}
