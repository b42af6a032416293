//! Built-in scalar functions.
//!
//! All of these propagate NULL from their arguments unless the function
//! exists to handle NULL (`ifNull`, `coalesce`, `isNull`, ...).

use chrono::Utc;
use uuid::Uuid;

use super::FunctionRegistry;
use crate::error::{EngineError, Result};
use crate::types::Ty;
use crate::value::Value;

/// Registers the scalar library into `registry`.
pub fn register(registry: &mut FunctionRegistry) {
    // Strings
    registry.register_scalar("length", 1, Some(1), fn_length);
    registry.register_scalar("lower", 1, Some(1), fn_lower);
    registry.register_scalar("upper", 1, Some(1), fn_upper);
    registry.register_scalar("reverse", 1, Some(1), fn_reverse);
    registry.register_scalar("concat", 1, None, fn_concat);
    registry.register_scalar("substring", 2, Some(3), fn_substring);
    registry.register_scalar("position", 2, Some(2), fn_position);
    registry.register_scalar("trim", 1, Some(1), fn_trim);
    registry.register_scalar("startsWith", 2, Some(2), fn_starts_with);
    registry.register_scalar("endsWith", 2, Some(2), fn_ends_with);
    registry.register_scalar("replaceAll", 3, Some(3), fn_replace_all);
    registry.alias("lcase", "lower");
    registry.alias("ucase", "upper");
    registry.alias("substr", "substring");
    registry.alias("mid", "substring");
    registry.alias("char_length", "length");
    registry.alias("character_length", "length");

    // Math
    registry.register_scalar("abs", 1, Some(1), fn_abs);
    registry.register_scalar("round", 1, Some(2), fn_round);
    registry.register_scalar("floor", 1, Some(1), fn_floor);
    registry.register_scalar("ceil", 1, Some(1), fn_ceil);
    registry.register_scalar("sqrt", 1, Some(1), fn_sqrt);
    registry.register_scalar("exp", 1, Some(1), fn_exp);
    registry.register_scalar("log", 1, Some(1), fn_log);
    registry.register_scalar("pow", 2, Some(2), fn_pow);
    registry.register_scalar("greatest", 1, None, fn_greatest);
    registry.register_scalar("least", 1, None, fn_least);
    registry.alias("ceiling", "ceil");
    registry.alias("power", "pow");
    registry.alias("ln", "log");

    // Conditionals and NULL handling
    registry.register_scalar("if", 3, Some(3), fn_if);
    registry.register_scalar("ifNull", 2, Some(2), fn_if_null);
    registry.register_scalar("nullIf", 2, Some(2), fn_null_if);
    registry.register_scalar("coalesce", 1, None, fn_coalesce);
    registry.register_scalar("isNull", 1, Some(1), fn_is_null);
    registry.register_scalar("isNotNull", 1, Some(1), fn_is_not_null);

    // Conversions
    registry.register_scalar("toString", 1, Some(1), |args, _| cast_to(args, &Ty::String));
    registry.register_scalar("toInt8", 1, Some(1), |args, _| cast_to(args, &Ty::Int8));
    registry.register_scalar("toInt16", 1, Some(1), |args, _| cast_to(args, &Ty::Int16));
    registry.register_scalar("toInt32", 1, Some(1), |args, _| cast_to(args, &Ty::Int32));
    registry.register_scalar("toInt64", 1, Some(1), |args, _| cast_to(args, &Ty::Int64));
    registry.register_scalar("toUInt8", 1, Some(1), |args, _| cast_to(args, &Ty::UInt8));
    registry.register_scalar("toUInt16", 1, Some(1), |args, _| cast_to(args, &Ty::UInt16));
    registry.register_scalar("toUInt32", 1, Some(1), |args, _| cast_to(args, &Ty::UInt32));
    registry.register_scalar("toUInt64", 1, Some(1), |args, _| cast_to(args, &Ty::UInt64));
    registry.register_scalar("toFloat32", 1, Some(1), |args, _| {
        cast_to(args, &Ty::Float32)
    });
    registry.register_scalar("toFloat64", 1, Some(1), |args, _| {
        cast_to(args, &Ty::Float64)
    });
    registry.register_scalar("toDecimal64", 2, Some(2), fn_to_decimal64);
    registry.register_scalar("toDate", 1, Some(1), |args, _| cast_to(args, &Ty::Date));
    registry.register_scalar("toDateTime", 1, Some(1), |args, _| {
        cast_to(args, &Ty::DateTime { timezone: None })
    });
    registry.register_scalar("toUUID", 1, Some(1), |args, _| cast_to(args, &Ty::Uuid));

    // Date/time and UUID producers
    registry.register_scalar("now", 0, Some(0), fn_now);
    registry.register_scalar("today", 0, Some(0), fn_today);
    registry.register_scalar("generateUUIDv4", 0, Some(0), fn_generate_uuid);

    // Collections
    registry.register_scalar("empty", 1, Some(1), fn_empty);
    registry.register_scalar("notEmpty", 1, Some(1), fn_not_empty);
    registry.register_scalar("has", 2, Some(2), fn_has);
    registry.register_scalar("indexOf", 2, Some(2), fn_index_of);
    registry.register_scalar("arrayConcat", 1, None, fn_array_concat);
    registry.register_scalar("array", 0, None, fn_array);
    registry.register_scalar("tuple", 1, None, fn_tuple);
    registry.register_scalar("map", 0, None, fn_map);
}

fn want_str<'a>(value: &'a Value, name: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        EngineError::type_error(format!("{name} expects a string, got {}", value.ty()))
    })
}

fn want_f64(value: &Value, name: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        EngineError::type_error(format!("{name} expects a number, got {}", value.ty()))
    })
}

fn want_array<'a>(value: &'a Value, name: &str) -> Result<&'a [Value]> {
    match value {
        Value::Array { items, .. } => Ok(items),
        other => Err(EngineError::type_error(format!(
            "{name} expects an array, got {}",
            other.ty()
        ))),
    }
}

fn cast_to(args: &[Value], ty: &Ty) -> Result<Value> {
    args[0].cast(ty)
}

fn null_in(args: &[Value]) -> bool {
    args.iter().any(Value::is_null)
}

/// Element type for arrays built from a value list.
fn common_elem_ty(items: &[Value]) -> Ty {
    items
        .iter()
        .find(|v| !v.is_null())
        .map_or(Ty::Nothing, Value::ty)
}

// --- Strings ---

fn fn_length(args: &[Value], _: bool) -> Result<Value> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Array { items, .. } => Ok(Value::UInt64(items.len() as u64)),
        Value::Map(entries) => Ok(Value::UInt64(entries.len() as u64)),
        other => Ok(Value::UInt64(want_str(other, "length")?.len() as u64)),
    }
}

fn fn_lower(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::String(want_str(&args[0], "lower")?.to_lowercase()))
}

fn fn_upper(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::String(want_str(&args[0], "upper")?.to_uppercase()))
}

fn fn_reverse(args: &[Value], _: bool) -> Result<Value> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Array { elem, items } => {
            let mut items = items.clone();
            items.reverse();
            Ok(Value::Array {
                elem: elem.clone(),
                items,
            })
        }
        other => Ok(Value::String(
            want_str(other, "reverse")?.chars().rev().collect(),
        )),
    }
}

fn fn_concat(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    let mut out = String::new();
    for arg in args {
        match arg.as_str() {
            Some(s) => out.push_str(s),
            None => out.push_str(&arg.to_string()),
        }
    }
    Ok(Value::String(out))
}

fn fn_substring(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    let s = want_str(&args[0], "substring")?;
    let chars: Vec<char> = s.chars().collect();
    #[allow(clippy::cast_possible_truncation)]
    let start = want_f64(&args[1], "substring")? as i64;
    // 1-based start; out-of-range clamps to an empty result.
    let begin = if start > 0 {
        (start - 1) as usize
    } else {
        0
    };
    if begin >= chars.len() {
        return Ok(Value::String(String::new()));
    }
    let rest = &chars[begin..];
    let taken: String = match args.get(2) {
        Some(len) => {
            #[allow(clippy::cast_possible_truncation)]
            let len = want_f64(len, "substring")?.max(0.0) as usize;
            rest.iter().take(len).collect()
        }
        None => rest.iter().collect(),
    };
    Ok(Value::String(taken))
}

fn fn_position(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    let haystack = want_str(&args[0], "position")?;
    let needle = want_str(&args[1], "position")?;
    Ok(Value::UInt64(
        haystack.find(needle).map_or(0, |i| i as u64 + 1),
    ))
}

fn fn_trim(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::String(String::from(want_str(&args[0], "trim")?.trim())))
}

fn fn_starts_with(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::Bool(
        want_str(&args[0], "startsWith")?.starts_with(want_str(&args[1], "startsWith")?),
    ))
}

fn fn_ends_with(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::Bool(
        want_str(&args[0], "endsWith")?.ends_with(want_str(&args[1], "endsWith")?),
    ))
}

fn fn_replace_all(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    let s = want_str(&args[0], "replaceAll")?;
    let from = want_str(&args[1], "replaceAll")?;
    let to = want_str(&args[2], "replaceAll")?;
    Ok(Value::String(s.replace(from, to)))
}

// --- Math ---

fn fn_abs(args: &[Value], _: bool) -> Result<Value> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Int8(n) => Ok(Value::Int8(n.wrapping_abs())),
        Value::Int16(n) => Ok(Value::Int16(n.wrapping_abs())),
        Value::Int32(n) => Ok(Value::Int32(n.wrapping_abs())),
        Value::Int64(n) => Ok(Value::Int64(n.wrapping_abs())),
        v @ (Value::UInt8(_) | Value::UInt16(_) | Value::UInt32(_) | Value::UInt64(_)) => {
            Ok(v.clone())
        }
        Value::Float32(v) => Ok(Value::Float32(v.abs())),
        Value::Float64(v) => Ok(Value::Float64(v.abs())),
        Value::Decimal {
            mantissa,
            precision,
            scale,
        } => Ok(Value::Decimal {
            mantissa: mantissa.abs(),
            precision: *precision,
            scale: *scale,
        }),
        other => Err(EngineError::type_error(format!(
            "abs expects a number, got {}",
            other.ty()
        ))),
    }
}

fn fn_round(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    let v = want_f64(&args[0], "round")?;
    let digits = match args.get(1) {
        #[allow(clippy::cast_possible_truncation)]
        Some(d) => want_f64(d, "round")? as i32,
        None => 0,
    };
    let factor = 10f64.powi(digits);
    Ok(Value::Float64((v * factor).round() / factor))
}

fn fn_floor(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::Float64(want_f64(&args[0], "floor")?.floor()))
}

fn fn_ceil(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::Float64(want_f64(&args[0], "ceil")?.ceil()))
}

fn fn_sqrt(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::Float64(want_f64(&args[0], "sqrt")?.sqrt()))
}

fn fn_exp(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::Float64(want_f64(&args[0], "exp")?.exp()))
}

fn fn_log(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::Float64(want_f64(&args[0], "log")?.ln()))
}

fn fn_pow(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    Ok(Value::Float64(
        want_f64(&args[0], "pow")?.powf(want_f64(&args[1], "pow")?),
    ))
}

fn pick_extreme(args: &[Value], name: &str, want_greater: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    let mut best = &args[0];
    for arg in &args[1..] {
        let ordering = arg.compare(best).map_err(|_| {
            EngineError::type_error(format!("{name} arguments are not comparable"))
        })?;
        if (ordering == std::cmp::Ordering::Greater) == want_greater
            && ordering != std::cmp::Ordering::Equal
        {
            best = arg;
        }
    }
    Ok(best.clone())
}

fn fn_greatest(args: &[Value], _: bool) -> Result<Value> {
    pick_extreme(args, "greatest", true)
}

fn fn_least(args: &[Value], _: bool) -> Result<Value> {
    pick_extreme(args, "least", false)
}

// --- Conditionals ---

fn fn_if(args: &[Value], _: bool) -> Result<Value> {
    Ok(if args[0].is_truthy() {
        args[1].clone()
    } else {
        args[2].clone()
    })
}

fn fn_if_null(args: &[Value], _: bool) -> Result<Value> {
    Ok(if args[0].is_null() {
        args[1].clone()
    } else {
        args[0].clone()
    })
}

fn fn_null_if(args: &[Value], _: bool) -> Result<Value> {
    Ok(if args[0].equals(&args[1]) {
        Value::Null
    } else {
        args[0].clone()
    })
}

fn fn_coalesce(args: &[Value], _: bool) -> Result<Value> {
    Ok(args
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

fn fn_is_null(args: &[Value], _: bool) -> Result<Value> {
    Ok(Value::Bool(args[0].is_null()))
}

fn fn_is_not_null(args: &[Value], _: bool) -> Result<Value> {
    Ok(Value::Bool(!args[0].is_null()))
}

// --- Conversions with parameters ---

fn fn_to_decimal64(args: &[Value], _: bool) -> Result<Value> {
    let scale = want_f64(&args[1], "toDecimal64")?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scale = scale.max(0.0).min(18.0) as u8;
    args[0].cast(&Ty::Decimal {
        precision: 18,
        scale,
    })
}

// --- Producers ---

fn fn_now(_: &[Value], _: bool) -> Result<Value> {
    Ok(Value::DateTime(Utc::now().naive_utc()))
}

fn fn_today(_: &[Value], _: bool) -> Result<Value> {
    Ok(Value::Date(Utc::now().date_naive()))
}

fn fn_generate_uuid(_: &[Value], _: bool) -> Result<Value> {
    Ok(Value::Uuid(Uuid::new_v4()))
}

// --- Collections ---

fn fn_empty(args: &[Value], _: bool) -> Result<Value> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Array { items, .. } => Ok(Value::Bool(items.is_empty())),
        Value::Map(entries) => Ok(Value::Bool(entries.is_empty())),
        other => Ok(Value::Bool(want_str(other, "empty")?.is_empty())),
    }
}

fn fn_not_empty(args: &[Value], _: bool) -> Result<Value> {
    match fn_empty(args, false)? {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Ok(other),
    }
}

fn fn_has(args: &[Value], _: bool) -> Result<Value> {
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let items = want_array(&args[0], "has")?;
    Ok(Value::Bool(items.iter().any(|v| v.equals(&args[1]))))
}

fn fn_index_of(args: &[Value], _: bool) -> Result<Value> {
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let items = want_array(&args[0], "indexOf")?;
    Ok(Value::UInt64(
        items
            .iter()
            .position(|v| v.equals(&args[1]))
            .map_or(0, |i| i as u64 + 1),
    ))
}

fn fn_array_concat(args: &[Value], _: bool) -> Result<Value> {
    if null_in(args) {
        return Ok(Value::Null);
    }
    let mut items = Vec::new();
    for arg in args {
        items.extend_from_slice(want_array(arg, "arrayConcat")?);
    }
    Ok(Value::Array {
        elem: common_elem_ty(&items),
        items,
    })
}

fn fn_array(args: &[Value], _: bool) -> Result<Value> {
    Ok(Value::Array {
        elem: common_elem_ty(args),
        items: args.to_vec(),
    })
}

fn fn_tuple(args: &[Value], _: bool) -> Result<Value> {
    Ok(Value::Tuple(args.to_vec()))
}

fn fn_map(args: &[Value], _: bool) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(EngineError::Arity {
            name: String::from("map"),
            expected: String::from("an even number of"),
            actual: args.len(),
        });
    }
    let entries = args
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    Ok(Value::Map(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::String(String::from(text))
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(fn_lower(&[s("AbC")], false).unwrap(), s("abc"));
        assert_eq!(fn_upper(&[s("AbC")], false).unwrap(), s("ABC"));
        assert_eq!(
            fn_concat(&[s("a"), Value::Int64(1), s("b")], false).unwrap(),
            s("a1b")
        );
        assert_eq!(
            fn_substring(&[s("hello"), Value::Int64(2), Value::Int64(3)], false).unwrap(),
            s("ell")
        );
        assert_eq!(
            fn_position(&[s("hello"), s("ll")], false).unwrap(),
            Value::UInt64(3)
        );
        assert_eq!(
            fn_replace_all(&[s("a-b-c"), s("-"), s("+")], false).unwrap(),
            s("a+b+c")
        );
    }

    #[test]
    fn test_null_propagation() {
        assert_eq!(fn_lower(&[Value::Null], false).unwrap(), Value::Null);
        assert_eq!(
            fn_concat(&[s("a"), Value::Null], false).unwrap(),
            Value::Null
        );
        assert_eq!(fn_round(&[Value::Null], false).unwrap(), Value::Null);
    }

    #[test]
    fn test_math_functions() {
        assert_eq!(fn_abs(&[Value::Int64(-5)], false).unwrap(), Value::Int64(5));
        assert_eq!(
            fn_round(&[Value::Float64(2.567), Value::Int64(2)], false).unwrap(),
            Value::Float64(2.57)
        );
        assert_eq!(
            fn_greatest(&[Value::Int64(1), Value::Float64(2.5), Value::Int64(2)], false)
                .unwrap(),
            Value::Float64(2.5)
        );
        assert_eq!(
            fn_least(&[Value::Int64(1), Value::Float64(2.5)], false).unwrap(),
            Value::Int64(1)
        );
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(
            fn_if(&[Value::Bool(true), s("a"), s("b")], false).unwrap(),
            s("a")
        );
        assert_eq!(
            fn_if(&[Value::Null, s("a"), s("b")], false).unwrap(),
            s("b")
        );
        assert_eq!(fn_if_null(&[Value::Null, s("x")], false).unwrap(), s("x"));
        assert_eq!(fn_null_if(&[s("x"), s("x")], false).unwrap(), Value::Null);
        assert_eq!(
            fn_coalesce(&[Value::Null, Value::Null, Value::Int64(3)], false).unwrap(),
            Value::Int64(3)
        );
        assert_eq!(fn_coalesce(&[Value::Null], false).unwrap(), Value::Null);
    }

    #[test]
    fn test_collections() {
        let arr = fn_array(&[Value::Int64(1), Value::Int64(2)], false).unwrap();
        assert_eq!(
            fn_has(&[arr.clone(), Value::Int64(2)], false).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            fn_index_of(&[arr.clone(), Value::Int64(2)], false).unwrap(),
            Value::UInt64(2)
        );
        assert_eq!(
            fn_index_of(&[arr.clone(), Value::Int64(9)], false).unwrap(),
            Value::UInt64(0)
        );
        assert_eq!(fn_empty(&[arr], false).unwrap(), Value::Bool(false));
        assert_eq!(fn_empty(&[s("")], false).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_map_requires_even_args() {
        assert!(fn_map(&[s("k")], false).is_err());
        let m = fn_map(&[s("k"), Value::Int64(1)], false).unwrap();
        assert!(matches!(m, Value::Map(entries) if entries.len() == 1));
    }
}
