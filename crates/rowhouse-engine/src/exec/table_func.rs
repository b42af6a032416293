//! Table functions: function-shaped row producers usable in FROM.

use crate::error::{EngineError, Result};
use crate::result::{QueryResult, ResultColumn};
use crate::types::Ty;
use crate::value::Value;

fn count_arg(value: &Value, name: &str) -> Result<u64> {
    value
        .as_i128()
        .filter(|n| *n >= 0)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| {
            EngineError::type_error(format!(
                "{name} expects a non-negative integer, got {}",
                value.ty()
            ))
        })
}

/// Dispatches a table function by name. Unknown names error.
pub(super) fn invoke(name: &str, args: &[Value]) -> Result<QueryResult> {
    match name.to_lowercase().as_str() {
        "numbers" => {
            let (count, start) = match args {
                [count] => (count_arg(count, "numbers")?, 0),
                [count, start] => (count_arg(count, "numbers")?, count_arg(start, "numbers")?),
                _ => {
                    return Err(EngineError::Arity {
                        name: String::from("numbers"),
                        expected: String::from("1 to 2"),
                        actual: args.len(),
                    })
                }
            };
            Ok(single_column(
                "number",
                (start..start + count).map(Value::UInt64).collect(),
            ))
        }
        "zeros" => {
            let [count] = args else {
                return Err(EngineError::Arity {
                    name: String::from("zeros"),
                    expected: String::from("1"),
                    actual: args.len(),
                });
            };
            let count = count_arg(count, "zeros")?;
            Ok(single_column(
                "zero",
                (0..count).map(|_| Value::UInt64(0)).collect(),
            ))
        }
        "one" => {
            if !args.is_empty() {
                return Err(EngineError::Arity {
                    name: String::from("one"),
                    expected: String::from("0"),
                    actual: args.len(),
                });
            }
            Ok(single_column("dummy", vec![Value::UInt8(0)]))
        }
        _ => Err(EngineError::UnknownFunction(String::from(name))),
    }
}

fn single_column(name: &str, values: Vec<Value>) -> QueryResult {
    let ty = values.first().map_or(Ty::UInt64, Value::ty);
    QueryResult {
        columns: vec![ResultColumn {
            name: String::from(name),
            ty,
        }],
        rows: values.into_iter().map(|v| vec![v]).collect(),
        affected: 0,
    }
}
