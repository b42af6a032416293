//! Built-in aggregate functions.
//!
//! Each aggregate is a state type implementing [`AggregateState`];
//! `sum` and `avg` accumulate through 64-bit floats, matching the
//! engine's documented result types.

use std::collections::HashSet;

use super::{AggregateState, FunctionRegistry};
use crate::error::{EngineError, Result};
use crate::value::Value;

/// Registers the aggregate library into `registry`.
pub fn register(registry: &mut FunctionRegistry) {
    registry.register_aggregate("count", 0, Some(1), || Box::new(CountState::default()));
    registry.register_aggregate("sum", 1, Some(1), || Box::new(SumState::default()));
    registry.register_aggregate("avg", 1, Some(1), || Box::new(AvgState::default()));
    registry.register_aggregate("min", 1, Some(1), || {
        Box::new(ExtremeState { keep_greater: false, current: None })
    });
    registry.register_aggregate("max", 1, Some(1), || {
        Box::new(ExtremeState { keep_greater: true, current: None })
    });
    registry.register_aggregate("any", 1, Some(1), || Box::new(AnyState::default()));
    registry.register_aggregate("anyLast", 1, Some(1), || Box::new(AnyLastState::default()));
    registry.register_aggregate("uniq", 1, None, || Box::new(UniqState::default()));
    registry.register_aggregate("groupArray", 1, Some(1), || {
        Box::new(GroupArrayState::default())
    });
}

fn numeric_arg(value: &Value, name: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        EngineError::type_error(format!("{name} expects a number, got {}", value.ty()))
    })
}

/// `count()` / `count(*)` count rows; `count(x)` counts non-null values.
#[derive(Default)]
struct CountState {
    count: i64,
}

impl AggregateState for CountState {
    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        match args.first() {
            None => self.count += 1,
            Some(v) if !v.is_null() => self.count += 1,
            Some(_) => {}
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<Value> {
        Ok(Value::Int64(self.count))
    }
}

/// `sum(x)`; NULL over an empty or all-null input.
#[derive(Default)]
struct SumState {
    sum: f64,
    seen: bool,
}

impl AggregateState for SumState {
    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if args[0].is_null() {
            return Ok(());
        }
        self.sum += numeric_arg(&args[0], "sum")?;
        self.seen = true;
        Ok(())
    }

    fn finalize(&mut self) -> Result<Value> {
        Ok(if self.seen {
            Value::Float64(self.sum)
        } else {
            Value::Null
        })
    }
}

/// `avg(x)`; NULL over an empty or all-null input.
#[derive(Default)]
struct AvgState {
    sum: f64,
    count: u32,
}

impl AggregateState for AvgState {
    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if args[0].is_null() {
            return Ok(());
        }
        self.sum += numeric_arg(&args[0], "avg")?;
        self.count += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<Value> {
        Ok(if self.count == 0 {
            Value::Null
        } else {
            Value::Float64(self.sum / f64::from(self.count))
        })
    }
}

/// `min(x)` / `max(x)` via the value ordering; NULL inputs are skipped.
struct ExtremeState {
    keep_greater: bool,
    current: Option<Value>,
}

impl AggregateState for ExtremeState {
    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if args[0].is_null() {
            return Ok(());
        }
        match &self.current {
            None => self.current = Some(args[0].clone()),
            Some(cur) => {
                let ordering = args[0].compare(cur)?;
                let replace = if self.keep_greater {
                    ordering == std::cmp::Ordering::Greater
                } else {
                    ordering == std::cmp::Ordering::Less
                };
                if replace {
                    self.current = Some(args[0].clone());
                }
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<Value> {
        Ok(self.current.take().unwrap_or(Value::Null))
    }
}

/// `any(x)`: the first non-null value seen.
#[derive(Default)]
struct AnyState {
    first: Option<Value>,
}

impl AggregateState for AnyState {
    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if self.first.is_none() && !args[0].is_null() {
            self.first = Some(args[0].clone());
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<Value> {
        Ok(self.first.take().unwrap_or(Value::Null))
    }
}

/// `anyLast(x)`: the last non-null value seen.
#[derive(Default)]
struct AnyLastState {
    last: Option<Value>,
}

impl AggregateState for AnyLastState {
    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if !args[0].is_null() {
            self.last = Some(args[0].clone());
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<Value> {
        Ok(self.last.take().unwrap_or(Value::Null))
    }
}

/// `uniq(x, ...)`: the number of distinct non-null argument tuples,
/// keyed by the stringified form.
#[derive(Default)]
struct UniqState {
    keys: HashSet<String>,
}

impl AggregateState for UniqState {
    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if args.iter().all(Value::is_null) {
            return Ok(());
        }
        let key = args
            .iter()
            .map(Value::group_key)
            .collect::<Vec<_>>()
            .join("\u{0}");
        self.keys.insert(key);
        Ok(())
    }

    fn finalize(&mut self) -> Result<Value> {
        Ok(Value::UInt64(self.keys.len() as u64))
    }
}

/// `groupArray(x)`: the non-null values in row order.
#[derive(Default)]
struct GroupArrayState {
    items: Vec<Value>,
}

impl AggregateState for GroupArrayState {
    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if !args[0].is_null() {
            self.items.push(args[0].clone());
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<Value> {
        let elem = self
            .items
            .first()
            .map_or(crate::types::Ty::Nothing, Value::ty);
        Ok(Value::Array {
            elem,
            items: std::mem::take(&mut self.items),
        })
    }
}
