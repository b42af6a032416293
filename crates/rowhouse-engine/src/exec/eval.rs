//! Expression evaluation.
//!
//! The evaluator and the statement executor are mutually recursive: IN,
//! EXISTS, and scalar subqueries call back into [`super::Executor`],
//! which owns the catalog, registry, and ambient CTE map.

use std::collections::HashSet;

use regex::Regex;
use rowhouse_sql::ast::{BinaryOp, Expr, FunctionCall, InList, Literal, UnaryOp};

use super::Executor;
use crate::error::{EngineError, Result};
use crate::functions::Function;
use crate::row::RowContext;
use crate::types::Ty;
use crate::value::Value;

/// Translates a LIKE/ILIKE pattern into an anchored regex: meta
/// characters are escaped, `%` becomes `.*`, `_` becomes `.`.
fn like_to_regex(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push_str(if case_insensitive { "(?is)^" } else { "(?s)^" });
    for c in pattern.chars() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re)
        .map_err(|e| EngineError::type_error(format!("invalid LIKE pattern: {e}")))
}

impl Executor<'_> {
    /// Evaluates an expression against a row context.
    ///
    /// When `group` is set, the evaluator is in grouped mode: aggregate
    /// function calls are computed over the group's rows and everything
    /// else reads from the representative context `ctx`.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn eval_expr(
        &mut self,
        expr: &Expr,
        ctx: &RowContext,
        group: Option<&[RowContext]>,
    ) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Integer(n) => Value::Int64(*n),
                Literal::Float(v) => Value::Float64(*v),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),

            Expr::Column { table, name } => self.resolve_column(ctx, table.as_deref(), name),

            Expr::Aliased { expr, .. } => self.eval_expr(expr, ctx, group),

            Expr::Binary { left, op, right } => {
                let lhs = self.eval_expr(left, ctx, group)?;
                let rhs = self.eval_expr(right, ctx, group)?;
                Self::eval_binary(*op, &lhs, &rhs)
            }

            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, ctx, group)?;
                Self::eval_unary(*op, &value)
            }

            Expr::IsNull { expr, negated } => {
                let value = self.eval_expr(expr, ctx, group)?;
                Ok(Value::Bool(value.is_null() != *negated))
            }

            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let probe = self.eval_expr(expr, ctx, group)?;
                let low = self.eval_expr(low, ctx, group)?;
                let high = self.eval_expr(high, ctx, group)?;
                if probe.is_null() || low.is_null() || high.is_null() {
                    return Ok(Value::Null);
                }
                let inside = probe.compare(&low)? != std::cmp::Ordering::Less
                    && probe.compare(&high)? != std::cmp::Ordering::Greater;
                Ok(Value::Bool(inside != *negated))
            }

            Expr::In {
                expr,
                list,
                negated,
            } => {
                let probe = self.eval_expr(expr, ctx, group)?;
                if probe.is_null() {
                    return Ok(Value::Null);
                }
                let found = match list {
                    InList::Values(items) => {
                        let mut found = false;
                        for item in items {
                            let candidate = self.eval_expr(item, ctx, group)?;
                            if probe.equals(&candidate) {
                                found = true;
                                break;
                            }
                        }
                        found
                    }
                    InList::Subquery(stmt) => {
                        let result = self.execute_subquery(stmt, ctx)?;
                        result
                            .rows
                            .iter()
                            .filter_map(|row| row.first())
                            .any(|candidate| probe.equals(candidate))
                    }
                };
                Ok(Value::Bool(found != *negated))
            }

            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                let operand_value = operand
                    .as_deref()
                    .map(|op| self.eval_expr(op, ctx, group))
                    .transpose()?;
                for (when_expr, then_expr) in when_clauses {
                    let when_value = self.eval_expr(when_expr, ctx, group)?;
                    let matched = match &operand_value {
                        Some(op) => op.equals(&when_value),
                        None => when_value.is_truthy(),
                    };
                    if matched {
                        return self.eval_expr(then_expr, ctx, group);
                    }
                }
                match else_clause {
                    Some(else_expr) => self.eval_expr(else_expr, ctx, group),
                    None => Ok(Value::Null),
                }
            }

            Expr::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                if self.eval_expr(condition, ctx, group)?.is_truthy() {
                    self.eval_expr(then_expr, ctx, group)
                } else {
                    self.eval_expr(else_expr, ctx, group)
                }
            }

            Expr::Cast { expr, data_type } => {
                let value = self.eval_expr(expr, ctx, group)?;
                let ty = Ty::from_data_type(data_type)?;
                value.cast(&ty)
            }

            Expr::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval_expr(item, ctx, group))
                    .collect::<Result<Vec<_>>>()?;
                let elem = items
                    .iter()
                    .find(|v| !v.is_null())
                    .map_or(Ty::Nothing, Value::ty);
                Ok(Value::Array { elem, items })
            }

            Expr::Tuple(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval_expr(item, ctx, group))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Tuple(items))
            }

            Expr::Index { base, index } => {
                let base = self.eval_expr(base, ctx, group)?;
                let index = self.eval_expr(index, ctx, group)?;
                Self::eval_index(&base, &index)
            }

            Expr::Member { base, name } => {
                let base = self.eval_expr(base, ctx, group)?;
                Self::eval_member(&base, name)
            }

            Expr::Subquery(stmt) => {
                let result = self.execute_subquery(stmt, ctx)?;
                Ok(result
                    .rows
                    .first()
                    .and_then(|row| row.first())
                    .cloned()
                    .unwrap_or(Value::Null))
            }

            Expr::Exists(stmt) => {
                let result = self.execute_subquery(stmt, ctx)?;
                Ok(Value::Bool(!result.rows.is_empty()))
            }

            Expr::Function(call) => self.eval_function(call, ctx, group),

            Expr::Window { .. } => Err(EngineError::type_error(
                "window functions are only allowed in the SELECT projection",
            )),

            Expr::Star { .. } => Err(EngineError::type_error(
                "'*' is only allowed in the SELECT projection and in count(*)",
            )),

            Expr::Lambda { .. } => Err(EngineError::not_implemented(
                "lambdas outside higher-order function arguments",
            )),

            Expr::Parameter(_) => Err(EngineError::not_implemented(
                "query parameter binding",
            )),
        }
    }

    /// Runs an expression-level subquery with the current row visible
    /// as an outer context, so correlated references resolve.
    fn execute_subquery(
        &mut self,
        stmt: &rowhouse_sql::ast::Statement,
        ctx: &RowContext,
    ) -> Result<crate::result::QueryResult> {
        self.outer.push(ctx.clone());
        let result = self.execute(stmt);
        self.outer.pop();
        result
    }

    /// Resolves a (possibly qualified) column reference, falling back
    /// through enclosing subquery contexts.
    fn resolve_column(
        &self,
        ctx: &RowContext,
        table: Option<&str>,
        name: &str,
    ) -> Result<Value> {
        let lookup = |scope: &RowContext| match table {
            Some(table) => scope.get_qualified(table, name).cloned(),
            None => scope.get(name).cloned(),
        };
        if let Some(value) = lookup(ctx) {
            return Ok(value);
        }
        for scope in self.outer.iter().rev() {
            if let Some(value) = lookup(scope) {
                return Ok(value);
            }
        }
        Err(EngineError::UnknownColumn(match table {
            Some(table) => format!("{table}.{name}"),
            None => String::from(name),
        }))
    }

    /// Evaluates a function call: higher-order builtins first, then the
    /// registry (aggregates in grouped mode drive the state machinery;
    /// outside a group they run through the one-value shim).
    fn eval_function(
        &mut self,
        call: &FunctionCall,
        ctx: &RowContext,
        group: Option<&[RowContext]>,
    ) -> Result<Value> {
        // arrayMap/arrayFilter take lambdas, which never cross the
        // registry's value-only contract.
        let lowered = call.name.to_lowercase();
        if lowered == "arraymap" || lowered == "arrayfilter" {
            return self.eval_higher_order(&lowered, call, ctx, group);
        }

        let registry = self.registry;
        match registry.get(&call.name) {
            Some(Function::Aggregate(agg)) => match group {
                Some(rows) => self.eval_aggregate_over(agg, call, rows),
                None => {
                    let args = self.eval_args(&call.args, ctx, None)?;
                    agg.execute_scalar(&args)
                }
            },
            Some(Function::Scalar(scalar)) => {
                let args = self.eval_args(&call.args, ctx, group)?;
                scalar.execute(&args, call.distinct)
            }
            None => Err(EngineError::UnknownFunction(call.name.clone())),
        }
    }

    /// Evaluates plain (non-star, non-lambda) argument expressions.
    fn eval_args(
        &mut self,
        args: &[Expr],
        ctx: &RowContext,
        group: Option<&[RowContext]>,
    ) -> Result<Vec<Value>> {
        args.iter()
            .map(|arg| self.eval_expr(arg, ctx, group))
            .collect()
    }

    /// Drives an aggregate over a group: create state, accumulate each
    /// row (honoring DISTINCT on the first argument), finalize.
    pub(crate) fn eval_aggregate_over(
        &mut self,
        agg: &crate::functions::AggregateFunction,
        call: &FunctionCall,
        rows: &[RowContext],
    ) -> Result<Value> {
        // count(*) carries a star argument that means "count rows".
        let arg_exprs: &[Expr] =
            if call.args.len() == 1 && matches!(call.args[0], Expr::Star { .. }) {
                &[]
            } else {
                &call.args
            };
        agg.check_arity(arg_exprs.len())?;

        let mut state = agg.create_state();
        let mut seen = HashSet::new();
        for row in rows {
            let args = self.eval_args(arg_exprs, row, None)?;
            if call.distinct {
                if let Some(first) = args.first() {
                    if !seen.insert(first.group_key()) {
                        continue;
                    }
                }
            }
            state.accumulate(&args)?;
        }
        state.finalize()
    }

    /// `arrayMap(lambda, arrays...)` / `arrayFilter(lambda, arrays...)`.
    fn eval_higher_order(
        &mut self,
        name: &str,
        call: &FunctionCall,
        ctx: &RowContext,
        group: Option<&[RowContext]>,
    ) -> Result<Value> {
        let Some((Expr::Lambda { params, body }, rest)) = call.args.split_first() else {
            return Err(EngineError::type_error(format!(
                "{name} expects a lambda as its first argument"
            )));
        };
        if rest.len() != params.len() || rest.is_empty() {
            return Err(EngineError::Arity {
                name: String::from(name),
                expected: format!("a lambda plus {} array(s)", params.len().max(1)),
                actual: call.args.len(),
            });
        }

        let mut arrays = Vec::with_capacity(rest.len());
        for arg in rest {
            match self.eval_expr(arg, ctx, group)? {
                Value::Null => return Ok(Value::Null),
                Value::Array { items, .. } => arrays.push(items),
                other => {
                    return Err(EngineError::type_error(format!(
                        "{name} expects arrays, got {}",
                        other.ty()
                    )))
                }
            }
        }

        let len = arrays.iter().map(Vec::len).max().unwrap_or(0);
        let mut mapped = Vec::with_capacity(len);
        for i in 0..len {
            let mut lambda_ctx = ctx.clone();
            for (param, array) in params.iter().zip(arrays.iter()) {
                lambda_ctx.insert(
                    param.clone(),
                    array.get(i).cloned().unwrap_or(Value::Null),
                );
            }
            mapped.push(self.eval_expr(body, &lambda_ctx, None)?);
        }

        if name == "arraymap" {
            let elem = mapped
                .iter()
                .find(|v| !v.is_null())
                .map_or(Ty::Nothing, Value::ty);
            return Ok(Value::Array {
                elem,
                items: mapped,
            });
        }

        // arrayFilter keeps elements of the first array.
        let first = &arrays[0];
        let items: Vec<Value> = first
            .iter()
            .zip(mapped.iter())
            .filter(|(_, keep)| keep.is_truthy())
            .map(|(v, _)| v.clone())
            .collect();
        let elem = items
            .iter()
            .find(|v| !v.is_null())
            .map_or(Ty::Nothing, Value::ty);
        Ok(Value::Array { elem, items })
    }

    /// Applies a binary operator to two evaluated operands.
    fn eval_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
        match op {
            BinaryOp::And => {
                let l_false = !lhs.is_null() && !lhs.is_truthy();
                let r_false = !rhs.is_null() && !rhs.is_truthy();
                if l_false || r_false {
                    return Ok(Value::Bool(false));
                }
                if lhs.is_null() || rhs.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Bool(true))
            }
            BinaryOp::Or => {
                if lhs.is_truthy() || rhs.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                if lhs.is_null() || rhs.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Bool(false))
            }

            _ if lhs.is_null() || rhs.is_null() => Ok(Value::Null),

            BinaryOp::Eq | BinaryOp::NotEq => {
                let equal = if matches!(lhs, Value::Map(_)) || matches!(rhs, Value::Map(_)) {
                    lhs.equals(rhs)
                } else {
                    lhs.compare(rhs)? == std::cmp::Ordering::Equal
                };
                Ok(Value::Bool(equal == (op == BinaryOp::Eq)))
            }
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let ordering = lhs.compare(rhs)?;
                let result = match op {
                    BinaryOp::Lt => ordering == std::cmp::Ordering::Less,
                    BinaryOp::LtEq => ordering != std::cmp::Ordering::Greater,
                    BinaryOp::Gt => ordering == std::cmp::Ordering::Greater,
                    _ => ordering != std::cmp::Ordering::Less,
                };
                Ok(Value::Bool(result))
            }

            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                Self::eval_arithmetic(op, lhs, rhs)
            }

            BinaryOp::Concat => {
                let mut out = match lhs.as_str() {
                    Some(s) => String::from(s),
                    None => lhs.to_string(),
                };
                match rhs.as_str() {
                    Some(s) => out.push_str(s),
                    None => out.push_str(&rhs.to_string()),
                }
                Ok(Value::String(out))
            }

            BinaryOp::Like | BinaryOp::ILike => {
                let text = lhs.as_str().ok_or_else(|| {
                    EngineError::type_error(format!(
                        "LIKE expects a string, got {}",
                        lhs.ty()
                    ))
                })?;
                let pattern = rhs.as_str().ok_or_else(|| {
                    EngineError::type_error(format!(
                        "LIKE pattern must be a string, got {}",
                        rhs.ty()
                    ))
                })?;
                let re = like_to_regex(pattern, op == BinaryOp::ILike)?;
                Ok(Value::Bool(re.is_match(text)))
            }
        }
    }

    /// Numeric arithmetic. Integer kinds stay integral for `+ - * %`;
    /// division always goes through 64-bit floats.
    fn eval_arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
        let type_err = || {
            EngineError::type_error(format!(
                "operator '{}' expects numbers, got {} and {}",
                op.as_str(),
                lhs.ty(),
                rhs.ty()
            ))
        };

        if op == BinaryOp::Div {
            let (l, r) = (
                lhs.as_f64().ok_or_else(type_err)?,
                rhs.as_f64().ok_or_else(type_err)?,
            );
            return Ok(Value::Float64(l / r));
        }

        if let (Some(l), Some(r)) = (lhs.as_i128(), rhs.as_i128()) {
            let result = match op {
                BinaryOp::Add => l.checked_add(r),
                BinaryOp::Sub => l.checked_sub(r),
                BinaryOp::Mul => l.checked_mul(r),
                BinaryOp::Mod => {
                    if r == 0 {
                        return Err(EngineError::conversion("modulo by zero"));
                    }
                    l.checked_rem(r)
                }
                _ => None,
            };
            return match result.map(i64::try_from) {
                Some(Ok(n)) => Ok(Value::Int64(n)),
                // Out of the 64-bit range: fall back to floats.
                #[allow(clippy::cast_precision_loss)]
                Some(Err(_)) => Ok(Value::Float64(result.unwrap_or_default() as f64)),
                None => Err(EngineError::conversion("integer arithmetic overflow")),
            };
        }

        let (l, r) = (
            lhs.as_f64().ok_or_else(type_err)?,
            rhs.as_f64().ok_or_else(type_err)?,
        );
        let value = match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            _ => l % r,
        };
        Ok(Value::Float64(value))
    }

    /// Applies a unary operator.
    fn eval_unary(op: UnaryOp, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
            UnaryOp::Neg => match value {
                Value::Float32(v) => Ok(Value::Float32(-v)),
                Value::Float64(v) => Ok(Value::Float64(-v)),
                Value::Decimal {
                    mantissa,
                    precision,
                    scale,
                } => Ok(Value::Decimal {
                    mantissa: -mantissa,
                    precision: *precision,
                    scale: *scale,
                }),
                other => {
                    let n = other.as_i128().ok_or_else(|| {
                        EngineError::type_error(format!(
                            "cannot negate {}",
                            other.ty()
                        ))
                    })?;
                    i64::try_from(-n).map(Value::Int64).map_err(|_| {
                        EngineError::conversion("negation overflows Int64")
                    })
                }
            },
        }
    }

    /// `base[index]`: arrays are 1-indexed and yield NULL out of bounds;
    /// maps look up by key equality; tuples index positionally.
    fn eval_index(base: &Value, index: &Value) -> Result<Value> {
        match base {
            Value::Null => Ok(Value::Null),
            Value::Array { items, .. } | Value::Tuple(items) => {
                if index.is_null() {
                    return Ok(Value::Null);
                }
                let i = index.as_i128().ok_or_else(|| {
                    EngineError::type_error(format!(
                        "index must be an integer, got {}",
                        index.ty()
                    ))
                })?;
                if i < 1 {
                    return Ok(Value::Null);
                }
                let i = usize::try_from(i - 1).map_err(|_| {
                    EngineError::conversion("index is out of addressable range")
                })?;
                Ok(items.get(i).cloned().unwrap_or(Value::Null))
            }
            Value::Map(entries) => Ok(entries
                .iter()
                .find(|(k, _)| k.equals(index))
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null)),
            other => Err(EngineError::type_error(format!(
                "cannot index into {}",
                other.ty()
            ))),
        }
    }

    /// `base.name`: positional tuple access or map lookup by string key.
    fn eval_member(base: &Value, name: &str) -> Result<Value> {
        match base {
            Value::Null => Ok(Value::Null),
            Value::Tuple(items) => match name.parse::<usize>() {
                Ok(position) if position >= 1 => {
                    Ok(items.get(position - 1).cloned().unwrap_or(Value::Null))
                }
                _ => Err(EngineError::type_error(format!(
                    "tuple member '{name}' must be a 1-based position"
                ))),
            },
            Value::Map(entries) => {
                let key = Value::String(String::from(name));
                Ok(entries
                    .iter()
                    .find(|(k, _)| k.equals(&key))
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Null))
            }
            other => Err(EngineError::type_error(format!(
                "cannot access member '{name}' of {}",
                other.ty()
            ))),
        }
    }
}
