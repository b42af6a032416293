//! Window-function evaluation.
//!
//! Before the later SELECT stages run, window calls in the projection
//! are rewritten into reads of reserved `__window_<n>` row-context
//! slots (flat left-to-right index); this pass then fills those slots,
//! partition by partition.

use indexmap::IndexMap;
use itertools::Itertools;
use rowhouse_sql::ast::{
    Expr, FrameBound, FunctionCall, OrderByExpr, OrderDirection, WindowFrame, WindowSpec,
};

use super::Executor;
use crate::error::{EngineError, Result};
use crate::row::RowContext;
use crate::value::Value;

/// A window call lifted out of the projection.
struct LiftedWindow {
    call: FunctionCall,
    spec: WindowSpec,
}

/// Rewrites window calls to slot reads, collecting them in order.
fn rewrite(expr: &Expr, windows: &mut Vec<LiftedWindow>) -> Expr {
    match expr {
        Expr::Window { call, spec } => {
            let slot = windows.len();
            windows.push(LiftedWindow {
                call: call.clone(),
                spec: spec.clone(),
            });
            Expr::Column {
                table: None,
                name: format!("__window_{slot}"),
            }
        }
        Expr::Aliased { expr, alias } => Expr::Aliased {
            expr: Box::new(rewrite(expr, windows)),
            alias: alias.clone(),
        },
        Expr::Binary { left, op, right } => Expr::Binary {
            left: Box::new(rewrite(left, windows)),
            op: *op,
            right: Box::new(rewrite(right, windows)),
        },
        Expr::Unary { op, operand } => Expr::Unary {
            op: *op,
            operand: Box::new(rewrite(operand, windows)),
        },
        Expr::Cast { expr, data_type } => Expr::Cast {
            expr: Box::new(rewrite(expr, windows)),
            data_type: data_type.clone(),
        },
        Expr::Function(call) => Expr::Function(FunctionCall {
            name: call.name.clone(),
            args: call.args.iter().map(|a| rewrite(a, windows)).collect(),
            distinct: call.distinct,
        }),
        Expr::Conditional {
            condition,
            then_expr,
            else_expr,
        } => Expr::Conditional {
            condition: Box::new(rewrite(condition, windows)),
            then_expr: Box::new(rewrite(then_expr, windows)),
            else_expr: Box::new(rewrite(else_expr, windows)),
        },
        other => other.clone(),
    }
}

impl Executor<'_> {
    /// Rewrites the projection and precomputes every window expression
    /// into its reserved slot on each row.
    pub(super) fn apply_windows(
        &mut self,
        projection: &[Expr],
        rows: &mut Vec<RowContext>,
    ) -> Result<Vec<Expr>> {
        let mut windows = Vec::new();
        let rewritten: Vec<Expr> = projection
            .iter()
            .map(|expr| rewrite(expr, &mut windows))
            .collect();

        for (slot, window) in windows.iter().enumerate() {
            self.compute_window(slot, window, rows)?;
        }
        Ok(rewritten)
    }

    /// Fills `__window_<slot>` for one window expression.
    fn compute_window(
        &mut self,
        slot: usize,
        window: &LiftedWindow,
        rows: &mut Vec<RowContext>,
    ) -> Result<()> {
        // Partition by the stringified PARTITION BY key.
        let mut partitions: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, row) in rows.iter().enumerate() {
            let mut parts = Vec::with_capacity(window.spec.partition_by.len());
            for expr in &window.spec.partition_by {
                parts.push(self.eval_expr(expr, row, None)?.group_key());
            }
            partitions
                .entry(parts.iter().join("\u{0}"))
                .or_default()
                .push(index);
        }

        let slot_name = format!("__window_{slot}");
        for (_, mut member_indices) in partitions {
            self.sort_partition(&mut member_indices, rows, &window.spec.order_by)?;
            let outputs = self.window_outputs(window, &member_indices, rows)?;
            for (position, value) in member_indices.iter().zip(outputs) {
                rows[*position].insert(slot_name.clone(), value);
            }
        }
        Ok(())
    }

    /// Stable-sorts partition members by the window's ORDER BY.
    fn sort_partition(
        &mut self,
        members: &mut [usize],
        rows: &[RowContext],
        order_by: &[OrderByExpr],
    ) -> Result<()> {
        if order_by.is_empty() {
            return Ok(());
        }
        let mut keys: IndexMap<usize, Vec<Value>> = IndexMap::new();
        for &index in members.iter() {
            let mut key = Vec::with_capacity(order_by.len());
            for item in order_by {
                key.push(self.eval_expr(&item.expr, &rows[index], None)?);
            }
            keys.insert(index, key);
        }

        let mut first_error: Option<EngineError> = None;
        members.sort_by(|a, b| {
            let (ka, kb) = (&keys[a], &keys[b]);
            for (i, item) in order_by.iter().enumerate() {
                let (x, y) = (&ka[i], &kb[i]);
                let ordering = match (x.is_null(), y.is_null()) {
                    (true, true) => std::cmp::Ordering::Equal,
                    (true, false) => std::cmp::Ordering::Less,
                    (false, true) => std::cmp::Ordering::Greater,
                    (false, false) => {
                        let ordering = x.compare(y).unwrap_or_else(|e| {
                            if first_error.is_none() {
                                first_error = Some(e);
                            }
                            std::cmp::Ordering::Equal
                        });
                        if item.direction == OrderDirection::Desc {
                            ordering.reverse()
                        } else {
                            ordering
                        }
                    }
                };
                if ordering != std::cmp::Ordering::Equal {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Computes the window function's output for every partition member
    /// (already sorted).
    #[allow(clippy::too_many_lines)]
    fn window_outputs(
        &mut self,
        window: &LiftedWindow,
        members: &[usize],
        rows: &[RowContext],
    ) -> Result<Vec<Value>> {
        let call = &window.call;
        let n = members.len();

        match call.name.to_lowercase().as_str() {
            "row_number" => Ok((1..=n as u64).map(Value::UInt64).collect()),

            "rank" | "dense_rank" => {
                let dense = call.name.eq_ignore_ascii_case("dense_rank");
                // Keyed on the first ORDER BY expression's value.
                let keys = match window.spec.order_by.first() {
                    Some(item) => {
                        let mut keys = Vec::with_capacity(n);
                        for &index in members {
                            keys.push(
                                self.eval_expr(&item.expr, &rows[index], None)?.group_key(),
                            );
                        }
                        keys
                    }
                    None => vec![String::new(); n],
                };
                let mut out = Vec::with_capacity(n);
                let mut rank = 0u64;
                let mut dense_rank = 0u64;
                let mut previous: Option<&str> = None;
                for (i, key) in keys.iter().enumerate() {
                    if previous != Some(key.as_str()) {
                        rank = i as u64 + 1;
                        dense_rank += 1;
                        previous = Some(key.as_str());
                    }
                    out.push(Value::UInt64(if dense { dense_rank } else { rank }));
                }
                Ok(out)
            }

            "ntile" => {
                let first = members.first().map(|&i| &rows[i]);
                let k = match (call.args.first(), first) {
                    (Some(arg), Some(ctx)) => self
                        .eval_expr(arg, ctx, None)?
                        .as_i128()
                        .filter(|k| *k > 0)
                        .ok_or_else(|| {
                            EngineError::type_error("ntile expects a positive integer")
                        })?,
                    _ => 1,
                };
                #[allow(clippy::cast_sign_loss)]
                let k = k as u64;
                Ok((0..n as u64)
                    .map(|i| Value::UInt64(i * k / n as u64 + 1))
                    .collect())
            }

            "lag" | "lead" => {
                let lead = call.name.eq_ignore_ascii_case("lead");
                let Some(value_expr) = call.args.first() else {
                    return Err(EngineError::Arity {
                        name: call.name.clone(),
                        expected: String::from("1 to 3"),
                        actual: 0,
                    });
                };
                let mut out = Vec::with_capacity(n);
                for (i, &index) in members.iter().enumerate() {
                    let ctx = &rows[index];
                    let offset = match call.args.get(1) {
                        Some(arg) => self
                            .eval_expr(arg, ctx, None)?
                            .as_i128()
                            .filter(|v| *v >= 0)
                            .ok_or_else(|| {
                                EngineError::type_error(
                                    "lag/lead offset must be a non-negative integer",
                                )
                            })?,
                        None => 1,
                    };
                    #[allow(clippy::cast_possible_wrap)]
                    let target = if lead {
                        i as i128 + offset
                    } else {
                        i as i128 - offset
                    };
                    let value = if target >= 0 && target < n as i128 {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let target = target as usize;
                        self.eval_expr(value_expr, &rows[members[target]], None)?
                    } else {
                        match call.args.get(2) {
                            Some(default) => self.eval_expr(default, ctx, None)?,
                            None => Value::Null,
                        }
                    };
                    out.push(value);
                }
                Ok(out)
            }

            "first_value" => {
                let Some(value_expr) = call.args.first() else {
                    return Err(EngineError::Arity {
                        name: call.name.clone(),
                        expected: String::from("1"),
                        actual: 0,
                    });
                };
                let value = match members.first() {
                    Some(&first) => self.eval_expr(value_expr, &rows[first], None)?,
                    None => Value::Null,
                };
                Ok(vec![value; n])
            }

            "last_value" => {
                let Some(value_expr) = call.args.first() else {
                    return Err(EngineError::Arity {
                        name: call.name.clone(),
                        expected: String::from("1"),
                        actual: 0,
                    });
                };
                let mut out = Vec::with_capacity(n);
                for i in 0..n {
                    let (_, end) = self.frame_bounds(window.spec.frame.as_ref(), i, n, rows, members)?;
                    out.push(self.eval_expr(value_expr, &rows[members[end]], None)?);
                }
                Ok(out)
            }

            _ => {
                // Any registry aggregate runs over the row frame.
                let registry = self.registry;
                let Some(agg) = registry.get_aggregate(&call.name) else {
                    return Err(EngineError::UnknownFunction(call.name.clone()));
                };
                let mut out = Vec::with_capacity(n);
                for i in 0..n {
                    let (start, end) =
                        self.frame_bounds(window.spec.frame.as_ref(), i, n, rows, members)?;
                    let frame: Vec<RowContext> = members[start..=end]
                        .iter()
                        .map(|&index| rows[index].clone())
                        .collect();
                    out.push(self.eval_aggregate_over(agg, call, &frame)?);
                }
                Ok(out)
            }
        }
    }

    /// Frame `[start, end]` (inclusive positions within the partition)
    /// for the row at position `i`. The default frame runs from the
    /// partition start to the current row. RANGE executes with ROWS
    /// semantics.
    fn frame_bounds(
        &mut self,
        frame: Option<&WindowFrame>,
        i: usize,
        n: usize,
        rows: &[RowContext],
        members: &[usize],
    ) -> Result<(usize, usize)> {
        let Some(frame) = frame else {
            return Ok((0, i));
        };
        let ctx = &rows[members[i]];
        let start = self.bound_position(&frame.start, i, n, ctx)?;
        let end = match &frame.end {
            Some(bound) => self.bound_position(bound, i, n, ctx)?,
            None => i,
        };
        Ok((start.min(n - 1), end.clamp(start, n - 1)))
    }

    fn bound_position(
        &mut self,
        bound: &FrameBound,
        i: usize,
        n: usize,
        ctx: &RowContext,
    ) -> Result<usize> {
        let offset = |expr: &Expr, this: &mut Self| -> Result<usize> {
            let value = this.eval_expr(expr, ctx, None)?;
            value
                .as_i128()
                .filter(|v| *v >= 0)
                .and_then(|v| usize::try_from(v).ok())
                .ok_or_else(|| {
                    EngineError::type_error("frame offset must be a non-negative integer")
                })
        };
        Ok(match bound {
            FrameBound::UnboundedPreceding => 0,
            FrameBound::UnboundedFollowing => n.saturating_sub(1),
            FrameBound::CurrentRow => i,
            FrameBound::Preceding(expr) => i.saturating_sub(offset(expr, self)?),
            FrameBound::Following(expr) => i
                .saturating_add(offset(expr, self)?)
                .min(n.saturating_sub(1)),
        })
    }
}
