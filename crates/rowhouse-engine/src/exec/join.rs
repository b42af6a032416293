//! Nested-loop join combinators.
//!
//! Every combinator materializes both sides fully. A successful pairing
//! clones the left context and merges the right side into the clone, so
//! contexts never alias across rows.

use rowhouse_sql::ast::{Expr, JoinKind};
use tracing::debug;

use super::Executor;
use crate::error::{EngineError, Result};
use crate::row::RowContext;

impl Executor<'_> {
    /// Runs a join and returns the combined rows plus the combined
    /// template context.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn join_rows(
        &mut self,
        kind: JoinKind,
        left: Vec<RowContext>,
        left_template: RowContext,
        right: Vec<RowContext>,
        right_template: RowContext,
        on: Option<&Expr>,
        using: &[String],
    ) -> Result<(Vec<RowContext>, RowContext)> {
        debug!(%kind, left = left.len(), right = right.len(), "joining");

        let mut merged_template = left_template.clone();
        merged_template.merge(&right_template);

        let rows = match kind {
            JoinKind::Cross => {
                let mut out = Vec::with_capacity(left.len() * right.len());
                for l in &left {
                    for r in &right {
                        let mut ctx = l.clone();
                        ctx.merge(r);
                        out.push(ctx);
                    }
                }
                out
            }

            JoinKind::Inner => {
                let mut out = Vec::new();
                for l in &left {
                    for r in &right {
                        if let Some(ctx) = self.try_match(l, r, on, using)? {
                            out.push(ctx);
                        }
                    }
                }
                out
            }

            JoinKind::Left => self.left_join(&left, &right, &right_template, on, using)?,

            // RIGHT is LEFT with the operands swapped.
            JoinKind::Right => self.left_join(&right, &left, &left_template, on, using)?,

            JoinKind::Full => {
                let mut out = self.left_join(&left, &right, &right_template, on, using)?;
                // The unmatched-right residual contributes right-side
                // columns only.
                for r in &right {
                    let mut matched = false;
                    for l in &left {
                        if self.try_match(l, r, on, using)?.is_some() {
                            matched = true;
                            break;
                        }
                    }
                    if !matched {
                        out.push(r.clone());
                    }
                }
                out
            }

            JoinKind::LeftSemi => {
                let mut out = Vec::new();
                for l in &left {
                    for r in &right {
                        if self.try_match(l, r, on, using)?.is_some() {
                            out.push(l.clone());
                            break;
                        }
                    }
                }
                out
            }

            JoinKind::LeftAnti => {
                let mut out = Vec::new();
                for l in &left {
                    let mut matched = false;
                    for r in &right {
                        if self.try_match(l, r, on, using)?.is_some() {
                            matched = true;
                            break;
                        }
                    }
                    if !matched {
                        out.push(l.clone());
                    }
                }
                out
            }

            JoinKind::Asof | JoinKind::RightSemi | JoinKind::RightAnti => {
                return Err(EngineError::not_implemented(format!("{kind}")))
            }
        };

        let template = match kind {
            JoinKind::LeftSemi | JoinKind::LeftAnti => left_template,
            _ => merged_template,
        };
        Ok((rows, template))
    }

    /// Inner join plus a null-extended row for every unmatched left row.
    fn left_join(
        &mut self,
        left: &[RowContext],
        right: &[RowContext],
        right_template: &RowContext,
        on: Option<&Expr>,
        using: &[String],
    ) -> Result<Vec<RowContext>> {
        let mut out = Vec::new();
        for l in left {
            let mut matched = false;
            for r in right {
                if let Some(ctx) = self.try_match(l, r, on, using)? {
                    out.push(ctx);
                    matched = true;
                }
            }
            if !matched {
                out.push(null_extend(l, right_template));
            }
        }
        Ok(out)
    }

    /// Tests one left/right pairing; returns the merged context on match.
    ///
    /// USING compares the named columns on each side's original context,
    /// short-circuiting on the first mismatch. ON evaluates over the
    /// merged context. A join with neither condition always matches.
    fn try_match(
        &mut self,
        l: &RowContext,
        r: &RowContext,
        on: Option<&Expr>,
        using: &[String],
    ) -> Result<Option<RowContext>> {
        if !using.is_empty() {
            for column in using {
                let lv = l.get(column).ok_or_else(|| {
                    EngineError::UnknownColumn(column.clone())
                })?;
                let rv = r.get(column).ok_or_else(|| {
                    EngineError::UnknownColumn(column.clone())
                })?;
                if !lv.equals(rv) {
                    return Ok(None);
                }
            }
            let mut ctx = l.clone();
            ctx.merge(r);
            return Ok(Some(ctx));
        }

        let mut ctx = l.clone();
        ctx.merge(r);
        match on {
            Some(predicate) => {
                if self.eval_expr(predicate, &ctx, None)?.is_truthy() {
                    Ok(Some(ctx))
                } else {
                    Ok(None)
                }
            }
            None => Ok(Some(ctx)),
        }
    }
}

/// Clones a left row and nulls out every column name the right side can
/// contribute.
fn null_extend(left: &RowContext, right_template: &RowContext) -> RowContext {
    let mut ctx = left.clone();
    for (table, column) in right_template.qualified_names() {
        ctx.insert_qualified(table, column, crate::value::Value::Null);
    }
    for column in right_template.column_names() {
        if ctx.get(&column).is_none() {
            ctx.insert(column, crate::value::Value::Null);
        }
    }
    ctx
}
