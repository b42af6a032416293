//! The SELECT pipeline: FROM materialization, WHERE, grouping,
//! windows, DISTINCT, ORDER BY, LIMIT/OFFSET, and projection.

use std::collections::HashSet;

use indexmap::IndexMap;
use itertools::Itertools;
use rowhouse_sql::ast::{
    Expr, FunctionCall, OrderByExpr, OrderDirection, SelectStatement, TableRef,
};
use tracing::debug;

use super::Executor;
use crate::error::{EngineError, Result};
use crate::functions::FunctionRegistry;
use crate::result::{QueryResult, ResultColumn};
use crate::row::RowContext;
use crate::types::Ty;
use crate::value::Value;

/// Separator for multi-expression grouping keys; cannot occur in any
/// value's textual form.
const KEY_SEPARATOR: &str = "\u{0}";

/// True if the expression contains an aggregate call outside of window
/// specs and subqueries.
pub(super) fn contains_aggregate(expr: &Expr, registry: &FunctionRegistry) -> bool {
    match expr {
        Expr::Function(call) => {
            registry.is_aggregate(&call.name)
                || call
                    .args
                    .iter()
                    .any(|arg| contains_aggregate(arg, registry))
        }
        Expr::Aliased { expr, .. }
        | Expr::Unary { operand: expr, .. }
        | Expr::Cast { expr, .. }
        | Expr::IsNull { expr, .. }
        | Expr::Member { base: expr, .. } => contains_aggregate(expr, registry),
        Expr::Binary { left, right, .. } => {
            contains_aggregate(left, registry) || contains_aggregate(right, registry)
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            contains_aggregate(expr, registry)
                || contains_aggregate(low, registry)
                || contains_aggregate(high, registry)
        }
        Expr::In { expr, list, .. } => {
            contains_aggregate(expr, registry)
                || match list {
                    rowhouse_sql::ast::InList::Values(items) => {
                        items.iter().any(|item| contains_aggregate(item, registry))
                    }
                    rowhouse_sql::ast::InList::Subquery(_) => false,
                }
        }
        Expr::Case {
            operand,
            when_clauses,
            else_clause,
        } => {
            operand
                .as_deref()
                .is_some_and(|op| contains_aggregate(op, registry))
                || when_clauses.iter().any(|(w, t)| {
                    contains_aggregate(w, registry) || contains_aggregate(t, registry)
                })
                || else_clause
                    .as_deref()
                    .is_some_and(|e| contains_aggregate(e, registry))
        }
        Expr::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            contains_aggregate(condition, registry)
                || contains_aggregate(then_expr, registry)
                || contains_aggregate(else_expr, registry)
        }
        Expr::Array(items) | Expr::Tuple(items) => {
            items.iter().any(|item| contains_aggregate(item, registry))
        }
        Expr::Index { base, index } => {
            contains_aggregate(base, registry) || contains_aggregate(index, registry)
        }
        // Window calls are precomputed by their own pass; subqueries own
        // their aggregates.
        _ => false,
    }
}

impl Executor<'_> {
    /// Runs a SELECT: registers its CTEs, executes the body, and removes
    /// the CTEs again on both success and failure.
    pub(crate) fn execute_select(&mut self, select: &SelectStatement) -> Result<QueryResult> {
        let mut registered: Vec<(String, Option<QueryResult>)> = Vec::new();
        let mut setup_error = None;

        for cte in &select.ctes {
            match self.execute(&cte.query).and_then(|result| {
                apply_cte_columns(result, &cte.columns, &cte.name)
            }) {
                Ok(result) => {
                    let key = cte.name.to_lowercase();
                    let previous = self.ctes.insert(key.clone(), result);
                    registered.push((key, previous));
                }
                Err(e) => {
                    setup_error = Some(e);
                    break;
                }
            }
        }

        let result = match setup_error {
            Some(e) => Err(e),
            None => self.execute_select_body(select),
        };

        for (key, previous) in registered.into_iter().rev() {
            match previous {
                Some(prev) => {
                    self.ctes.insert(key, prev);
                }
                None => {
                    self.ctes.remove(&key);
                }
            }
        }

        result
    }

    #[allow(clippy::too_many_lines)]
    fn execute_select_body(&mut self, select: &SelectStatement) -> Result<QueryResult> {
        let (mut rows, template) = match &select.from {
            Some(table_ref) => self.from_rows(table_ref)?,
            None => (vec![RowContext::new()], RowContext::new()),
        };
        debug!(rows = rows.len(), "materialized FROM");

        if let Some(predicate) = &select.where_clause {
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                if self.eval_expr(predicate, &row, None)?.is_truthy() {
                    kept.push(row);
                }
            }
            rows = kept;
        }

        if !select.group_by.is_empty() {
            return self.execute_group_by(select, rows, &template);
        }

        let registry = self.registry;
        if select
            .projection
            .iter()
            .any(|p| contains_aggregate(p, registry))
        {
            return self.execute_global_aggregate(select, &rows, &template);
        }

        // Window pass: rewrites window calls into reserved slot reads.
        let projection = self.apply_windows(&select.projection, &mut rows)?;

        let expanded = expand_projection(&projection, &template);

        if select.distinct {
            let mut seen = HashSet::new();
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                let key = self.projection_key(&expanded, &row)?;
                if seen.insert(key) {
                    kept.push(row);
                }
            }
            rows = kept;
        }

        if !select.order_by.is_empty() {
            let order = resolve_order_aliases(&select.order_by, &projection);
            let mut keyed = Vec::with_capacity(rows.len());
            for row in rows {
                let mut key = Vec::with_capacity(order.len());
                for item in &order {
                    key.push(self.eval_expr(&item.expr, &row, None)?);
                }
                keyed.push((key, row));
            }
            sort_by_keys(&mut keyed, &order)?;
            rows = keyed.into_iter().map(|(_, row)| row).collect();
        }

        let rows = self.apply_limit_offset(rows, select)?;

        let mut out_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut out = Vec::with_capacity(expanded.len());
            for (_, expr) in &expanded {
                out.push(self.eval_expr(expr, row, None)?);
            }
            out_rows.push(out);
        }

        Ok(build_result(&expanded, out_rows))
    }

    /// The GROUP BY branch: partition, aggregate per group, filter by
    /// HAVING, then order and limit the group rows.
    fn execute_group_by(
        &mut self,
        select: &SelectStatement,
        rows: Vec<RowContext>,
        template: &RowContext,
    ) -> Result<QueryResult> {
        let mut groups: IndexMap<String, Vec<RowContext>> = IndexMap::new();
        for row in rows {
            let mut parts = Vec::with_capacity(select.group_by.len());
            for expr in &select.group_by {
                parts.push(self.eval_expr(expr, &row, None)?.group_key());
            }
            groups
                .entry(parts.iter().join(KEY_SEPARATOR))
                .or_default()
                .push(row);
        }
        debug!(groups = groups.len(), "partitioned for GROUP BY");

        let expanded = expand_projection(&select.projection, template);

        struct GroupOut {
            representative: RowContext,
            members: Vec<RowContext>,
            values: Vec<Value>,
        }

        let mut outputs = Vec::with_capacity(groups.len());
        for (_, members) in groups {
            let representative = members[0].clone();

            if let Some(having) = &select.having {
                let keep = self
                    .eval_expr(having, &representative, Some(&members))?
                    .is_truthy();
                if !keep {
                    continue;
                }
            }

            let mut values = Vec::with_capacity(expanded.len());
            for (_, expr) in &expanded {
                values.push(self.eval_expr(expr, &representative, Some(&members))?);
            }
            outputs.push(GroupOut {
                representative,
                members,
                values,
            });
        }

        if !select.order_by.is_empty() {
            let order = resolve_order_aliases(&select.order_by, &select.projection);
            let mut keyed = Vec::with_capacity(outputs.len());
            for group in outputs {
                let mut key = Vec::with_capacity(order.len());
                for item in &order {
                    key.push(self.eval_expr(
                        &item.expr,
                        &group.representative,
                        Some(&group.members),
                    )?);
                }
                keyed.push((key, group));
            }
            sort_by_keys(&mut keyed, &order)?;
            outputs = keyed.into_iter().map(|(_, group)| group).collect();
        }

        let outputs = self.apply_limit_offset(outputs, select)?;
        let out_rows = outputs.into_iter().map(|g| g.values).collect();
        Ok(build_result(&expanded, out_rows))
    }

    /// Aggregates without GROUP BY collapse the filtered set into a
    /// single row.
    fn execute_global_aggregate(
        &mut self,
        select: &SelectStatement,
        rows: &[RowContext],
        template: &RowContext,
    ) -> Result<QueryResult> {
        let representative = rows.first().cloned().unwrap_or_default();
        let expanded = expand_projection(&select.projection, template);

        let mut values = Vec::with_capacity(expanded.len());
        for (_, expr) in &expanded {
            values.push(self.eval_expr(expr, &representative, Some(rows))?);
        }
        Ok(build_result(&expanded, vec![values]))
    }

    /// DISTINCT deduplication key over the projected expressions.
    fn projection_key(
        &mut self,
        expanded: &[(String, Expr)],
        row: &RowContext,
    ) -> Result<String> {
        let mut parts = Vec::with_capacity(expanded.len());
        for (_, expr) in expanded {
            parts.push(self.eval_expr(expr, row, None)?.group_key());
        }
        Ok(parts.iter().join(KEY_SEPARATOR))
    }

    /// Evaluates LIMIT/OFFSET expressions and applies them.
    fn apply_limit_offset<T>(&mut self, rows: Vec<T>, select: &SelectStatement) -> Result<Vec<T>> {
        let offset = match &select.offset {
            Some(expr) => self.eval_count(expr, "OFFSET")?,
            None => 0,
        };
        let limit = match &select.limit {
            Some(expr) => Some(self.eval_count(expr, "LIMIT")?),
            None => None,
        };
        let iter = rows.into_iter().skip(offset);
        Ok(match limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        })
    }

    fn eval_count(&mut self, expr: &Expr, clause: &str) -> Result<usize> {
        let value = self.eval_expr(expr, &RowContext::new(), None)?;
        let n = value.as_i128().ok_or_else(|| {
            EngineError::type_error(format!("{clause} expects an integer, got {}", value.ty()))
        })?;
        usize::try_from(n.max(0)).map_err(|_| {
            EngineError::type_error(format!("{clause} value {n} is out of range"))
        })
    }

    // --- FROM construction ---

    /// Materializes a table reference into row contexts plus a template
    /// context carrying the visible column names (for star expansion on
    /// empty sources).
    pub(super) fn from_rows(
        &mut self,
        table_ref: &TableRef,
    ) -> Result<(Vec<RowContext>, RowContext)> {
        match table_ref {
            TableRef::Table { name, alias } => {
                let alias = alias.as_deref().unwrap_or(name);
                if let Some(cte) = self.ctes.get(&name.to_lowercase()) {
                    let cte = cte.clone();
                    return Ok(Self::result_rows(&cte, alias));
                }
                let table = self.catalog.expect(name)?;
                let columns: Vec<String> =
                    table.columns.iter().map(|c| c.name.clone()).collect();
                let data = table.rows.clone();

                let mut template = RowContext::new();
                for column in &columns {
                    template.insert_qualified(alias, column.clone(), Value::Null);
                }
                let rows = data
                    .into_iter()
                    .map(|row| {
                        let mut ctx = RowContext::new();
                        for (column, value) in columns.iter().zip(row) {
                            ctx.insert_qualified(alias, column.clone(), value);
                        }
                        ctx
                    })
                    .collect();
                Ok((rows, template))
            }

            TableRef::Subquery { query, alias } => {
                let result = self.execute(query)?;
                Ok(Self::result_rows(&result, alias))
            }

            TableRef::TableFunction { name, args, alias } => {
                let empty = RowContext::new();
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.eval_expr(arg, &empty, None)?);
                }
                let result = super::table_func::invoke(name, &evaluated)?;
                Ok(Self::result_rows(&result, alias.as_deref().unwrap_or(name)))
            }

            TableRef::Join {
                left,
                kind,
                right,
                on,
                using,
            } => {
                let (left_rows, left_template) = self.from_rows(left)?;
                let (right_rows, right_template) = self.from_rows(right)?;
                self.join_rows(
                    *kind,
                    left_rows,
                    left_template,
                    right_rows,
                    right_template,
                    on.as_ref(),
                    using,
                )
            }

            TableRef::ArrayJoin { left, exprs } => {
                let (rows, mut template) = self.from_rows(left)?;
                let bindings = array_join_bindings(exprs)?;
                for (name, _) in &bindings {
                    template.insert(name.clone(), Value::Null);
                }

                let mut out = Vec::new();
                for row in rows {
                    let mut arrays = Vec::with_capacity(bindings.len());
                    for (_, expr) in &bindings {
                        match self.eval_expr(expr, &row, None)? {
                            Value::Array { items, .. } => arrays.push(items),
                            Value::Null => arrays.push(Vec::new()),
                            other => {
                                return Err(EngineError::type_error(format!(
                                    "ARRAY JOIN expects an array, got {}",
                                    other.ty()
                                )))
                            }
                        }
                    }
                    let len = arrays.iter().map(Vec::len).max().unwrap_or(0);
                    for i in 0..len {
                        let mut ctx = row.clone();
                        for ((name, _), array) in bindings.iter().zip(arrays.iter()) {
                            ctx.insert(
                                name.clone(),
                                array.get(i).cloned().unwrap_or(Value::Null),
                            );
                        }
                        out.push(ctx);
                    }
                }
                Ok((out, template))
            }
        }
    }

    /// Projects a query result's rows under a table alias.
    fn result_rows(result: &QueryResult, alias: &str) -> (Vec<RowContext>, RowContext) {
        let mut template = RowContext::new();
        for column in &result.columns {
            template.insert_qualified(alias, column.name.clone(), Value::Null);
        }
        let rows = result
            .rows
            .iter()
            .map(|row| {
                let mut ctx = RowContext::new();
                for (column, value) in result.columns.iter().zip(row) {
                    ctx.insert_qualified(alias, column.name.clone(), value.clone());
                }
                ctx
            })
            .collect();
        (rows, template)
    }
}

/// Renames a CTE result to its declared column list, if any.
fn apply_cte_columns(
    mut result: QueryResult,
    columns: &[String],
    cte_name: &str,
) -> Result<QueryResult> {
    if columns.is_empty() {
        return Ok(result);
    }
    if columns.len() != result.columns.len() {
        return Err(EngineError::type_error(format!(
            "CTE '{cte_name}' declares {} columns but produces {}",
            columns.len(),
            result.columns.len()
        )));
    }
    for (column, name) in result.columns.iter_mut().zip(columns) {
        column.name = name.clone();
    }
    Ok(result)
}

/// ARRAY JOIN items must be aliased or be plain columns.
fn array_join_bindings(exprs: &[Expr]) -> Result<Vec<(String, Expr)>> {
    exprs
        .iter()
        .map(|expr| match expr {
            Expr::Aliased { expr, alias } => Ok((alias.clone(), (**expr).clone())),
            Expr::Column { name, .. } => Ok((name.clone(), expr.clone())),
            other => Err(EngineError::type_error(format!(
                "ARRAY JOIN item needs an alias: {other:?}"
            ))),
        })
        .collect()
}

/// Expands `*` and `t.*` against the template context and names every
/// output column.
pub(super) fn expand_projection(
    projection: &[Expr],
    template: &RowContext,
) -> Vec<(String, Expr)> {
    let mut out = Vec::with_capacity(projection.len());
    for (position, item) in projection.iter().enumerate() {
        match item.unaliased() {
            Expr::Star { table: None } => {
                for name in template.column_names() {
                    out.push((
                        name.clone(),
                        Expr::Column {
                            table: None,
                            name,
                        },
                    ));
                }
            }
            Expr::Star { table: Some(table) } => {
                for name in template.columns_of(table) {
                    out.push((
                        name.clone(),
                        Expr::Column {
                            table: Some(table.clone()),
                            name,
                        },
                    ));
                }
            }
            _ => out.push((output_name(item, position), item.clone())),
        }
    }
    out
}

/// Output naming: AS alias, column full-name, function name, fallback.
fn output_name(expr: &Expr, position: usize) -> String {
    if let Some(alias) = expr.alias() {
        return String::from(alias);
    }
    match expr.unaliased() {
        Expr::Column { table: None, name } => name.clone(),
        Expr::Column {
            table: Some(table),
            name,
        } => format!("{table}.{name}"),
        Expr::Function(FunctionCall { name, .. })
        | Expr::Window {
            call: FunctionCall { name, .. },
            ..
        } => name.clone(),
        _ => format!("column_{}", position + 1),
    }
}

/// Replaces bare identifiers that match projection aliases with the
/// aliased expressions.
fn resolve_order_aliases(order_by: &[OrderByExpr], projection: &[Expr]) -> Vec<OrderByExpr> {
    order_by
        .iter()
        .map(|item| {
            if let Expr::Column { table: None, name } = &item.expr {
                for proj in projection {
                    if proj.alias() == Some(name.as_str()) {
                        return OrderByExpr {
                            expr: proj.unaliased().clone(),
                            direction: item.direction,
                            nulls: item.nulls,
                        };
                    }
                }
            }
            item.clone()
        })
        .collect()
}

/// Stable-sorts `(key, payload)` pairs by the precomputed ORDER BY keys.
/// NULL sorts strictly first regardless of direction.
fn sort_by_keys<T>(rows: &mut [(Vec<Value>, T)], order: &[OrderByExpr]) -> Result<()> {
    let mut first_error: Option<EngineError> = None;
    rows.sort_by(|(a, _), (b, _)| {
        for (i, item) in order.iter().enumerate() {
            let (x, y) = (&a[i], &b[i]);
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

/// Builds the result schema from the first output row's value types.
fn build_result(expanded: &[(String, Expr)], rows: Vec<Vec<Value>>) -> QueryResult {
    let columns = expanded
        .iter()
        .enumerate()
        .map(|(i, (name, _))| ResultColumn {
            name: name.clone(),
            ty: rows
                .first()
                .and_then(|row| row.get(i))
                .map_or(Ty::Nothing, Value::ty),
        })
        .collect();
    QueryResult {
        columns,
        rows,
        affected: 0,
    }
}
