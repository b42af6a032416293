//! INSERT, UPDATE, DELETE, CREATE TABLE, DROP TABLE.

use rowhouse_sql::ast::{
    CreateTableStatement, DeleteStatement, DropTableStatement, InsertSource, InsertStatement,
    UpdateStatement,
};
use tracing::debug;

use super::Executor;
use crate::catalog::{Column, Table};
use crate::error::{EngineError, Result};
use crate::result::QueryResult;
use crate::row::RowContext;
use crate::types::Ty;
use crate::value::Value;

impl Executor<'_> {
    /// INSERT INTO: casts each value through the target column's type;
    /// missing columns take their DEFAULT expression or the type's
    /// default value.
    pub(crate) fn execute_insert(&mut self, insert: &InsertStatement) -> Result<QueryResult> {
        let table = self.catalog.expect(&insert.table)?;
        let columns = table.columns.clone();

        let targets: Vec<usize> = if insert.columns.is_empty() {
            (0..columns.len()).collect()
        } else {
            insert
                .columns
                .iter()
                .map(|name| {
                    table
                        .column_index(name)
                        .ok_or_else(|| EngineError::UnknownColumn(name.clone()))
                })
                .collect::<Result<_>>()?
        };

        let empty = RowContext::new();
        let source_rows: Vec<Vec<Value>> = match &insert.source {
            InsertSource::Values(rows) => {
                let mut evaluated = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut values = Vec::with_capacity(row.len());
                    for expr in row {
                        values.push(self.eval_expr(expr, &empty, None)?);
                    }
                    evaluated.push(values);
                }
                evaluated
            }
            InsertSource::Select(stmt) => self.execute(stmt)?.rows,
        };

        let mut new_rows = Vec::with_capacity(source_rows.len());
        for values in source_rows {
            if values.len() != targets.len() {
                return Err(EngineError::type_error(format!(
                    "INSERT has {} values but {} target columns",
                    values.len(),
                    targets.len()
                )));
            }

            let mut row: Vec<Option<Value>> = vec![None; columns.len()];
            for (value, &target) in values.into_iter().zip(&targets) {
                row[target] = Some(value.cast(&columns[target].ty)?);
            }

            let mut complete = Vec::with_capacity(columns.len());
            for (slot, column) in row.into_iter().zip(&columns) {
                let value = match slot {
                    Some(value) => value,
                    None => match &column.default {
                        Some(default) => {
                            self.eval_expr(default, &empty, None)?.cast(&column.ty)?
                        }
                        None if column.nullable => Value::Null,
                        None => Value::default_for(&column.ty),
                    },
                };
                complete.push(value);
            }
            new_rows.push(complete);
        }

        let affected = new_rows.len() as u64;
        self.catalog.expect_mut(&insert.table)?.rows.extend(new_rows);
        debug!(table = %insert.table, rows = affected, "inserted");
        Ok(QueryResult::affected(affected))
    }

    /// UPDATE: scans the table, evaluating WHERE per row and reassigning
    /// matched rows through the column types.
    pub(crate) fn execute_update(&mut self, update: &UpdateStatement) -> Result<QueryResult> {
        let table = self.catalog.expect(&update.table)?;
        let alias = table.name.clone();
        let columns = table.columns.clone();
        let snapshot = table.rows.clone();

        let targets: Vec<usize> = update
            .assignments
            .iter()
            .map(|assignment| {
                columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(&assignment.column))
                    .ok_or_else(|| EngineError::UnknownColumn(assignment.column.clone()))
            })
            .collect::<Result<_>>()?;

        let mut new_rows = snapshot.clone();
        let mut affected = 0u64;
        for (index, row) in snapshot.iter().enumerate() {
            let ctx = row_context(&alias, &columns, row);
            let matched = match &update.where_clause {
                Some(predicate) => self.eval_expr(predicate, &ctx, None)?.is_truthy(),
                None => true,
            };
            if !matched {
                continue;
            }
            for (assignment, &target) in update.assignments.iter().zip(&targets) {
                let value = self.eval_expr(&assignment.value, &ctx, None)?;
                new_rows[index][target] = value.cast(&columns[target].ty)?;
            }
            affected += 1;
        }

        self.catalog.expect_mut(&update.table)?.rows = new_rows;
        debug!(table = %update.table, rows = affected, "updated");
        Ok(QueryResult::affected(affected))
    }

    /// DELETE: marks matches during the scan, removes them afterwards.
    pub(crate) fn execute_delete(&mut self, delete: &DeleteStatement) -> Result<QueryResult> {
        let table = self.catalog.expect(&delete.table)?;
        let alias = table.name.clone();
        let columns = table.columns.clone();
        let snapshot = table.rows.clone();

        let mut keep = Vec::with_capacity(snapshot.len());
        let mut affected = 0u64;
        for row in &snapshot {
            let ctx = row_context(&alias, &columns, row);
            let matched = match &delete.where_clause {
                Some(predicate) => self.eval_expr(predicate, &ctx, None)?.is_truthy(),
                None => true,
            };
            if matched {
                affected += 1;
            } else {
                keep.push(row.clone());
            }
        }

        self.catalog.expect_mut(&delete.table)?.rows = keep;
        debug!(table = %delete.table, rows = affected, "deleted");
        Ok(QueryResult::affected(affected))
    }

    /// CREATE TABLE: translates the declared types and registers the
    /// table. IF NOT EXISTS silently skips duplicates.
    pub(crate) fn execute_create_table(
        &mut self,
        create: &CreateTableStatement,
    ) -> Result<QueryResult> {
        if self.catalog.contains(&create.name) {
            if create.if_not_exists {
                return Ok(QueryResult::affected(0));
            }
            return Err(EngineError::type_error(format!(
                "table '{}' already exists",
                create.name
            )));
        }

        let mut columns = Vec::with_capacity(create.columns.len());
        for def in &create.columns {
            let declared = Ty::from_data_type(&def.data_type)?;
            columns.push(Column::new(
                def.name.clone(),
                declared,
                def.default.clone(),
            ));
        }

        self.catalog.insert(Table {
            name: create.name.clone(),
            columns,
            rows: Vec::new(),
        });
        Ok(QueryResult::affected(0))
    }

    /// DROP TABLE; IF EXISTS silently skips missing tables.
    pub(crate) fn execute_drop_table(
        &mut self,
        drop: &DropTableStatement,
    ) -> Result<QueryResult> {
        if !self.catalog.remove(&drop.name) && !drop.if_exists {
            return Err(EngineError::UnknownTable(drop.name.clone()));
        }
        Ok(QueryResult::affected(0))
    }
}

/// Builds the row context for a table scan (alias = table name).
fn row_context(alias: &str, columns: &[Column], row: &[Value]) -> RowContext {
    let mut ctx = RowContext::new();
    for (column, value) in columns.iter().zip(row) {
        ctx.insert_qualified(alias, column.name.clone(), value.clone());
    }
    ctx
}
