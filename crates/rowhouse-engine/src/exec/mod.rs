//! Statement execution.
//!
//! A per-statement [`Executor`] borrows the engine's catalog and
//! function registry and threads an ambient CTE map; the expression
//! evaluator and statement executor are mutually recursive methods on
//! it, so subqueries need no injected callbacks.

mod dml;
mod eval;
mod join;
mod select;
mod table_func;
mod window;

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use rowhouse_sql::ast::{SetOperator, Statement};

use crate::catalog::Catalog;
use crate::error::{EngineError, Result};
use crate::functions::FunctionRegistry;
use crate::result::QueryResult;
use crate::value::Value;

/// Executes statements against a catalog and function registry.
pub struct Executor<'a> {
    catalog: &'a mut Catalog,
    registry: &'a FunctionRegistry,
    /// CTEs visible to the statement currently executing, keyed by
    /// lowercased name. Registered on SELECT entry, removed on exit.
    ctes: HashMap<String, QueryResult>,
    /// Row contexts of enclosing expression-level subquery evaluations;
    /// column resolution falls back to them, which is what makes
    /// correlated EXISTS/IN/scalar subqueries work.
    outer: Vec<crate::row::RowContext>,
}

impl<'a> Executor<'a> {
    /// Creates an executor borrowing the engine's state.
    pub fn new(catalog: &'a mut Catalog, registry: &'a FunctionRegistry) -> Self {
        Self {
            catalog,
            registry,
            ctes: HashMap::new(),
            outer: Vec::new(),
        }
    }

    /// Executes one statement to completion.
    ///
    /// # Errors
    ///
    /// All engine error kinds; every error is fatal to the statement.
    pub fn execute(&mut self, stmt: &Statement) -> Result<QueryResult> {
        match stmt {
            Statement::Select(select) => self.execute_select(select),
            Statement::SetOperation {
                op,
                all,
                left,
                right,
            } => self.execute_set_operation(*op, *all, left, right),
            Statement::Insert(insert) => self.execute_insert(insert),
            Statement::CreateTable(create) => self.execute_create_table(create),
            Statement::DropTable(drop) => self.execute_drop_table(drop),
            Statement::Update(update) => self.execute_update(update),
            Statement::Delete(delete) => self.execute_delete(delete),
        }
    }

    /// UNION / INTERSECT / EXCEPT over fully executed sides, keyed by
    /// stringified rows. The left side's schema is adopted.
    fn execute_set_operation(
        &mut self,
        op: SetOperator,
        all: bool,
        left: &Statement,
        right: &Statement,
    ) -> Result<QueryResult> {
        let left = self.execute(left)?;
        let right = self.execute(right)?;

        if left.columns.len() != right.columns.len() {
            return Err(EngineError::type_error(format!(
                "{} sides have {} and {} columns",
                op.as_str(),
                left.columns.len(),
                right.columns.len()
            )));
        }

        let mut rows = match op {
            SetOperator::Union => {
                let mut rows = left.rows;
                rows.extend(right.rows);
                rows
            }
            SetOperator::Intersect => {
                let right_keys: HashSet<String> =
                    right.rows.iter().map(|row| row_key(row)).collect();
                left.rows
                    .into_iter()
                    .filter(|row| right_keys.contains(&row_key(row)))
                    .collect()
            }
            SetOperator::Except => {
                let right_keys: HashSet<String> =
                    right.rows.iter().map(|row| row_key(row)).collect();
                left.rows
                    .into_iter()
                    .filter(|row| !right_keys.contains(&row_key(row)))
                    .collect()
            }
        };

        if !all {
            let mut seen = HashSet::new();
            rows.retain(|row| seen.insert(row_key(row)));
        }

        Ok(QueryResult {
            columns: left.columns,
            rows,
            affected: 0,
        })
    }
}

/// Deduplication key of a whole row.
fn row_key(row: &[Value]) -> String {
    row.iter().map(Value::group_key).join("\u{0}")
}
