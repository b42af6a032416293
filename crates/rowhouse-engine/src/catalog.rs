//! The in-memory catalog: ordered, case-insensitive table storage.

use indexmap::IndexMap;
use rowhouse_sql::ast::Expr;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::types::Ty;
use crate::value::Value;

/// A column of a table.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// The value type, with `Nullable` stripped into [`Column::nullable`].
    pub ty: Ty,
    /// Whether the slot admits NULL.
    pub nullable: bool,
    /// DEFAULT expression, evaluated at INSERT time.
    pub default: Option<Expr>,
}

impl Column {
    /// Creates a column from a declared type, splitting off nullability.
    #[must_use]
    pub fn new(name: impl Into<String>, declared: Ty, default: Option<Expr>) -> Self {
        let nullable = declared.is_nullable();
        let ty = declared.strip_wrappers().clone();
        Self {
            name: name.into(),
            ty,
            nullable,
            default,
        }
    }
}

/// A row-oriented table.
#[derive(Debug, Clone)]
pub struct Table {
    /// The name as written at CREATE time.
    pub name: String,
    /// Ordered columns.
    pub columns: Vec<Column>,
    /// Rows; value positions match the column list.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Returns the position of a column by case-insensitive name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// The engine's set of tables: an ordered mapping from case-insensitive
/// name to table.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: IndexMap<String, Table>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a table with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    /// Looks up a table.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    /// Looks up a table mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&name.to_lowercase())
    }

    /// Looks up a table, failing with a `name` error when absent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownTable`] when the table is missing.
    pub fn expect(&self, name: &str) -> Result<&Table> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownTable(String::from(name)))
    }

    /// Looks up a table mutably, failing with a `name` error when absent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownTable`] when the table is missing.
    pub fn expect_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.get_mut(name)
            .ok_or_else(|| EngineError::UnknownTable(String::from(name)))
    }

    /// Inserts a freshly created table.
    pub fn insert(&mut self, table: Table) {
        info!(table = %table.name, columns = table.columns.len(), "created table");
        self.tables.insert(table.name.to_lowercase(), table);
    }

    /// Removes a table; returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.tables.shift_remove(&name.to_lowercase()).is_some();
        if removed {
            info!(table = %name, "dropped table");
        }
        removed
    }

    /// The table names in creation order.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.tables.values().map(|t| t.name.clone()).collect()
    }
}
