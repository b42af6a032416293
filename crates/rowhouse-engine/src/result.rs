//! Query results.

use crate::types::Ty;
use crate::value::Value;

/// One output column of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    /// Output name.
    pub name: String,
    /// Output type.
    pub ty: Ty,
}

/// The tabular result of a statement.
///
/// DDL and DML produce no columns or rows; only
/// [`QueryResult::affected`] is meaningful for them.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Ordered output columns.
    pub columns: Vec<ResultColumn>,
    /// Ordered rows; value positions match [`QueryResult::columns`].
    pub rows: Vec<Vec<Value>>,
    /// Rows inserted/updated/deleted for DML, 0 for queries and DDL.
    pub affected: u64,
}

impl QueryResult {
    /// A result with only an affected-row count.
    #[must_use]
    pub fn affected(count: u64) -> Self {
        Self {
            affected: count,
            ..Self::default()
        }
    }

    /// The position of an output column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
