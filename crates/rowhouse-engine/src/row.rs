//! Per-row evaluation context.

use indexmap::IndexMap;

use crate::value::Value;

/// A per-row binding from column names (and table-qualified column
/// names) to values, used during expression evaluation.
///
/// Qualified writes mirror into the unqualified map so both `t.c` and
/// `c` resolve when unambiguous. Insertion order is preserved; star
/// expansion walks it.
#[derive(Debug, Clone, Default)]
pub struct RowContext {
    values: IndexMap<String, Value>,
    qualified: IndexMap<String, IndexMap<String, Value>>,
}

impl RowContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an unqualified column.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    /// Binds a qualified column, mirroring it into the unqualified map.
    pub fn insert_qualified(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        value: Value,
    ) {
        let column = column.into();
        self.values.insert(column.clone(), value.clone());
        self.qualified
            .entry(table.into())
            .or_default()
            .insert(column, value);
    }

    /// Resolves an unqualified column: exact match first, then a
    /// case-insensitive fallback.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column).or_else(|| {
            self.values
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| value)
        })
    }

    /// Resolves a qualified column with the same fallback as
    /// [`RowContext::get`].
    #[must_use]
    pub fn get_qualified(&self, table: &str, column: &str) -> Option<&Value> {
        let cols = self.qualified.get(table).or_else(|| {
            self.qualified
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(table))
                .map(|(_, cols)| cols)
        })?;
        cols.get(column).or_else(|| {
            cols.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| value)
        })
    }

    /// True if the context knows the table alias.
    #[must_use]
    pub fn has_table(&self, table: &str) -> bool {
        self.qualified.contains_key(table)
    }

    /// The visible unqualified column names, in insertion order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// The column names bound under a table alias, in insertion order.
    #[must_use]
    pub fn columns_of(&self, table: &str) -> Vec<String> {
        self.qualified
            .get(table)
            .map(|cols| cols.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All (table, column) pairs bound under qualifiers.
    #[must_use]
    pub fn qualified_names(&self) -> Vec<(String, String)> {
        self.qualified
            .iter()
            .flat_map(|(t, cols)| cols.keys().map(move |c| (t.clone(), c.clone())))
            .collect()
    }

    /// Merges another context into this one. The other side's bindings
    /// win on collision, matching join semantics where the right side is
    /// merged into a clone of the left.
    pub fn merge(&mut self, other: &Self) {
        for (column, value) in &other.values {
            self.values.insert(column.clone(), value.clone());
        }
        for (table, cols) in &other.qualified {
            let entry = self.qualified.entry(table.clone()).or_default();
            for (column, value) in cols {
                entry.insert(column.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_insert_mirrors_unqualified() {
        let mut ctx = RowContext::new();
        ctx.insert_qualified("u", "id", Value::Int64(7));
        assert_eq!(ctx.get("id"), Some(&Value::Int64(7)));
        assert_eq!(ctx.get_qualified("u", "id"), Some(&Value::Int64(7)));
        assert_eq!(ctx.get_qualified("v", "id"), None);
    }

    #[test]
    fn test_column_order_is_insertion_order() {
        let mut ctx = RowContext::new();
        ctx.insert_qualified("t", "b", Value::Int64(1));
        ctx.insert_qualified("t", "a", Value::Int64(2));
        assert_eq!(ctx.column_names(), vec!["b", "a"]);
        assert_eq!(ctx.columns_of("t"), vec!["b", "a"]);
    }

    #[test]
    fn test_merge_right_side_wins() {
        let mut left = RowContext::new();
        left.insert_qualified("l", "id", Value::Int64(1));
        let mut right = RowContext::new();
        right.insert_qualified("r", "id", Value::Int64(2));

        let mut merged = left.clone();
        merged.merge(&right);
        assert_eq!(merged.get("id"), Some(&Value::Int64(2)));
        assert_eq!(merged.get_qualified("l", "id"), Some(&Value::Int64(1)));
        assert_eq!(merged.get_qualified("r", "id"), Some(&Value::Int64(2)));
    }
}
