//! Statement and table-reference AST types.

use core::fmt;

use super::expression::Expr;
use super::types::DataType;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Null ordering for ORDER BY.
///
/// Parsed and carried; the executor always places NULLs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    /// NULLS FIRST.
    First,
    /// NULLS LAST.
    Last,
}

/// An ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    /// The expression to order by.
    pub expr: Expr,
    /// ASC or DESC.
    pub direction: OrderDirection,
    /// Optional NULLS FIRST/LAST.
    pub nulls: Option<NullOrdering>,
}

/// Join kinds recognized by the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT [OUTER] JOIN.
    Left,
    /// LEFT SEMI JOIN.
    LeftSemi,
    /// LEFT ANTI JOIN.
    LeftAnti,
    /// RIGHT [OUTER] JOIN.
    Right,
    /// RIGHT SEMI JOIN.
    RightSemi,
    /// RIGHT ANTI JOIN.
    RightAnti,
    /// FULL [OUTER] JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
    /// ASOF JOIN.
    Asof,
}

impl JoinKind {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::LeftSemi => "LEFT SEMI JOIN",
            Self::LeftAnti => "LEFT ANTI JOIN",
            Self::Right => "RIGHT JOIN",
            Self::RightSemi => "RIGHT SEMI JOIN",
            Self::RightAnti => "RIGHT ANTI JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
            Self::Asof => "ASOF JOIN",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table reference in a FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A named table (or CTE).
    Table {
        /// Table name.
        name: String,
        /// Optional alias; defaults to the table name.
        alias: Option<String>,
    },
    /// A derived table.
    Subquery {
        /// The inner statement.
        query: Box<Statement>,
        /// The alias the derived columns are projected under.
        alias: String,
    },
    /// A join of two table references.
    Join {
        /// Left operand.
        left: Box<TableRef>,
        /// The join kind.
        kind: JoinKind,
        /// Right operand.
        right: Box<TableRef>,
        /// ON condition.
        on: Option<Expr>,
        /// USING column list (alternative to ON).
        using: Vec<String>,
    },
    /// A table function such as `numbers(10)`.
    TableFunction {
        /// Function name.
        name: String,
        /// Arguments, evaluated in an empty row context.
        args: Vec<Expr>,
        /// Optional alias; defaults to the function name.
        alias: Option<String>,
    },
    /// ARRAY JOIN: unnests array expressions, one output row per element.
    ArrayJoin {
        /// The table reference being unnested.
        left: Box<TableRef>,
        /// Array expressions, each optionally aliased.
        exprs: Vec<Expr>,
    },
}

/// A common table expression definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CteDefinition {
    /// The CTE name.
    pub name: String,
    /// Declared column names, if any.
    pub columns: Vec<String>,
    /// The defining statement.
    pub query: Statement,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// CTEs from a leading WITH clause.
    pub ctes: Vec<CteDefinition>,
    /// SELECT DISTINCT.
    pub distinct: bool,
    /// Projection list; aliases are `Expr::Aliased` wrappers.
    pub projection: Vec<Expr>,
    /// FROM clause; absent for `SELECT 1 + 1`.
    pub from: Option<TableRef>,
    /// WHERE predicate (PREWHERE folds in as an extra conjunct).
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING predicate.
    pub having: Option<Expr>,
    /// ORDER BY items.
    pub order_by: Vec<OrderByExpr>,
    /// LIMIT row count.
    pub limit: Option<Expr>,
    /// OFFSET row count.
    pub offset: Option<Expr>,
}

/// Set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// UNION.
    Union,
    /// INTERSECT.
    Intersect,
    /// EXCEPT.
    Except,
}

impl SetOperator {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// The source of inserted rows.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// VALUES rows.
    Values(Vec<Vec<Expr>>),
    /// INSERT ... SELECT.
    Select(Box<Statement>),
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table.
    pub table: String,
    /// Explicit column list; empty means positional against all columns.
    pub columns: Vec<String>,
    /// The rows.
    pub source: InsertSource,
}

/// A column definition in CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub data_type: DataType,
    /// DEFAULT expression, if any.
    pub default: Option<Expr>,
}

/// A CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Table name.
    pub name: String,
    /// IF NOT EXISTS guard.
    pub if_not_exists: bool,
    /// Column definitions.
    pub columns: Vec<ColumnDef>,
    /// PRIMARY KEY expressions (parsed, not enforced).
    pub primary_key: Vec<Expr>,
    /// ORDER BY expressions from the engine tail (parsed, not enforced).
    pub order_by: Vec<Expr>,
}

/// A DROP TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Table name.
    pub name: String,
    /// IF EXISTS guard.
    pub if_exists: bool,
}

/// A single SET assignment in UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Target column.
    pub column: String,
    /// The value expression.
    pub value: Expr,
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table.
    pub table: String,
    /// SET assignments.
    pub assignments: Vec<Assignment>,
    /// WHERE predicate.
    pub where_clause: Option<Expr>,
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table.
    pub table: String,
    /// WHERE predicate.
    pub where_clause: Option<Expr>,
}

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT (possibly WITH-prefixed).
    Select(Box<SelectStatement>),
    /// UNION / INTERSECT / EXCEPT tree.
    SetOperation {
        /// The operator.
        op: SetOperator,
        /// ALL flag (no deduplication).
        all: bool,
        /// Left operand.
        left: Box<Statement>,
        /// Right operand.
        right: Box<Statement>,
    },
    /// INSERT INTO.
    Insert(InsertStatement),
    /// CREATE TABLE.
    CreateTable(CreateTableStatement),
    /// DROP TABLE.
    DropTable(DropTableStatement),
    /// UPDATE.
    Update(UpdateStatement),
    /// DELETE FROM.
    Delete(DeleteStatement),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_kind_as_str() {
        assert_eq!(JoinKind::LeftAnti.as_str(), "LEFT ANTI JOIN");
        assert_eq!(JoinKind::Cross.as_str(), "CROSS JOIN");
    }

    #[test]
    fn test_order_direction_default() {
        assert_eq!(OrderDirection::default(), OrderDirection::Asc);
    }
}
