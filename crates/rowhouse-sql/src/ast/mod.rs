//! Abstract syntax tree for the dialect.

mod expression;
mod statement;
mod types;

pub use expression::{
    BinaryOp, Expr, FrameBound, FrameUnits, FunctionCall, InList, Literal, UnaryOp, WindowFrame,
    WindowSpec,
};
pub use statement::{
    Assignment, ColumnDef, CreateTableStatement, CteDefinition, DeleteStatement,
    DropTableStatement, InsertSource, InsertStatement, JoinKind, NullOrdering, OrderByExpr,
    OrderDirection, SelectStatement, SetOperator, Statement, TableRef, UpdateStatement,
};
pub use types::{DataType, TypeArg};
