//! # rowhouse-sql
//!
//! Lexer, AST, and recursive-descent parser for the rowhouse SQL dialect,
//! a ClickHouse-flavored surface covering queries (joins, grouping, window
//! functions, set operations, CTEs), DML, and DDL.
//!
//! ```rust
//! use rowhouse_sql::{Parser, Statement};
//!
//! let mut parser = Parser::new("SELECT name FROM users WHERE age > 25");
//! let stmt = parser.parse_statement().unwrap();
//! assert!(matches!(stmt, Statement::Select(_)));
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, Statement};
pub use lexer::{Keyword, Lexer, Span, Token, TokenKind};
pub use parser::{ParseError, Parser};
