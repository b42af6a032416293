//! # rowhouse-engine
//!
//! An embeddable, in-memory SQL engine for the rowhouse dialect.
//! Statements parse through [`rowhouse_sql`] and execute against a
//! process-local catalog of row-oriented tables: joins, grouping,
//! window functions, set operations, CTEs, DML, and DDL.
//!
//! ```rust
//! use rowhouse_engine::Engine;
//!
//! let mut engine = Engine::new();
//! engine
//!     .execute_many(
//!         "CREATE TABLE users (id Int64, name String, age Int64); \
//!          INSERT INTO users VALUES (1, 'Alice', 30), (2, 'Bob', 25);",
//!     )
//!     .unwrap();
//!
//! let result = engine
//!     .execute("SELECT name FROM users WHERE age > 27 ORDER BY name")
//!     .unwrap();
//! assert_eq!(result.rows.len(), 1);
//! ```

pub mod catalog;
mod engine;
pub mod error;
mod exec;
pub mod functions;
mod result;
mod row;
pub mod types;
pub mod value;

pub use catalog::{Catalog, Column, Table};
pub use engine::Engine;
pub use error::{EngineError, ErrorKind, Result};
pub use exec::Executor;
pub use functions::{
    AggregateFunction, AggregateState, Function, FunctionRegistry, ScalarFunction,
};
pub use result::{QueryResult, ResultColumn};
pub use row::RowContext;
pub use types::Ty;
pub use value::Value;
