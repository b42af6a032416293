//! The public engine façade.

use rowhouse_sql::{Lexer, Parser, TokenKind};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{EngineError, Result};
use crate::exec::Executor;
use crate::functions::FunctionRegistry;
use crate::result::QueryResult;
use crate::value::Value;

/// An embeddable, in-memory SQL engine.
///
/// One engine owns one catalog and one function registry; statements
/// run synchronously, one at a time.
///
/// ```rust
/// use rowhouse_engine::Engine;
///
/// let mut engine = Engine::new();
/// engine.execute("CREATE TABLE users (id Int64, name String)").unwrap();
/// engine.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
/// let result = engine.execute("SELECT name FROM users").unwrap();
/// assert_eq!(result.rows[0][0].to_string(), "Alice");
/// ```
pub struct Engine {
    catalog: Catalog,
    registry: FunctionRegistry,
}

impl Engine {
    /// Creates an engine with an empty catalog and the built-in
    /// function library.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
            registry: FunctionRegistry::with_builtins(),
        }
    }

    /// Creates an engine with a custom function registry.
    #[must_use]
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self {
            catalog: Catalog::new(),
            registry,
        }
    }

    /// Parses and runs a single statement.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] for parse or execution failures; the
    /// statement has no partial effects observable through this API
    /// except DML applied before a later row's failure.
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        debug!(sql, "executing statement");
        let mut parser = Parser::new(sql);
        let stmt = parser.parse_statement()?;
        parser.expect_end()?;
        Executor::new(&mut self.catalog, &self.registry).execute(&stmt)
    }

    /// Splits the input on top-level `;`, skips blank pieces, and runs
    /// each statement in order, failing fast.
    ///
    /// # Errors
    ///
    /// Returns the first statement failure; earlier statements stay
    /// applied.
    pub fn execute_many(&mut self, sql: &str) -> Result<Vec<QueryResult>> {
        let mut results = Vec::new();
        for piece in split_statements(sql) {
            results.push(self.execute(piece)?);
        }
        Ok(results)
    }

    /// Runs a query and returns the first row's first value.
    ///
    /// # Errors
    ///
    /// Fails like [`Engine::execute`], and with a `type` error when the
    /// result has no rows.
    pub fn scalar(&mut self, sql: &str) -> Result<Value> {
        let result = self.execute(sql)?;
        result
            .rows
            .first()
            .and_then(|row| row.first())
            .cloned()
            .ok_or_else(|| EngineError::type_error("scalar query produced no rows"))
    }

    /// True if the catalog has a table with the given (case-insensitive)
    /// name.
    #[must_use]
    pub fn table_exists(&self, name: &str) -> bool {
        self.catalog.contains(name)
    }

    /// The catalog's table names, in creation order.
    #[must_use]
    pub fn list_tables(&self) -> Vec<String> {
        self.catalog.table_names()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits source text at top-level semicolons by scanning the token
/// stream, so `;` inside strings and comments never splits.
fn split_statements(sql: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut lexer = Lexer::new(sql);
    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::Semicolon => {
                pieces.push(&sql[start..token.span.start]);
                start = token.span.end;
            }
            TokenKind::Eof => {
                pieces.push(&sql[start..]);
                break;
            }
            _ => {}
        }
    }
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}
