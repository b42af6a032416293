//! Engine error types.

use rowhouse_sql::ParseError;

/// Coarse classification of engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid bytes or unterminated literals in the source text.
    Lex,
    /// Syntactically invalid statement.
    Parse,
    /// Unknown table, column, or function.
    Name,
    /// Invalid type usage: bad type expression, incomparable values,
    /// unsupported operation.
    Type,
    /// Failed value conversion: overflow or unparseable input.
    Conversion,
    /// Wrong number of arguments to a function.
    Arity,
    /// Parser-accepted construct the executor does not support.
    NotImplemented,
}

/// Errors raised while executing a statement.
///
/// All errors are fatal to the current statement and propagate to the
/// caller; there is no local recovery.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Lexing or parsing failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A referenced table does not exist.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// A referenced column does not exist in the row context.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A called function is not registered.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// A type error: bad type expression, incomparable values, or an
    /// unsupported operation.
    #[error("{0}")]
    Type(String),

    /// A value conversion failed.
    #[error("{0}")]
    Conversion(String),

    /// A function was called with the wrong number of arguments.
    #[error("function '{name}' expects {expected} arguments, got {actual}")]
    Arity {
        /// The function name.
        name: String,
        /// Human description of the accepted count(s).
        expected: String,
        /// The actual argument count.
        actual: usize,
    },

    /// A construct the parser accepts but the executor does not run.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl EngineError {
    /// Creates a type error.
    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Creates a conversion error.
    #[must_use]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    /// Creates a not-implemented error.
    #[must_use]
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented(message.into())
    }

    /// Returns the coarse error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(ParseError::Lex { .. }) => ErrorKind::Lex,
            Self::Parse(ParseError::Unexpected { .. }) => ErrorKind::Parse,
            Self::UnknownTable(_) | Self::UnknownColumn(_) | Self::UnknownFunction(_) => {
                ErrorKind::Name
            }
            Self::Type(_) => ErrorKind::Type,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::Arity { .. } => ErrorKind::Arity,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
