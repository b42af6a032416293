//! Parser error types.

use crate::lexer::{Span, TokenKind};

/// An error raised while lexing or parsing a statement.
///
/// The parser is single-pass and never recovers; the first error aborts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The lexer produced an invalid token.
    #[error("{message} at line {line}, column {column}")]
    Lex {
        /// What the lexer rejected.
        message: String,
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
    },

    /// The parser met a token it did not expect.
    #[error("expected {expected}, found {found} at line {line}, column {column}")]
    Unexpected {
        /// The production or token that was expected.
        expected: String,
        /// The offending token.
        found: TokenKind,
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
    },
}

impl ParseError {
    /// Creates a lex error at the given span.
    #[must_use]
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::Lex {
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    /// Creates an "unexpected token" error at the given span.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        Self::Unexpected {
            expected: expected.into(),
            found,
            line: span.line,
            column: span.column,
        }
    }

    /// The 1-based line the error points at.
    #[must_use]
    pub const fn line(&self) -> u32 {
        match self {
            Self::Lex { line, .. } | Self::Unexpected { line, .. } => *line,
        }
    }

    /// The 1-based column the error points at.
    #[must_use]
    pub const fn column(&self) -> u32 {
        match self {
            Self::Lex { column, .. } | Self::Unexpected { column, .. } => *column,
        }
    }
}
