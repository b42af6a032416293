//! Binding powers for Pratt expression parsing.
//!
//! The ladder, loosest to tightest: ternary `?:` → OR → AND → NOT →
//! comparisons (including IS/IN/BETWEEN/LIKE/ILIKE) → `||` → additive →
//! multiplicative → unary sign → postfix (`[i]`, `.m`, `::T`, `OVER`).

use crate::ast::BinaryOp;
use crate::lexer::{Keyword, TokenKind};

/// Binding power of prefix operators.
pub const NOT_BP: u8 = 7;
/// Binding power of unary sign.
pub const SIGN_BP: u8 = 17;
/// Right binding power used for the branches of `?:`.
pub const TERNARY_RIGHT_BP: u8 = 1;

/// Returns the infix binding power `(left, right)` for a token, or `None`
/// if the token is not an infix or postfix operator.
///
/// Left associative operators have `left < right`.
#[must_use]
pub const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        // Ternary conditional (right associative)
        TokenKind::Question => Some((2, 1)),

        TokenKind::Keyword(Keyword::Or) => Some((3, 4)),

        TokenKind::Keyword(Keyword::And) => Some((5, 6)),

        // Comparisons and predicate keywords, including the NOT of
        // `NOT IN` / `NOT BETWEEN` / `NOT LIKE` / `NOT ILIKE`
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq
        | TokenKind::Keyword(
            Keyword::Is
            | Keyword::In
            | Keyword::Between
            | Keyword::Like
            | Keyword::Ilike
            | Keyword::Not,
        ) => Some((9, 10)),

        TokenKind::Concat => Some((11, 12)),

        TokenKind::Plus | TokenKind::Minus => Some((13, 14)),

        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((15, 16)),

        // Postfix: indexing, member access, cast, window attachment
        TokenKind::LeftBracket
        | TokenKind::Dot
        | TokenKind::DoubleColon
        | TokenKind::Keyword(Keyword::Over) => Some((19, 20)),

        _ => None,
    }
}

/// Converts a token to a plain binary operator.
#[must_use]
pub const fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::Concat => Some(BinaryOp::Concat),
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        TokenKind::Keyword(Keyword::Like) => Some(BinaryOp::Like),
        TokenKind::Keyword(Keyword::Ilike) => Some(BinaryOp::ILike),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        let or_bp = infix_binding_power(&TokenKind::Keyword(Keyword::Or)).unwrap();
        let and_bp = infix_binding_power(&TokenKind::Keyword(Keyword::And)).unwrap();
        let eq_bp = infix_binding_power(&TokenKind::Eq).unwrap();
        let concat_bp = infix_binding_power(&TokenKind::Concat).unwrap();
        let add_bp = infix_binding_power(&TokenKind::Plus).unwrap();
        let mul_bp = infix_binding_power(&TokenKind::Star).unwrap();
        let postfix_bp = infix_binding_power(&TokenKind::LeftBracket).unwrap();

        assert!(or_bp.0 < and_bp.0);
        assert!(and_bp.0 < eq_bp.0);
        assert!(eq_bp.0 < concat_bp.0);
        assert!(concat_bp.0 < add_bp.0);
        assert!(add_bp.0 < mul_bp.0);
        assert!(mul_bp.0 < SIGN_BP);
        assert!(SIGN_BP < postfix_bp.0);
        assert!(NOT_BP > and_bp.0 && NOT_BP < eq_bp.0);
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let (l, r) = infix_binding_power(&TokenKind::Question).unwrap();
        assert!(l > r);
    }

    #[test]
    fn test_left_associativity() {
        let (l, r) = infix_binding_power(&TokenKind::Plus).unwrap();
        assert!(l < r);
    }

    #[test]
    fn test_token_to_binary_op() {
        assert_eq!(token_to_binary_op(&TokenKind::Plus), Some(BinaryOp::Add));
        assert_eq!(
            token_to_binary_op(&TokenKind::Keyword(Keyword::Ilike)),
            Some(BinaryOp::ILike)
        );
        assert_eq!(token_to_binary_op(&TokenKind::LeftParen), None);
    }
}
