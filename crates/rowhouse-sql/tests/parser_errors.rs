//! Tests that malformed input fails with positioned errors.

mod common;
use common::*;

use rowhouse_sql::ParseError;

#[test]
fn empty_input_is_an_error() {
    assert!(matches!(parse_err(""), ParseError::Unexpected { .. }));
}

#[test]
fn unknown_leading_token() {
    let err = parse_err("EXPLAIN SELECT 1");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn missing_closing_paren() {
    let err = parse_err("SELECT (1 + 2");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn select_with_trailing_garbage() {
    let err = parse_err("SELECT 1 FROM t WHERE");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn error_reports_line_and_column() {
    let err = parse_err("SELECT a\nFROM t\nWHERE >");
    assert_eq!(err.line(), 3);
    assert_eq!(err.column(), 7);
}

#[test]
fn unterminated_string_is_lex_error() {
    let err = parse_err("SELECT 'unclosed");
    assert!(matches!(err, ParseError::Lex { .. }));
}

#[test]
fn unknown_byte_is_lex_error() {
    let err = parse_err("SELECT a # b FROM t");
    assert!(matches!(err, ParseError::Lex { .. }));
}

#[test]
fn between_requires_and() {
    let err = parse_err("SELECT x BETWEEN 1 10 FROM t");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn case_requires_when() {
    let err = parse_err("SELECT CASE END FROM t");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn over_requires_function_call() {
    let err = parse_err("SELECT x OVER (ORDER BY x) FROM t");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn insert_requires_values_or_select() {
    let err = parse_err("INSERT INTO t SET x = 1");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn create_table_requires_column_list() {
    let err = parse_err("CREATE TABLE t");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn statements_do_not_concatenate() {
    let err = parse_err("SELECT 1 SELECT 2");
    assert!(matches!(err, ParseError::Unexpected { .. }));
}
