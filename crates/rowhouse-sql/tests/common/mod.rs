#![allow(dead_code)]

use rowhouse_sql::ast::{
    CreateTableStatement, DeleteStatement, Expr, InsertStatement, SelectStatement, Statement,
    UpdateStatement,
};
use rowhouse_sql::{ParseError, Parser};

pub fn parse(sql: &str) -> Statement {
    let mut parser = Parser::new(sql);
    let stmt = parser
        .parse_statement()
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e}"));
    parser
        .expect_end()
        .unwrap_or_else(|e| panic!("Trailing tokens after: {sql}\nError: {e}"));
    stmt
}

pub fn parse_err(sql: &str) -> ParseError {
    let mut parser = Parser::new(sql);
    match parser.parse_statement().and_then(|s| {
        parser.expect_end()?;
        Ok(s)
    }) {
        Ok(_) => panic!("Expected parse error for: {sql}"),
        Err(e) => e,
    }
}

pub fn parse_select(sql: &str) -> SelectStatement {
    match parse(sql) {
        Statement::Select(s) => *s,
        other => panic!("Expected SELECT, got {other:?}"),
    }
}

pub fn parse_insert(sql: &str) -> InsertStatement {
    match parse(sql) {
        Statement::Insert(i) => i,
        other => panic!("Expected INSERT, got {other:?}"),
    }
}

pub fn parse_update(sql: &str) -> UpdateStatement {
    match parse(sql) {
        Statement::Update(u) => u,
        other => panic!("Expected UPDATE, got {other:?}"),
    }
}

pub fn parse_delete(sql: &str) -> DeleteStatement {
    match parse(sql) {
        Statement::Delete(d) => d,
        other => panic!("Expected DELETE, got {other:?}"),
    }
}

pub fn parse_create(sql: &str) -> CreateTableStatement {
    match parse(sql) {
        Statement::CreateTable(c) => c,
        other => panic!("Expected CREATE TABLE, got {other:?}"),
    }
}

/// First projection item of a `SELECT <expr>`.
pub fn parse_expr(expr_sql: &str) -> Expr {
    let select = parse_select(&format!("SELECT {expr_sql}"));
    select.projection.into_iter().next().expect("projection")
}
