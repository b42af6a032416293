//! Tests for INSERT, UPDATE, DELETE, CREATE TABLE, and DROP TABLE.

mod common;
use common::*;

use rowhouse_sql::ast::{Expr, InsertSource, Literal, Statement};

#[test]
fn insert_values_single_row() {
    let insert = parse_insert("INSERT INTO users (id, name) VALUES (1, 'Alice')");
    assert_eq!(insert.table, "users");
    assert_eq!(insert.columns, vec!["id", "name"]);
    let InsertSource::Values(rows) = insert.source else {
        panic!("expected VALUES");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 2);
}

#[test]
fn insert_values_multiple_rows() {
    let insert = parse_insert("INSERT INTO t VALUES (1, 'a'), (2, 'b'), (3, 'c')");
    assert!(insert.columns.is_empty());
    let InsertSource::Values(rows) = insert.source else {
        panic!("expected VALUES");
    };
    assert_eq!(rows.len(), 3);
}

#[test]
fn insert_select() {
    let insert = parse_insert("INSERT INTO dst SELECT * FROM src WHERE x > 0");
    assert!(matches!(insert.source, InsertSource::Select(_)));
}

#[test]
fn insert_negative_and_null_values() {
    let insert = parse_insert("INSERT INTO t VALUES (-5, NULL)");
    let InsertSource::Values(rows) = insert.source else {
        panic!("expected VALUES");
    };
    assert!(matches!(rows[0][1], Expr::Literal(Literal::Null)));
}

#[test]
fn update_with_where() {
    let update = parse_update("UPDATE users SET name = 'Bob', age = age + 1 WHERE id = 1");
    assert_eq!(update.table, "users");
    assert_eq!(update.assignments.len(), 2);
    assert_eq!(update.assignments[0].column, "name");
    assert!(update.where_clause.is_some());
}

#[test]
fn update_without_where() {
    let update = parse_update("UPDATE users SET active = true");
    assert!(update.where_clause.is_none());
}

#[test]
fn delete_with_where() {
    let delete = parse_delete("DELETE FROM users WHERE age < 18");
    assert_eq!(delete.table, "users");
    assert!(delete.where_clause.is_some());
}

#[test]
fn delete_all_rows() {
    let delete = parse_delete("DELETE FROM users");
    assert!(delete.where_clause.is_none());
}

#[test]
fn create_table_basic() {
    let create = parse_create("CREATE TABLE users (id Int64, name String, age Int64)");
    assert_eq!(create.name, "users");
    assert!(!create.if_not_exists);
    assert_eq!(create.columns.len(), 3);
    assert_eq!(create.columns[0].name, "id");
    assert_eq!(create.columns[0].data_type.to_string(), "Int64");
}

#[test]
fn create_table_if_not_exists() {
    let create = parse_create("CREATE TABLE IF NOT EXISTS t (x UInt8)");
    assert!(create.if_not_exists);
}

#[test]
fn create_table_nullable_and_defaults() {
    let create = parse_create(
        "CREATE TABLE t (id Int64, note Nullable(String), score Float64 DEFAULT 0.0)",
    );
    assert_eq!(create.columns[1].data_type.to_string(), "Nullable(String)");
    assert!(matches!(
        create.columns[2].default,
        Some(Expr::Literal(Literal::Float(_)))
    ));
}

#[test]
fn create_table_composite_types() {
    let create = parse_create(
        "CREATE TABLE t (tags Array(String), pair Tuple(a Int64, b String), \
         attrs Map(String, UInt64), code FixedString(4))",
    );
    assert_eq!(create.columns[0].data_type.to_string(), "Array(String)");
    assert_eq!(
        create.columns[1].data_type.to_string(),
        "Tuple(a Int64, b String)"
    );
    assert_eq!(
        create.columns[2].data_type.to_string(),
        "Map(String, UInt64)"
    );
    assert_eq!(create.columns[3].data_type.to_string(), "FixedString(4)");
}

#[test]
fn create_table_engine_tail() {
    let create = parse_create(
        "CREATE TABLE t (id Int64, ts DateTime) \
         ENGINE = MergeTree(ts, 8192) PRIMARY KEY id ORDER BY (id, ts)",
    );
    assert_eq!(create.primary_key.len(), 1);
    assert_eq!(create.order_by.len(), 2);
}

#[test]
fn create_table_datetime_parameters() {
    let create = parse_create(
        "CREATE TABLE t (a DateTime('UTC'), b DateTime64(3), c Decimal(10, 2))",
    );
    assert_eq!(create.columns[0].data_type.to_string(), "DateTime('UTC')");
    assert_eq!(create.columns[1].data_type.to_string(), "DateTime64(3)");
    assert_eq!(create.columns[2].data_type.to_string(), "Decimal(10, 2)");
}

#[test]
fn create_table_enum_normalizes_names() {
    let create = parse_create("CREATE TABLE t (e Enum8('red' = 1, 'green' = 2))");
    assert_eq!(create.columns[0].data_type.name, "Enum8");
    assert_eq!(create.columns[0].data_type.args.len(), 2);
}

#[test]
fn drop_table_forms() {
    let Statement::DropTable(drop) = parse("DROP TABLE users") else {
        panic!("expected DROP");
    };
    assert_eq!(drop.name, "users");
    assert!(!drop.if_exists);

    let Statement::DropTable(drop) = parse("DROP TABLE IF EXISTS users") else {
        panic!("expected DROP");
    };
    assert!(drop.if_exists);
}
