//! DML and DDL end to end: INSERT forms, UPDATE, DELETE, CREATE/DROP
//! with guards, defaults, and type enforcement.

mod common;
use common::*;

use rowhouse_engine::{Engine, ErrorKind, Value};

#[test]
fn insert_reports_affected_rows() {
    let mut engine = Engine::new();
    engine.execute("CREATE TABLE t (v Int64)").unwrap();
    let result = engine
        .execute("INSERT INTO t VALUES (1), (2), (3)")
        .unwrap();
    assert_eq!(result.affected, 3);
    assert!(result.rows.is_empty());
}

#[test]
fn insert_casts_through_column_types() {
    let mut engine = Engine::new();
    engine
        .execute("CREATE TABLE t (small UInt8, text String)")
        .unwrap();
    engine.execute("INSERT INTO t VALUES ('7', 42)").unwrap();
    let result = engine.execute("SELECT small, text FROM t").unwrap();
    assert_eq!(
        result.rows[0],
        vec![Value::UInt8(7), Value::String(String::from("42"))]
    );

    let err = engine.execute("INSERT INTO t VALUES (300, 'x')").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
}

#[test]
fn insert_with_column_list_fills_defaults() {
    let mut engine = Engine::new();
    engine
        .execute(
            "CREATE TABLE t (id Int64, label String DEFAULT 'none', \
             note Nullable(String), score Float64)",
        )
        .unwrap();
    engine.execute("INSERT INTO t (id) VALUES (1)").unwrap();
    let result = engine.execute("SELECT * FROM t").unwrap();
    assert_eq!(
        result.rows[0],
        vec![
            Value::Int64(1),
            Value::String(String::from("none")),
            Value::Null,
            Value::Float64(0.0)
        ]
    );
}

#[test]
fn insert_select() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE src (v Int64); \
             CREATE TABLE dst (v Int64); \
             INSERT INTO src VALUES (1), (2), (3);",
        )
        .unwrap();
    let result = engine
        .execute("INSERT INTO dst SELECT v * 10 FROM src WHERE v > 1")
        .unwrap();
    assert_eq!(result.affected, 2);
    let rows = engine.execute("SELECT v FROM dst ORDER BY v").unwrap();
    assert_eq!(column_as_strings(&rows), vec!["20", "30"]);
}

#[test]
fn insert_value_count_mismatch_fails() {
    let mut engine = Engine::new();
    engine.execute("CREATE TABLE t (a Int64, b Int64)").unwrap();
    let err = engine.execute("INSERT INTO t VALUES (1)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn update_with_where() {
    let mut engine = engine_with_users();
    let result = engine
        .execute("UPDATE users SET age = age + 1 WHERE name != 'Bob'")
        .unwrap();
    assert_eq!(result.affected, 2);
    let rows = engine
        .execute("SELECT name, age FROM users ORDER BY id")
        .unwrap();
    assert_eq!(
        rows_as_strings(&rows),
        vec![
            vec!["Alice", "31"],
            vec!["Bob", "25"],
            vec!["Charlie", "36"]
        ]
    );
}

#[test]
fn update_casts_assignments() {
    let mut engine = Engine::new();
    engine
        .execute_many("CREATE TABLE t (v UInt8); INSERT INTO t VALUES (1);")
        .unwrap();
    engine.execute("UPDATE t SET v = '9'").unwrap();
    assert_eq!(engine.scalar("SELECT v FROM t").unwrap(), Value::UInt8(9));

    let err = engine.execute("UPDATE t SET v = -1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
}

#[test]
fn update_unknown_column_fails() {
    let mut engine = engine_with_users();
    let err = engine.execute("UPDATE users SET nope = 1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Name);
}

#[test]
fn delete_with_and_without_where() {
    let mut engine = engine_with_users();
    let result = engine.execute("DELETE FROM users WHERE age < 30").unwrap();
    assert_eq!(result.affected, 1);
    assert_eq!(
        engine.scalar("SELECT count(*) FROM users").unwrap(),
        Value::Int64(2)
    );

    let result = engine.execute("DELETE FROM users").unwrap();
    assert_eq!(result.affected, 2);
    assert_eq!(
        engine.scalar("SELECT count(*) FROM users").unwrap(),
        Value::Int64(0)
    );
}

#[test]
fn create_table_composite_columns_round_trip() {
    let mut engine = Engine::new();
    engine
        .execute(
            "CREATE TABLE t (tags Array(String), pair Tuple(Int64, String), \
             attrs Map(String, UInt64))",
        )
        .unwrap();
    engine
        .execute(
            "INSERT INTO t VALUES (['a', 'b'], (1, 'x'), map('k', 7))",
        )
        .unwrap();
    let result = engine.execute("SELECT tags, pair, attrs FROM t").unwrap();
    assert_eq!(result.rows[0][0].to_string(), "['a', 'b']");
    assert_eq!(result.rows[0][1].to_string(), "(1, 'x')");
    assert_eq!(result.rows[0][2].to_string(), "{'k': 7}");
}

#[test]
fn ddl_guards_are_idempotent() {
    let mut engine = Engine::new();
    engine.execute("CREATE TABLE t (v Int64)").unwrap();
    engine.execute("INSERT INTO t VALUES (1)").unwrap();

    // Re-creating with the guard neither errors nor clears the table.
    engine
        .execute("CREATE TABLE IF NOT EXISTS t (other String)")
        .unwrap();
    assert_eq!(engine.scalar("SELECT count(*) FROM t").unwrap(), Value::Int64(1));

    let err = engine.execute("CREATE TABLE t (v Int64)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);

    engine.execute("DROP TABLE t").unwrap();
    engine.execute("DROP TABLE IF EXISTS t").unwrap();
    let err = engine.execute("DROP TABLE t").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Name);
}

#[test]
fn table_listing() {
    let mut engine = Engine::new();
    engine.execute("CREATE TABLE b (v Int64)").unwrap();
    engine.execute("CREATE TABLE a (v Int64)").unwrap();
    assert!(engine.table_exists("B"));
    assert!(!engine.table_exists("c"));
    assert_eq!(engine.list_tables(), vec!["b", "a"]);
}

#[test]
fn insert_null_into_nullable() {
    let mut engine = Engine::new();
    engine
        .execute("CREATE TABLE t (v Nullable(Int64), w Int64)")
        .unwrap();
    engine.execute("INSERT INTO t VALUES (NULL, 1)").unwrap();
    let result = engine.execute("SELECT v, w FROM t").unwrap();
    assert_eq!(result.rows[0], vec![Value::Null, Value::Int64(1)]);
}

#[test]
fn dates_and_uuids_round_trip() {
    let mut engine = Engine::new();
    engine
        .execute("CREATE TABLE t (d Date, ts DateTime, id UUID)")
        .unwrap();
    engine
        .execute(
            "INSERT INTO t VALUES \
             ('2024-06-01', '2024-06-01 12:30:00', '6f2a70a1-37c2-4fd0-9ed9-24f4a9b2c1aa')",
        )
        .unwrap();
    let result = engine.execute("SELECT d, ts, id FROM t").unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![vec![
            "2024-06-01",
            "2024-06-01 12:30:00",
            "6f2a70a1-37c2-4fd0-9ed9-24f4a9b2c1aa"
        ]]
    );
}
