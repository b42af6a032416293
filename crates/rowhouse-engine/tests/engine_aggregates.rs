//! Aggregation and window functions: GROUP BY, HAVING, global
//! aggregates, empty-set rules, and the window function set.

mod common;
use common::*;

use rowhouse_engine::{Engine, Value};

#[test]
fn count_and_sum_over_numbers() {
    let mut engine = Engine::new();
    assert_eq!(
        engine.scalar("SELECT count() FROM numbers(10)").unwrap(),
        Value::Int64(10)
    );
    assert_eq!(
        engine.scalar("SELECT sum(number) FROM numbers(10)").unwrap(),
        Value::Float64(45.0)
    );
}

#[test]
fn aggregates_over_empty_set() {
    let mut engine = Engine::new();
    let result = engine
        .execute(
            "SELECT count(*), count(number), sum(number), avg(number), \
             min(number), max(number) FROM numbers(0)",
        )
        .unwrap();
    assert_eq!(
        result.rows[0],
        vec![
            Value::Int64(0),
            Value::Int64(0),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null
        ]
    );
}

#[test]
fn group_by_with_aggregates() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE sales (city String, amount Int64); \
             INSERT INTO sales VALUES \
                 ('Oslo', 10), ('Bergen', 20), ('Oslo', 30), ('Bergen', 5), ('Oslo', 2);",
        )
        .unwrap();
    let result = engine
        .execute(
            "SELECT city, count(*) AS n, sum(amount) AS total \
             FROM sales GROUP BY city ORDER BY city",
        )
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![vec!["Bergen", "2", "25"], vec!["Oslo", "3", "42"]]
    );
}

#[test]
fn group_by_null_is_its_own_group() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (k Nullable(String), v Int64); \
             INSERT INTO t VALUES ('a', 1), (NULL, 2), ('a', 3), (NULL, 4);",
        )
        .unwrap();
    let result = engine
        .execute("SELECT k, count(*) FROM t GROUP BY k ORDER BY k")
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![vec!["NULL", "2"], vec!["a", "2"]]
    );
}

#[test]
fn having_filters_groups() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE sales (city String, amount Int64); \
             INSERT INTO sales VALUES \
                 ('Oslo', 10), ('Bergen', 20), ('Oslo', 30), ('Bergen', 5), ('Trondheim', 1);",
        )
        .unwrap();
    let result = engine
        .execute(
            "SELECT city, sum(amount) AS total FROM sales \
             GROUP BY city HAVING sum(amount) > 20 ORDER BY city",
        )
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![vec!["Bergen", "25"], vec!["Oslo", "40"]]
    );
}

#[test]
fn group_by_order_by_aggregate() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (k String, v Int64); \
             INSERT INTO t VALUES ('a', 1), ('b', 5), ('a', 2), ('c', 4);",
        )
        .unwrap();
    let result = engine
        .execute("SELECT k FROM t GROUP BY k ORDER BY sum(v) DESC")
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["b", "c", "a"]);
}

#[test]
fn distinct_aggregate() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (v Int64); INSERT INTO t VALUES (1), (1), (2), (2), (3);",
        )
        .unwrap();
    assert_eq!(
        engine.scalar("SELECT count(DISTINCT v) FROM t").unwrap(),
        Value::Int64(3)
    );
    assert_eq!(
        engine.scalar("SELECT sum(DISTINCT v) FROM t").unwrap(),
        Value::Float64(6.0)
    );
}

#[test]
fn uniq_and_group_array() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (k String, v Int64); \
             INSERT INTO t VALUES ('a', 1), ('a', 1), ('a', 2), ('b', 9);",
        )
        .unwrap();
    let result = engine
        .execute("SELECT k, uniq(v), groupArray(v) FROM t GROUP BY k ORDER BY k")
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![vec!["a", "2", "[1, 1, 2]"], vec!["b", "1", "[9]"]]
    );
}

#[test]
fn aggregate_inside_expression() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (v Int64); INSERT INTO t VALUES (1), (2), (3);",
        )
        .unwrap();
    assert_eq!(
        engine.scalar("SELECT sum(v) / count(*) FROM t").unwrap(),
        Value::Float64(2.0)
    );
}

// --- Window functions ---

#[test]
fn rank_and_dense_rank() {
    let mut engine = engine_with_scores();
    let result = engine
        .execute(
            "SELECT name, rank() OVER (ORDER BY score DESC) AS r, \
             dense_rank() OVER (ORDER BY score DESC) AS dr \
             FROM scores ORDER BY r, name",
        )
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![
            vec!["Alice", "1", "1"],
            vec!["Bob", "1", "1"],
            vec!["Charlie", "3", "2"],
            vec!["Dave", "3", "2"],
            vec!["Eve", "5", "3"]
        ]
    );
}

#[test]
fn row_number_and_partition_locality() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (grp String, v Int64); \
             INSERT INTO t VALUES ('a', 10), ('b', 5), ('a', 20), ('b', 15), ('a', 30);",
        )
        .unwrap();
    let result = engine
        .execute(
            "SELECT grp, v, row_number() OVER (PARTITION BY grp ORDER BY v) AS rn \
             FROM t ORDER BY grp, v",
        )
        .unwrap();
    // Numbering restarts per partition.
    assert_eq!(
        rows_as_strings(&result),
        vec![
            vec!["a", "10", "1"],
            vec!["a", "20", "2"],
            vec!["a", "30", "3"],
            vec!["b", "5", "1"],
            vec!["b", "15", "2"]
        ]
    );
}

#[test]
fn lag_and_lead() {
    let mut engine = Engine::new();
    let result = engine
        .execute(
            "SELECT number, lag(number) OVER (ORDER BY number) AS prev, \
             lead(number, 1, 99) OVER (ORDER BY number) AS next \
             FROM numbers(5) ORDER BY number",
        )
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![
            vec!["0", "NULL", "1"],
            vec!["1", "0", "2"],
            vec!["2", "1", "3"],
            vec!["3", "2", "4"],
            vec!["4", "3", "99"]
        ]
    );
}

#[test]
fn ntile_buckets() {
    let mut engine = Engine::new();
    let result = engine
        .execute(
            "SELECT number, ntile(2) OVER (ORDER BY number) AS bucket \
             FROM numbers(5) ORDER BY number",
        )
        .unwrap();
    assert_eq!(
        column(&result, 1),
        vec![
            Value::UInt64(1),
            Value::UInt64(1),
            Value::UInt64(1),
            Value::UInt64(2),
            Value::UInt64(2)
        ]
    );
}

#[test]
fn first_and_last_value() {
    let mut engine = engine_with_scores();
    let result = engine
        .execute(
            "SELECT name, first_value(name) OVER (ORDER BY score DESC) AS top \
             FROM scores ORDER BY score DESC, name LIMIT 1",
        )
        .unwrap();
    assert_eq!(rows_as_strings(&result), vec![vec!["Alice", "Alice"]]);
}

#[test]
fn windowed_sum_with_default_frame() {
    let mut engine = Engine::new();
    let result = engine
        .execute(
            "SELECT number, sum(number) OVER (ORDER BY number) AS running \
             FROM numbers(4) ORDER BY number",
        )
        .unwrap();
    // Default frame: partition start through the current row.
    assert_eq!(
        column_as_strings(&result),
        vec!["0", "1", "2", "3"]
    );
    assert_eq!(
        column(&result, 1),
        vec![
            Value::Float64(0.0),
            Value::Float64(1.0),
            Value::Float64(3.0),
            Value::Float64(6.0)
        ]
    );
}

#[test]
fn windowed_sum_with_explicit_frame() {
    let mut engine = Engine::new();
    let result = engine
        .execute(
            "SELECT number, sum(number) OVER (ORDER BY number \
             ROWS BETWEEN 1 PRECEDING AND 1 FOLLOWING) AS nearby \
             FROM numbers(4) ORDER BY number",
        )
        .unwrap();
    assert_eq!(
        column(&result, 1),
        vec![
            Value::Float64(1.0),
            Value::Float64(3.0),
            Value::Float64(6.0),
            Value::Float64(5.0)
        ]
    );
}

#[test]
fn window_partition_locality() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (grp String, v Int64); \
             INSERT INTO t VALUES ('a', 1), ('b', 100), ('a', 2), ('b', 200);",
        )
        .unwrap();
    // The default frame runs from the partition start to the current
    // row, and never sees the other partition's rows.
    let result = engine
        .execute(
            "SELECT grp, sum(v) OVER (PARTITION BY grp) AS total FROM t ORDER BY grp, v",
        )
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![
            vec!["a", "1"],
            vec!["a", "3"],
            vec!["b", "100"],
            vec!["b", "300"]
        ]
    );

    // An unbounded frame yields whole-partition totals.
    let result = engine
        .execute(
            "SELECT grp, sum(v) OVER (PARTITION BY grp \
             ROWS BETWEEN UNBOUNDED PRECEDING AND UNBOUNDED FOLLOWING) AS total \
             FROM t ORDER BY grp, v",
        )
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![
            vec!["a", "3"],
            vec!["a", "3"],
            vec!["b", "300"],
            vec!["b", "300"]
        ]
    );
}

#[test]
fn window_expression_arithmetic() {
    let mut engine = Engine::new();
    let result = engine
        .execute(
            "SELECT number, row_number() OVER (ORDER BY number) - 1 AS zero_based \
             FROM numbers(3) ORDER BY number",
        )
        .unwrap();
    assert_eq!(
        column(&result, 1),
        vec![Value::Int64(0), Value::Int64(1), Value::Int64(2)]
    );
}
