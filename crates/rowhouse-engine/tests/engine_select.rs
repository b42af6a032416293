//! End-to-end SELECT behavior: filtering, ordering, limits, DISTINCT,
//! expressions, table functions, and NULL semantics.

mod common;
use common::*;

use rowhouse_engine::{Engine, EngineError, ErrorKind, Value};

#[test]
fn filter_and_order() {
    let mut engine = engine_with_users();
    let result = engine
        .execute("SELECT name, age FROM users WHERE age > 25 ORDER BY age")
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![vec!["Alice", "30"], vec!["Charlie", "35"]]
    );
}

#[test]
fn select_without_from() {
    let mut engine = Engine::new();
    let result = engine.execute("SELECT 1 + 2 * 3 AS answer").unwrap();
    assert_eq!(result.columns[0].name, "answer");
    assert_eq!(result.rows, vec![vec![Value::Int64(7)]]);
}

#[test]
fn star_expansion_keeps_column_order() {
    let mut engine = engine_with_users();
    let result = engine.execute("SELECT * FROM users LIMIT 1").unwrap();
    let names: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "age"]);
}

#[test]
fn qualified_star() {
    let mut engine = engine_with_users();
    let result = engine
        .execute("SELECT u.* FROM users u WHERE u.id = 2")
        .unwrap();
    assert_eq!(rows_as_strings(&result), vec![vec!["2", "Bob", "25"]]);
}

#[test]
fn order_by_desc_and_alias_resolution() {
    let mut engine = engine_with_users();
    let result = engine
        .execute("SELECT age * 2 AS doubled FROM users ORDER BY doubled DESC")
        .unwrap();
    assert_eq!(
        column(&result, 0),
        vec![Value::Int64(70), Value::Int64(60), Value::Int64(50)]
    );
}

#[test]
fn order_by_is_stable() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (k Int64, v String); \
             INSERT INTO t VALUES (1, 'a'), (2, 'b'), (1, 'c'), (2, 'd'), (1, 'e');",
        )
        .unwrap();
    let result = engine.execute("SELECT v FROM t ORDER BY k").unwrap();
    // Equal keys keep their relative order.
    assert_eq!(column_as_strings(&result), vec!["a", "c", "e", "b", "d"]);
}

#[test]
fn nulls_order_first_even_descending() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (v Nullable(Int64)); \
             INSERT INTO t VALUES (2), (NULL), (1);",
        )
        .unwrap();
    let asc = engine.execute("SELECT v FROM t ORDER BY v").unwrap();
    assert_eq!(column_as_strings(&asc), vec!["NULL", "1", "2"]);
    let desc = engine.execute("SELECT v FROM t ORDER BY v DESC").unwrap();
    assert_eq!(column_as_strings(&desc), vec!["NULL", "2", "1"]);
}

#[test]
fn limit_and_offset() {
    let mut engine = Engine::new();
    let result = engine
        .execute("SELECT number FROM numbers(10) LIMIT 3 OFFSET 4")
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["4", "5", "6"]);

    let result = engine
        .execute("SELECT number FROM numbers(10) LIMIT 4, 3")
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["4", "5", "6"]);
}

#[test]
fn distinct_deduplicates() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (v Int64); INSERT INTO t VALUES (1), (2), (1), (3), (2);",
        )
        .unwrap();
    let result = engine.execute("SELECT DISTINCT v FROM t ORDER BY v").unwrap();
    assert_eq!(column_as_strings(&result), vec!["1", "2", "3"]);
}

#[test]
fn table_functions() {
    let mut engine = Engine::new();
    let result = engine.execute("SELECT number FROM numbers(3, 10)").unwrap();
    assert_eq!(column_as_strings(&result), vec!["10", "11", "12"]);

    let result = engine.execute("SELECT zero FROM zeros(2)").unwrap();
    assert_eq!(result.rows.len(), 2);

    let result = engine.execute("SELECT dummy FROM one()").unwrap();
    assert_eq!(result.rows, vec![vec![Value::UInt8(0)]]);
}

#[test]
fn null_propagation_in_comparisons() {
    let mut engine = Engine::new();
    // Comparisons with NULL yield NULL; IS NULL is the exception.
    let result = engine
        .execute("SELECT NULL = NULL, NULL < 1, 1 != NULL, NULL IS NULL, 1 IS NOT NULL")
        .unwrap();
    assert_eq!(
        result.rows[0],
        vec![
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Bool(true),
            Value::Bool(true)
        ]
    );
}

#[test]
fn where_treats_null_as_not_matching() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (v Nullable(Int64)); \
             INSERT INTO t VALUES (1), (NULL), (3);",
        )
        .unwrap();
    let result = engine.execute("SELECT v FROM t WHERE v < 5").unwrap();
    assert_eq!(result.rows.len(), 2);
}

#[test]
fn array_indexing_is_one_based_with_null_oob() {
    let mut engine = Engine::new();
    let result = engine
        .execute("SELECT [10, 20, 30][1], [10, 20, 30][3], [10, 20, 30][4], [10, 20, 30][0]")
        .unwrap();
    assert_eq!(
        result.rows[0],
        vec![
            Value::Int64(10),
            Value::Int64(30),
            Value::Null,
            Value::Null
        ]
    );
}

#[test]
fn tuple_member_and_map_index() {
    let mut engine = Engine::new();
    let result = engine.execute("SELECT (1, 'two').2").unwrap();
    assert_eq!(result.rows[0][0].to_string(), "two");

    let result = engine
        .execute("SELECT map('a', 1, 'b', 2)['b'], map('a', 1)['missing']")
        .unwrap();
    assert_eq!(result.rows[0][0], Value::Int64(2));
    assert_eq!(result.rows[0][1], Value::Null);
}

#[test]
fn like_and_ilike() {
    let mut engine = engine_with_users();
    let result = engine
        .execute("SELECT name FROM users WHERE name LIKE 'A%'")
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["Alice"]);

    let result = engine
        .execute("SELECT name FROM users WHERE name ILIKE '%B%' ORDER BY name")
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["Bob"]);

    let result = engine
        .execute("SELECT name FROM users WHERE name LIKE '_ob'")
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["Bob"]);
}

#[test]
fn case_expressions() {
    let mut engine = engine_with_users();
    let result = engine
        .execute(
            "SELECT name, CASE WHEN age >= 30 THEN 'senior' ELSE 'junior' END AS band \
             FROM users ORDER BY id",
        )
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![
            vec!["Alice", "senior"],
            vec!["Bob", "junior"],
            vec!["Charlie", "senior"]
        ]
    );

    let result = engine
        .execute("SELECT CASE 2 WHEN 1 THEN 'one' WHEN 2 THEN 'two' END")
        .unwrap();
    assert_eq!(result.rows[0][0].to_string(), "two");
}

#[test]
fn ternary_and_cast() {
    let mut engine = Engine::new();
    let result = engine
        .execute("SELECT 5 > 3 ? 'yes' : 'no', CAST('42' AS Int64), '7'::Int64 + 1")
        .unwrap();
    assert_eq!(
        result.rows[0],
        vec![
            Value::String(String::from("yes")),
            Value::Int64(42),
            Value::Int64(8)
        ]
    );
}

#[test]
fn scalar_subquery_and_exists() {
    let mut engine = engine_with_users();
    let result = engine
        .execute("SELECT name FROM users WHERE age = (SELECT max(age) FROM users)")
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["Charlie"]);

    let result = engine
        .execute(
            "SELECT name FROM users u \
             WHERE EXISTS (SELECT 1 FROM users v WHERE v.age > u.age) ORDER BY name",
        )
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["Alice", "Bob"]);
}

#[test]
fn in_list_and_in_subquery() {
    let mut engine = engine_with_users();
    let result = engine
        .execute("SELECT name FROM users WHERE id IN (1, 3) ORDER BY id")
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["Alice", "Charlie"]);

    let result = engine
        .execute(
            "SELECT name FROM users WHERE id NOT IN (SELECT id FROM users WHERE age > 26)",
        )
        .unwrap();
    assert_eq!(column_as_strings(&result), vec!["Bob"]);
}

#[test]
fn array_join_unnests() {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE t (name String, tags Array(String)); \
             INSERT INTO t VALUES ('a', ['x', 'y']), ('b', ['z']);",
        )
        .unwrap();
    let result = engine
        .execute("SELECT name, tag FROM t ARRAY JOIN tags AS tag ORDER BY name, tag")
        .unwrap();
    assert_eq!(
        rows_as_strings(&result),
        vec![vec!["a", "x"], vec!["a", "y"], vec!["b", "z"]]
    );
}

#[test]
fn higher_order_array_functions() {
    let mut engine = Engine::new();
    let result = engine
        .execute("SELECT arrayMap(x -> x * 2, [1, 2, 3]), arrayFilter(x -> x > 1, [1, 2, 3])")
        .unwrap();
    assert_eq!(result.rows[0][0].to_string(), "[2, 4, 6]");
    assert_eq!(result.rows[0][1].to_string(), "[2, 3]");
}

#[test]
fn unknown_column_is_name_error() {
    let mut engine = engine_with_users();
    let err = engine.execute("SELECT nope FROM users").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Name);
    assert!(matches!(err, EngineError::UnknownColumn(_)));
}

#[test]
fn unknown_table_is_name_error() {
    let mut engine = Engine::new();
    let err = engine.execute("SELECT 1 FROM missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Name);
}

#[test]
fn incompatible_comparison_is_type_error() {
    let mut engine = engine_with_users();
    let err = engine
        .execute("SELECT * FROM users WHERE name > 5")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn parse_error_kind() {
    let mut engine = Engine::new();
    let err = engine.execute("SELECT FROM WHERE").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn execute_many_runs_in_order() {
    let mut engine = Engine::new();
    let results = engine
        .execute_many(
            "CREATE TABLE t (v Int64); INSERT INTO t VALUES (1); SELECT v FROM t",
        )
        .unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[1].affected, 1);
    assert_eq!(results[2].rows, vec![vec![Value::Int64(1)]]);
}

#[test]
fn scalar_convenience() {
    let mut engine = Engine::new();
    assert_eq!(engine.scalar("SELECT 40 + 2").unwrap(), Value::Int64(42));
    assert!(engine.scalar("SELECT 1 FROM numbers(0)").is_err());
}

#[test]
fn quoted_identifiers_preserve_case() {
    let mut engine = Engine::new();
    engine
        .execute("CREATE TABLE `MyTable` (`Weird Name` Int64)")
        .unwrap();
    engine
        .execute("INSERT INTO `MyTable` VALUES (5)")
        .unwrap();
    let result = engine
        .execute("SELECT `Weird Name` FROM `MyTable`")
        .unwrap();
    assert_eq!(result.rows, vec![vec![Value::Int64(5)]]);
}
