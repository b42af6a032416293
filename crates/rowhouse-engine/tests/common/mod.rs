#![allow(dead_code)]

use rowhouse_engine::{Engine, QueryResult, Value};

/// An engine preloaded with the `users` fixture.
pub fn engine_with_users() -> Engine {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE users (id Int64, name String, age Int64); \
             INSERT INTO users VALUES \
                 (1, 'Alice', 30), \
                 (2, 'Bob', 25), \
                 (3, 'Charlie', 35);",
        )
        .expect("fixture setup");
    engine
}

/// An engine preloaded with `scores` (name, score) for window tests.
pub fn engine_with_scores() -> Engine {
    let mut engine = Engine::new();
    engine
        .execute_many(
            "CREATE TABLE scores (name String, score Int64); \
             INSERT INTO scores VALUES \
                 ('Alice', 90), ('Bob', 90), ('Charlie', 80), \
                 ('Dave', 80), ('Eve', 70);",
        )
        .expect("fixture setup");
    engine
}

/// Renders every row as display strings, for compact assertions.
pub fn rows_as_strings(result: &QueryResult) -> Vec<Vec<String>> {
    result
        .rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect()
}

/// Extracts one output column by position.
pub fn column(result: &QueryResult, index: usize) -> Vec<Value> {
    result.rows.iter().map(|row| row[index].clone()).collect()
}

/// Extracts the first output column as display strings.
pub fn column_as_strings(result: &QueryResult) -> Vec<String> {
    result.rows.iter().map(|row| row[0].to_string()).collect()
}
