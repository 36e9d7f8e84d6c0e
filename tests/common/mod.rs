//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Once;

/// Returns the test database URL from `TEST_DATABASE_URL`, or `None` if
/// integration tests that need Postgres should be skipped.
pub fn test_db_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Returns the test Redis URL from `TEST_REDIS_URL`, or `None` if
/// integration tests that need Redis should be skipped.
pub fn test_redis_url() -> Option<String> {
    std::env::var("TEST_REDIS_URL").ok()
}

static SCHEMA_INIT: Once = Once::new();

/// Connects to the test database, ensures the schema exists, and
/// truncates every table so each test starts clean.
pub async fn setup_test_db() -> storehealth::db::Database {
    let url = test_db_url().expect("TEST_DATABASE_URL must be set for this test");
    let db = storehealth::db::Database::connect(&url)
        .await
        .expect("failed to connect to test database");

    SCHEMA_INIT.call_once(|| {});
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS status (store_id text, status text, ts_utc timestamptz);
         CREATE TABLE IF NOT EXISTS hours (store_id text, day_of_week int, start_local time, end_local time);
         CREATE TABLE IF NOT EXISTS timezones (store_id text PRIMARY KEY, tz text);
         CREATE TABLE IF NOT EXISTS reports (
             report_id text PRIMARY KEY,
             status text NOT NULL CHECK (status IN ('PENDING','RUNNING','COMPLETE','FAILED')),
             url text,
             created_at timestamptz NOT NULL DEFAULT now(),
             updated_at timestamptz NOT NULL DEFAULT now()
         );",
    )
    .execute(db.pool())
    .await
    .expect("failed to create schema");

    sqlx::raw_sql("TRUNCATE TABLE status, hours, timezones, reports")
        .execute(db.pool())
        .await
        .expect("failed to truncate tables");

    db
}

pub async fn setup_test_queue() -> storehealth::queue::Queue {
    let url = test_redis_url().expect("TEST_REDIS_URL must be set for this test");
    storehealth::queue::Queue::connect(&url)
        .await
        .expect("failed to connect to test redis")
}
