//! End-to-end engine tests against a scratch Postgres schema, driven
//! entirely through the crate's public surface (the job lifecycle and the
//! read-only corpus queries), since the engine's own internals are
//! crate-private.
//!
//! ```bash
//! TEST_DATABASE_URL=postgres://... TEST_REDIS_URL=redis://... \
//!     cargo test --test engine_integration -- --test-threads=1
//! ```

mod common;

use std::sync::Arc;
use std::time::Duration;

use storehealth::config::{Command, Config};
use storehealth::db::reports::ReportStatus;
use storehealth::metrics::Metrics;

macro_rules! require_backends {
    () => {
        if common::test_db_url().is_none() {
            eprintln!("Skipping: TEST_DATABASE_URL not set");
            return;
        }
    };
}

macro_rules! require_queue {
    () => {
        if common::test_db_url().is_none() || common::test_redis_url().is_none() {
            eprintln!("Skipping: TEST_DATABASE_URL and TEST_REDIS_URL must both be set");
            return;
        }
    };
}

#[tokio::test]
async fn anchor_is_the_newest_status_timestamp() {
    require_backends!();
    let db = common::setup_test_db().await;

    sqlx::query("INSERT INTO status (store_id, status, ts_utc) VALUES ($1, $2, $3), ($1, $2, $4)")
        .bind("store-1")
        .bind("active")
        .bind("2024-10-14T11:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap())
        .bind("2024-10-14T12:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap())
        .execute(db.pool())
        .await
        .unwrap();

    let anchor = db.fetch_anchor().await.unwrap().unwrap();
    assert_eq!(anchor.to_rfc3339(), "2024-10-14T12:00:00+00:00");
}

#[tokio::test]
async fn anchor_is_none_when_the_corpus_is_empty() {
    require_backends!();
    let db = common::setup_test_db().await;
    assert!(db.fetch_anchor().await.unwrap().is_none());
}

#[tokio::test]
async fn store_ids_union_all_three_input_tables() {
    require_backends!();
    let db = common::setup_test_db().await;

    sqlx::query("INSERT INTO status (store_id, status, ts_utc) VALUES ('s1', 'active', now())")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO hours (store_id, day_of_week, start_local, end_local) VALUES ('s2', 0, '09:00', '17:00')")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO timezones (store_id, tz) VALUES ('s3', 'UTC')")
        .execute(db.pool())
        .await
        .unwrap();

    let mut ids: Vec<String> = db.fetch_all_store_ids().await.unwrap().into_iter().collect();
    ids.sort();
    assert_eq!(ids, vec!["s1".to_string(), "s2".to_string(), "s3".to_string()]);
}

/// Drives the full trigger -> worker -> complete pipeline end to end,
/// against Postgres and Redis, through the same HTTP-facing job table the
/// `/trigger_report` and `/get_report` handlers use.
#[tokio::test]
async fn full_pipeline_produces_a_complete_report_with_an_artifact() {
    require_queue!();
    let db = common::setup_test_db().await;
    let queue = common::setup_test_queue().await;
    let dir = tempfile::tempdir().unwrap();

    let base: chrono::DateTime<chrono::Utc> = "2024-10-14T12:00:00Z".parse().unwrap();
    for store in ["store-b", "store-a"] {
        let mut t = 0i64;
        while t <= 10080 * 60 {
            let ts = base - chrono::Duration::seconds(t);
            sqlx::query("INSERT INTO status (store_id, status, ts_utc) VALUES ($1, 'active', $2)")
                .bind(store)
                .bind(ts)
                .execute(db.pool())
                .await
                .unwrap();
            t += 600;
        }
    }

    let metrics = Arc::new(Metrics::new());
    let report_id = storehealth::report::trigger(&db, &queue, &metrics).await.unwrap();

    let config = Config {
        database_url: common::test_db_url().unwrap(),
        redis_url: common::test_redis_url().unwrap(),
        port: 0,
        static_dir: dir.path().to_path_buf(),
        max_stores: 0,
        soft_timeout_secs: 60,
        hard_timeout_secs: 30,
        parallel: false,
        command: Command::Worker,
    };

    let worker_db = db.clone();
    let worker_queue = queue.clone();
    let worker_metrics = metrics.clone();
    let worker_handle = tokio::spawn(async move {
        storehealth::worker::run_forever(worker_db, worker_queue, config, worker_metrics).await;
    });

    let mut status = ReportStatus::Pending;
    for _ in 0..100 {
        if let Some(record) = db.get_report(&report_id).await.unwrap() {
            status = record.status;
            if status.is_terminal() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    worker_handle.abort();

    assert_eq!(status, ReportStatus::Complete);
    let record = db.get_report(&report_id).await.unwrap().unwrap();
    let url = record.url.expect("completed report must carry a url");
    assert!(url.contains(&report_id));

    let written = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().ends_with(".csv"));
    assert!(written, "worker must have written a csv artifact to static_dir");
}
