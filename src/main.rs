//! # Main — CLI Entry Point
//!
//! Routes the `serve`/`worker`/`migrate` subcommands to their respective
//! startup paths. `serve` runs the Axum HTTP server with an in-process
//! worker task; `worker` runs only the background loop, for deployments
//! that want the two tiers scaled independently.

use std::sync::Arc;

use anyhow::Result;

use storehealth::config::{Command, Config};
use storehealth::db::Database;
use storehealth::http::{build_router, AppState};
use storehealth::metrics::Metrics;
use storehealth::queue::Queue;
use storehealth::worker;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load();
    let db = Database::connect(&config.database_url).await?;

    if matches!(config.command, Command::Migrate) {
        run_migrations(&db).await?;
        tracing::info!("migrations applied");
        return Ok(());
    }

    run_migrations(&db).await?;
    let queue = Queue::connect(&config.redis_url).await?;
    let metrics = Arc::new(Metrics::new());

    match config.command.clone() {
        Command::Worker => {
            tracing::info!("starting worker-only process");
            worker::run_forever(db, queue, config, metrics).await;
        }
        Command::Serve => {
            let port = config.port;
            tokio::spawn(worker::run_forever(
                db.clone(),
                queue.clone(),
                config.clone(),
                metrics.clone(),
            ));

            let state = Arc::new(AppState {
                db,
                queue,
                metrics,
                config,
            });
            let router = build_router(state);

            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
            tracing::info!(port, "storehealth listening");
            axum::serve(listener, router).await?;
        }
        Command::Migrate => unreachable!("handled above"),
    }

    Ok(())
}

/// Initializes structured logging. `LOG_FORMAT=json` selects JSON output
/// for container platforms; otherwise a human-readable formatter writes to
/// stderr.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    if json {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

/// Idempotent schema setup. Mirrors the table definitions documented in
/// `db::reports` and `db::corpus` so a fresh environment can stand the
/// service up with no external migration tool.
async fn run_migrations(db: &Database) -> Result<()> {
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS status (
            store_id text NOT NULL,
            status   text NOT NULL,
            ts_utc   timestamptz NOT NULL
        );
        CREATE INDEX IF NOT EXISTS status_store_ts_idx ON status (store_id, ts_utc);

        CREATE TABLE IF NOT EXISTS hours (
            store_id    text NOT NULL,
            day_of_week int  NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            start_local time NOT NULL,
            end_local   time NOT NULL
        );
        CREATE INDEX IF NOT EXISTS hours_store_idx ON hours (store_id);

        CREATE TABLE IF NOT EXISTS timezones (
            store_id text PRIMARY KEY,
            tz       text NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reports (
            report_id  text PRIMARY KEY,
            status     text NOT NULL CHECK (status IN ('PENDING','RUNNING','COMPLETE','FAILED')),
            url        text,
            created_at timestamptz NOT NULL DEFAULT now(),
            updated_at timestamptz NOT NULL DEFAULT now()
        );
        CREATE INDEX IF NOT EXISTS reports_status_idx ON reports (status);
        "#,
    )
    .execute(db.pool())
    .await?;
    Ok(())
}
