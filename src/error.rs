//! Error taxonomy for the engine, persistence, and queue layers.
//!
//! Per-store problems (missing tz, bad poll timestamp) are folded into
//! [`StoreError`] and handled by skipping the store. Problems that abort an
//! entire report are [`EngineError`]; HTTP handlers translate these (and
//! `sqlx`/`redis` failures) into 5xx responses.

use thiserror::Error;

/// A problem confined to a single store's pipeline. The orchestrator logs
/// these at `warn` and omits the store from the report rather than failing
/// the whole run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store {store_id} has an invalid IANA timezone {tz:?}, falling back to UTC")]
    InvalidTimezone { store_id: String, tz: String },

    #[error("store {store_id} produced an inconsistent band: uptime {uptime} + downtime {downtime} != budget {budget}")]
    InvariantViolation {
        store_id: String,
        uptime: i64,
        downtime: i64,
        budget: i64,
    },
}

/// A problem that aborts the entire report and fails the job.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed timestamp in status corpus: {0}")]
    MalformedTimestamp(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("queue error: {0}")]
    Queue(#[from] redis::RedisError),

    #[error("artifact write failed: {0}")]
    Artifact(#[from] std::io::Error),

    #[error("report {0} exceeded its hard time budget")]
    TimedOut(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
