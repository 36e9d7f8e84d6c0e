//! Redis-backed queue adapter.
//!
//! A single list (`reports:queue`) carries JSON-encoded `(report_id,
//! max_stores)` payloads. `trigger()` RPUSHes after the Postgres insert
//! commits; the worker tier BLPOPs with a bounded timeout so it can
//! interleave periodic stale-report reclamation between pops.

use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};

const QUEUE_KEY: &str = "reports:queue";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTask {
    pub report_id: String,
    pub max_stores: Option<usize>,
}

#[derive(Clone)]
pub struct Queue {
    conn: ConnectionManager,
}

impl Queue {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Queue { conn })
    }

    /// Pushes a work item. Caller must only invoke this after the
    /// corresponding Postgres insert has committed.
    pub async fn enqueue(&self, task: &ReportTask) -> Result<(), redis::RedisError> {
        let payload = serde_json::to_string(task).expect("ReportTask always serializes");
        let mut conn = self.conn.clone();
        redis::cmd("RPUSH")
            .arg(QUEUE_KEY)
            .arg(payload)
            .query_async::<()>(&mut conn)
            .await
    }

    /// Blocks up to `timeout_secs` for the next work item. Returns `None`
    /// on timeout, giving the caller a chance to run housekeeping (stale
    /// reclamation) between pops.
    pub async fn dequeue(&self, timeout_secs: f64) -> Result<Option<ReportTask>, redis::RedisError> {
        let mut conn = self.conn.clone();
        let reply: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(QUEUE_KEY)
            .arg(timeout_secs)
            .query_async(&mut conn)
            .await?;
        Ok(reply.and_then(|(_key, payload)| serde_json::from_str(&payload).ok()))
    }

    /// Bounded-timeout liveness probe used by `/readyz`.
    pub async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
