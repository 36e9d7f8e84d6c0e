//! CRUD operations on the `reports` job table.
//!
//! ```sql
//! CREATE TABLE reports (
//!     report_id   text PRIMARY KEY,
//!     status      text NOT NULL CHECK (status IN ('PENDING','RUNNING','COMPLETE','FAILED')),
//!     url         text,
//!     created_at  timestamptz NOT NULL DEFAULT now(),
//!     updated_at  timestamptz NOT NULL DEFAULT now()
//! );
//! CREATE INDEX reports_status_idx ON reports (status);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

impl ReportStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReportStatus::Complete | ReportStatus::Failed)
    }

    pub fn is_active(self) -> bool {
        matches!(self, ReportStatus::Pending | ReportStatus::Running)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Running => "RUNNING",
            ReportStatus::Complete => "COMPLETE",
            ReportStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReportStatus::Pending),
            "RUNNING" => Ok(ReportStatus::Running),
            "COMPLETE" => Ok(ReportStatus::Complete),
            "FAILED" => Ok(ReportStatus::Failed),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub report_id: String,
    pub status: ReportStatus,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RawReportRow {
    report_id: String,
    status: String,
    url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RawReportRow> for ReportRow {
    type Error = String;

    fn try_from(raw: RawReportRow) -> Result<Self, Self::Error> {
        Ok(ReportRow {
            report_id: raw.report_id,
            status: raw.status.parse()?,
            url: raw.url,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

impl Database {
    /// Finds the single record currently in Pending or Running state, if any.
    pub async fn find_active_report(&self) -> Result<Option<ReportRow>, sqlx::Error> {
        let raw = sqlx::query_as::<_, RawReportRow>(
            "SELECT report_id, status, url, created_at, updated_at
             FROM reports
             WHERE status IN ('PENDING', 'RUNNING')
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(raw.map(|r| r.try_into().expect("status check constraint guarantees valid enum")))
    }

    pub async fn get_report(&self, report_id: &str) -> Result<Option<ReportRow>, sqlx::Error> {
        let raw = sqlx::query_as::<_, RawReportRow>(
            "SELECT report_id, status, url, created_at, updated_at
             FROM reports WHERE report_id = $1",
        )
        .bind(report_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(raw.map(|r| r.try_into().expect("status check constraint guarantees valid enum")))
    }

    /// Inserts a new Pending record. Caller is responsible for enqueueing
    /// the work item only after this commits, so the worker always finds
    /// the row when it dequeues.
    pub async fn insert_pending_report(&self, report_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO reports (report_id, status) VALUES ($1, 'PENDING')",
        )
        .bind(report_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn transition_running(&self, report_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE reports SET status = 'RUNNING', updated_at = now()
             WHERE report_id = $1 AND status = 'PENDING'",
        )
        .bind(report_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn transition_complete(&self, report_id: &str, url: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE reports SET status = 'COMPLETE', url = $2, updated_at = now()
             WHERE report_id = $1 AND status = 'RUNNING'",
        )
        .bind(report_id)
        .bind(url)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn transition_failed(&self, report_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE reports SET status = 'FAILED', updated_at = now()
             WHERE report_id = $1 AND status IN ('PENDING', 'RUNNING')",
        )
        .bind(report_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Reclaims reports stuck in Running past the hard time budget back to
    /// Failed, so a retriggered report is not starved behind a dead worker.
    /// Runs as periodic housekeeping between queue pops.
    pub async fn reclaim_stale_running(&self, hard_timeout_secs: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reports SET status = 'FAILED', updated_at = now()
             WHERE status = 'RUNNING'
               AND updated_at < now() - ($1 || ' seconds')::interval",
        )
        .bind(hard_timeout_secs.to_string())
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }
}
