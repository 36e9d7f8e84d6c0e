//! Job lifecycle: idempotent trigger, the Pending→Running→{Complete,Failed}
//! state machine, and the status view the HTTP layer serves.

use serde::Serialize;
use uuid::Uuid;

use crate::db::reports::ReportStatus;
use crate::db::Database;
use crate::metrics::Metrics;
use crate::queue::{Queue, ReportTask};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum DisplayStatus {
    Running,
    Complete,
    Failed,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Running => "Running",
            DisplayStatus::Complete => "Complete",
            DisplayStatus::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub report_id: String,
    pub status: DisplayStatus,
    pub url: Option<String>,
}

/// Idempotent trigger: if a Pending or Running record already exists,
/// returns its id without enqueueing anything. Otherwise inserts a new
/// Pending record and enqueues exactly one work item, observable in that
/// order so the worker always finds the row.
pub async fn trigger(db: &Database, queue: &Queue, metrics: &Metrics) -> Result<String, sqlx::Error> {
    if let Some(active) = db.find_active_report().await? {
        metrics.reports_triggered.inc();
        return Ok(active.report_id);
    }

    let report_id = Uuid::new_v4().to_string();
    db.insert_pending_report(&report_id).await?;

    if let Err(e) = queue
        .enqueue(&ReportTask {
            report_id: report_id.clone(),
            max_stores: None,
        })
        .await
    {
        tracing::error!(report_id = %report_id, error = %e, "failed to enqueue trigger; leaving row Pending for a manual retry");
    }

    metrics.reports_triggered.inc();
    Ok(report_id)
}

/// Maps the persisted job record to the three public display states.
/// Returns `None` when the id is unknown (the HTTP layer turns that into 404).
pub async fn get_status(db: &Database, report_id: &str) -> Result<Option<StatusView>, sqlx::Error> {
    let Some(record) = db.get_report(report_id).await? else {
        return Ok(None);
    };

    let (status, url) = match record.status {
        ReportStatus::Pending | ReportStatus::Running => (DisplayStatus::Running, None),
        ReportStatus::Failed => (DisplayStatus::Failed, None),
        ReportStatus::Complete => {
            let url = record
                .url
                .as_deref()
                .map(crate::artifact::to_public_url);
            (DisplayStatus::Complete, url)
        }
    };

    Ok(Some(StatusView {
        report_id: record.report_id,
        status,
        url,
    }))
}
