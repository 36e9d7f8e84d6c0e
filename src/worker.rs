//! Background worker tier: pops report ids off the queue, runs the engine
//! under a time budget, and drives the job state machine to a terminal
//! state.
//!
//! Delivery is at-least-once; the worker is idempotent because terminal
//! states short-circuit (§4.9 queue contract).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::reports::ReportStatus;
use crate::db::Database;
use crate::engine;
use crate::metrics::Metrics;
use crate::queue::Queue;

/// Seconds to block on a queue pop before running housekeeping and
/// checking again. Keeps the worker responsive to stale-report reclamation
/// without busy-polling.
const POLL_TIMEOUT_SECS: f64 = 5.0;

/// Runs the worker loop forever. Call this from a `tokio::spawn`ed task
/// (the default `serve` deployment) or from the standalone `worker`
/// subcommand.
pub async fn run_forever(db: Database, queue: Queue, config: Config, metrics: std::sync::Arc<Metrics>) {
    loop {
        match queue.dequeue(POLL_TIMEOUT_SECS).await {
            Ok(Some(task)) => {
                let max_stores = task.max_stores.unwrap_or(config.max_stores);
                if let Err(e) = process_one(&db, &config, &metrics, &task.report_id, max_stores).await {
                    error!(report_id = %task.report_id, error = %e, "worker failed to process report");
                }
            }
            Ok(None) => {
                if let Ok(reclaimed) = db.reclaim_stale_running(config.hard_timeout_secs as i64).await {
                    if reclaimed > 0 {
                        warn!(count = reclaimed, "reclaimed stale Running reports to Failed");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "queue dequeue failed; backing off");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Processes exactly one report: Pending/Running guard, run the pipeline
/// under the hard time budget, then Complete or Failed. `max_stores` is the
/// task's own override of the per-report store cap (falling back to
/// `config.max_stores` when the queue payload didn't set one).
async fn process_one(
    db: &Database,
    config: &Config,
    metrics: &Metrics,
    report_id: &str,
    max_stores: usize,
) -> Result<(), sqlx::Error> {
    let Some(record) = db.get_report(report_id).await? else {
        warn!(report_id = %report_id, "worker popped an id with no matching row; dropping");
        return Ok(());
    };

    if record.status.is_terminal() {
        info!(report_id = %report_id, status = %record.status, "report already terminal, short-circuiting");
        return Ok(());
    }

    if record.status == ReportStatus::Pending {
        db.transition_running(report_id).await?;
    }

    info!(report_id = %report_id, "worker starting report");
    let started = Instant::now();

    let hard_timeout = Duration::from_secs(config.hard_timeout_secs);
    let soft_timeout = Duration::from_secs(config.soft_timeout_secs);

    let outcome = tokio::time::timeout(hard_timeout, run_pipeline(db, config, report_id, max_stores)).await;

    let elapsed = started.elapsed();
    if elapsed > soft_timeout {
        warn!(report_id = %report_id, elapsed_secs = elapsed.as_secs(), "report exceeded its soft time budget");
    }

    match outcome {
        Ok(Ok((url, processed, skipped))) => {
            db.transition_complete(report_id, &url).await?;
            metrics.reports_completed.inc();
            metrics.stores_processed.inc_by(processed as u64);
            metrics.stores_skipped.inc_by(skipped as u64);
            metrics
                .last_report_duration_seconds
                .set(elapsed.as_secs_f64());
            info!(report_id = %report_id, processed, skipped, elapsed_secs = elapsed.as_secs(), "report complete");
        }
        Ok(Err(e)) => {
            error!(report_id = %report_id, error = %e, "report failed");
            db.transition_failed(report_id).await?;
            metrics.reports_failed.inc();
        }
        Err(_elapsed) => {
            error!(report_id = %report_id, "report exceeded hard time budget, failing job");
            db.transition_failed(report_id).await?;
            metrics.reports_failed.inc();
        }
    }

    Ok(())
}

async fn run_pipeline(
    db: &Database,
    config: &Config,
    report_id: &str,
    max_stores: usize,
) -> Result<(String, usize, usize), crate::error::EngineError> {
    let Some(prepared) = engine::prepare(db, max_stores).await? else {
        // No status data at all in the corpus: emit an empty artifact.
        let dir = config.static_dir.clone();
        let report_id = report_id.to_string();
        return tokio::task::spawn_blocking(move || {
            let reference = crate::artifact::write_artifact(&dir, &report_id, Vec::new())?;
            Ok::<_, crate::error::EngineError>((reference, 0usize, 0usize))
        })
        .await
        .expect("artifact-write task panicked");
    };

    let dir: PathBuf = config.static_dir.clone();
    let report_id = report_id.to_string();
    let parallel = config.parallel;
    tokio::task::spawn_blocking(move || engine::run_sync(prepared, &dir, &report_id, parallel))
        .await
        .expect("engine task panicked")
}
