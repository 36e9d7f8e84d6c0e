//! Engine driver: fetches one report's corpus in bulk, fans the per-store
//! pipeline out, and writes the artifact. This is the synchronous,
//! CPU-bound core the async worker wraps in `spawn_blocking` and a time
//! budget.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::artifact::write_artifact;
use crate::business_hours::BusinessHoursRow;
use crate::db::Database;
use crate::error::{EngineError, StoreError};
use crate::orchestrator::{run_all_stores, run_all_stores_parallel, ResultRow, StoreInputs, DEFAULT_TZ};
use crate::polls::{left_utc_bound, RawSample, FETCH_WINDOW_MINUTES};
use crate::time_index::floor_minute;

/// One store's inputs, fully resolved and owned, ready to be borrowed into
/// a [`StoreInputs`].
pub(crate) struct OwnedStoreInputs {
    store_id: String,
    samples: Vec<RawSample>,
    schedule: Vec<BusinessHoursRow>,
    tz: Tz,
    now_local: DateTime<Tz>,
}

/// Fetches every input this report needs and resolves per-store timezone,
/// schedule, and anchor. Returns `None` if the corpus has no status data
/// at all (nothing to anchor on).
pub(crate) async fn prepare(
    db: &Database,
    max_stores: usize,
) -> Result<Option<Vec<OwnedStoreInputs>>, EngineError> {
    let Some(anchor) = db.fetch_anchor().await? else {
        return Ok(None);
    };
    let anchor_floor: DateTime<Utc> = floor_minute(anchor);
    let left_utc = left_utc_bound(anchor_floor.with_timezone(&chrono_tz::UTC));
    debug_assert_eq!(
        left_utc,
        anchor_floor - chrono::Duration::minutes(FETCH_WINDOW_MINUTES)
    );

    let all_samples = db.fetch_status_since(left_utc).await?;
    let hours_by_store = db.fetch_hours().await?;
    let tz_by_store = db.fetch_timezones().await?;
    let mut store_ids: Vec<String> = db.fetch_all_store_ids().await?.into_iter().collect();
    store_ids.sort();
    if max_stores > 0 && store_ids.len() > max_stores {
        store_ids.truncate(max_stores);
    }

    let mut samples_by_store: HashMap<String, Vec<RawSample>> = HashMap::new();
    for sample in all_samples {
        samples_by_store.entry(sample.store_id.clone()).or_default().push(sample);
    }

    let mut prepared = Vec::with_capacity(store_ids.len());
    for store_id in store_ids {
        let tz = resolve_tz(&store_id, tz_by_store.get(&store_id));
        let now_local = floor_minute(anchor.with_timezone(&tz));
        let schedule = hours_by_store.get(&store_id).cloned().unwrap_or_default();
        let samples = samples_by_store.remove(&store_id).unwrap_or_default();
        prepared.push(OwnedStoreInputs {
            store_id,
            samples,
            schedule,
            tz,
            now_local,
        });
    }

    Ok(Some(prepared))
}

/// Resolves a store's effective timezone. An invalid IANA zone falls back to
/// UTC rather than excluding the store (§4.3's component-level contract takes
/// precedence over §7's generic input-corruption category for this case;
/// see DESIGN.md).
fn resolve_tz(store_id: &str, declared: Option<&String>) -> Tz {
    match declared {
        None => DEFAULT_TZ,
        Some(raw) => match Tz::from_str(raw) {
            Ok(tz) => tz,
            Err(_) => {
                let err = StoreError::InvalidTimezone {
                    store_id: store_id.to_string(),
                    tz: raw.clone(),
                };
                warn!("{err}");
                chrono_tz::UTC
            }
        },
    }
}

/// Runs the full synchronous engine: prepare, sweep every store, write the
/// artifact. `parallel` selects whether stores are swept across the
/// ambient Rayon pool.
pub(crate) fn run_sync(
    prepared: Vec<OwnedStoreInputs>,
    artifact_dir: &Path,
    report_id: &str,
    parallel: bool,
) -> Result<(String, usize, usize), EngineError> {
    let total_stores = prepared.len();
    let all_inputs: Vec<StoreInputs<'_>> = prepared
        .iter()
        .map(|p| StoreInputs {
            store_id: &p.store_id,
            samples: &p.samples,
            schedule: &p.schedule,
            tz: p.tz,
            now_local: p.now_local,
        })
        .collect();

    let rows: Vec<ResultRow> = if parallel {
        run_all_stores_parallel(all_inputs)
    } else {
        run_all_stores(all_inputs)
    };

    let processed = rows.len();
    let skipped = total_stores - processed;

    let reference = write_artifact(artifact_dir, report_id, rows)?;
    Ok((reference, processed, skipped))
}
