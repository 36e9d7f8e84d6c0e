//! Store orchestrator: wires loader, business-hours builder, span builder,
//! and sweep into one per-store pipeline, producing the result row used by
//! the artifact writer.

use chrono_tz::Tz;
use tracing::warn;

use crate::business_hours::{build_bh, BusinessHoursRow};
use crate::error::StoreError;
use crate::polls::{normalize_polls, RawSample};
use crate::spans::build_spans;
use crate::sweep::sweep;

/// The default timezone assumed for a store with no `timezones` row.
pub const DEFAULT_TZ: Tz = chrono_tz::America::Chicago;

/// One emitted row: uptime/downtime minutes and hours across the three bands.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub store_id: String,
    pub uptime_last_hour: i64,
    pub uptime_last_day_hours: f64,
    pub uptime_last_week_hours: f64,
    pub downtime_last_hour: i64,
    pub downtime_last_day_hours: f64,
    pub downtime_last_week_hours: f64,
}

fn minutes_to_hours_rounded(minutes: i64) -> f64 {
    (minutes as f64 / 60.0 * 100.0).round() / 100.0
}

/// All per-store inputs the orchestrator needs, already resolved by the
/// caller (bulk fetch + defaulting). `samples` must already be restricted
/// to this store's partition of the bulk-fetched window.
pub struct StoreInputs<'a> {
    pub store_id: &'a str,
    pub samples: &'a [RawSample],
    pub schedule: &'a [BusinessHoursRow],
    pub tz: Tz,
    pub now_local: chrono::DateTime<Tz>,
}

/// Runs the full pipeline for one store. Returns `Ok(None)` when the store
/// has zero in-window polls (the exclusion rule) and `Err` only for an
/// invariant violation, which the caller logs and skips rather than
/// propagating as a whole-report failure.
pub fn run_store(inputs: StoreInputs) -> Result<Option<ResultRow>, StoreError> {
    let polls = normalize_polls(inputs.samples, inputs.tz, inputs.now_local);
    if polls.is_empty() {
        return Ok(None);
    }

    let bh = build_bh(inputs.schedule, inputs.tz, inputs.now_local);
    let spans = build_spans(&polls);
    let bands = sweep(&bh, &spans);

    for band in [bands.hour, bands.day, bands.week] {
        if band.uptime + band.downtime != band.budget {
            return Err(StoreError::InvariantViolation {
                store_id: inputs.store_id.to_string(),
                uptime: band.uptime,
                downtime: band.downtime,
                budget: band.budget,
            });
        }
    }

    Ok(Some(ResultRow {
        store_id: inputs.store_id.to_string(),
        uptime_last_hour: bands.hour.uptime,
        uptime_last_day_hours: minutes_to_hours_rounded(bands.day.uptime),
        uptime_last_week_hours: minutes_to_hours_rounded(bands.week.uptime),
        downtime_last_hour: bands.hour.downtime,
        downtime_last_day_hours: minutes_to_hours_rounded(bands.day.downtime),
        downtime_last_week_hours: minutes_to_hours_rounded(bands.week.downtime),
    }))
}

/// Runs `run_store` for every store, logging and skipping per-store
/// invariant violations rather than failing the whole report. Stores with
/// zero in-window polls are silently omitted (not logged, per §8's
/// exclusion rule — that is the expected, common case for a sparse corpus).
pub fn run_all_stores<'a, I>(all_inputs: I) -> Vec<ResultRow>
where
    I: IntoIterator<Item = StoreInputs<'a>>,
{
    all_inputs
        .into_iter()
        .filter_map(|inputs| {
            let store_id = inputs.store_id.to_string();
            match run_store(inputs) {
                Ok(row) => row,
                Err(e) => {
                    warn!(store_id = %store_id, error = %e, "skipping store after invariant violation");
                    None
                }
            }
        })
        .collect()
}

/// Same as [`run_all_stores`] but fans each store's pipeline out across the
/// ambient Rayon pool. Each task reads only its own input partition; the
/// only shared state is the result vector, collected once after every task
/// resolves.
pub fn run_all_stores_parallel(all_inputs: Vec<StoreInputs<'_>>) -> Vec<ResultRow> {
    use rayon::prelude::*;

    all_inputs
        .into_par_iter()
        .filter_map(|inputs| {
            let store_id = inputs.store_id.to_string();
            match run_store(inputs) {
                Ok(row) => row,
                Err(e) => {
                    warn!(store_id = %store_id, error = %e, "skipping store after invariant violation");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status;
    use chrono::{DateTime, Utc};
    use chrono_tz::UTC;

    fn sample(status: &str, secs_ago: i64, base: DateTime<Utc>) -> RawSample {
        RawSample {
            store_id: "s1".into(),
            status: status.into(),
            ts_utc: base - chrono::Duration::seconds(secs_ago),
        }
    }

    #[test]
    fn excludes_store_with_zero_in_window_polls() {
        let now: DateTime<Utc> = "2024-10-14T12:00:00Z".parse().unwrap();
        let now_local = now.with_timezone(&UTC);
        let inputs = StoreInputs {
            store_id: "s1",
            samples: &[],
            schedule: &[],
            tz: UTC,
            now_local,
        };
        assert_eq!(run_store(inputs).unwrap(), None);
    }

    #[test]
    fn all_active_week_matches_scenario_1() {
        let now: DateTime<Utc> = "2024-10-14T12:00:00Z".parse().unwrap();
        let now_local = now.with_timezone(&UTC);
        let mut samples = Vec::new();
        let mut t = 0i64;
        while t <= 10080 * 60 {
            samples.push(sample("active", t, now));
            t += 600;
        }
        let inputs = StoreInputs {
            store_id: "s1",
            samples: &samples,
            schedule: &[],
            tz: UTC,
            now_local,
        };
        let row = run_store(inputs).unwrap().unwrap();
        assert_eq!(row.uptime_last_hour, 60);
        assert_eq!(row.uptime_last_day_hours, 24.00);
        assert_eq!(row.uptime_last_week_hours, 168.00);
        assert_eq!(row.downtime_last_hour, 0);
        assert_eq!(row.downtime_last_day_hours, 0.00);
        assert_eq!(row.downtime_last_week_hours, 0.00);
    }

    #[test]
    fn all_inactive_week_matches_scenario_2() {
        let now: DateTime<Utc> = "2024-10-14T12:00:00Z".parse().unwrap();
        let now_local = now.with_timezone(&UTC);
        let mut samples = Vec::new();
        let mut t = 0i64;
        while t <= 10080 * 60 {
            samples.push(sample("inactive", t, now));
            t += 600;
        }
        let inputs = StoreInputs {
            store_id: "s1",
            samples: &samples,
            schedule: &[],
            tz: UTC,
            now_local,
        };
        let row = run_store(inputs).unwrap().unwrap();
        assert_eq!(row.uptime_last_hour, 0);
        assert_eq!(row.downtime_last_hour, 60);
        assert_eq!(row.downtime_last_week_hours, 168.00);
    }

    #[test]
    fn single_transition_mid_hour_matches_scenario_3() {
        let now: DateTime<Utc> = "2024-10-14T12:00:00Z".parse().unwrap();
        let now_local = now.with_timezone(&UTC);
        let samples = vec![
            sample("inactive", 3600, now), // 11:00:00Z
            sample("active", 1800, now),   // 11:30:00Z
        ];
        let inputs = StoreInputs {
            store_id: "s1",
            samples: &samples,
            schedule: &[],
            tz: UTC,
            now_local,
        };
        let row = run_store(inputs).unwrap().unwrap();
        assert_eq!(row.uptime_last_hour, 30);
    }

    #[test]
    fn missing_timezone_defaults_to_america_chicago() {
        assert_eq!(DEFAULT_TZ, chrono_tz::America::Chicago);
        let _ = status::Status::Active;
    }
}
