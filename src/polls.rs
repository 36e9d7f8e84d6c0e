//! Poll loader & normalizer: turns sparse, irregularly timed UTC status
//! samples into an ordered, deduplicated sequence of `(k, status)` pairs.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::error::EngineError;
use crate::spans::Poll;
use crate::status::Status;
use crate::time_index::{floor_minute, minute_index, WEEK};

/// Minutes of pre-window buffer kept so a seed sample can be found just
/// outside the week band (§4.2).
pub const SEED_BUFFER_MINUTES: i64 = 1440;

/// Total minutes the bulk fetch must look back from the anchor: the week
/// window plus the seed buffer.
pub const FETCH_WINDOW_MINUTES: i64 = (WEEK.hi - 1) + SEED_BUFFER_MINUTES;

/// A raw status sample as read from the `status` table, with its timestamp
/// already parsed to an absolute UTC instant.
#[derive(Debug, Clone)]
pub struct RawSample {
    pub store_id: String,
    pub status: String,
    pub ts_utc: DateTime<Utc>,
}

/// Strips a legacy trailing `" UTC"` literal and parses the remainder as an
/// RFC 3339 or "YYYY-MM-DD HH:MM:SS" timestamp.
///
/// Malformed timestamps are a fatal, whole-report error: they indicate the
/// ingestion pipeline itself is broken, not a single store's data.
pub fn parse_ts_utc(raw: &str) -> Result<DateTime<Utc>, EngineError> {
    let trimmed = raw.trim().trim_end_matches(" UTC").trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    Err(EngineError::MalformedTimestamp(raw.to_string()))
}

/// The inclusive UTC lower bound for the bulk fetch: `now_local` minus the
/// week window and the seed buffer, converted to UTC. Depends only on the
/// anchor instant, so it is identical for every store and can back a
/// single bulk query for the whole report.
pub fn left_utc_bound(now_local: DateTime<Tz>) -> DateTime<Utc> {
    (now_local - Duration::minutes(FETCH_WINDOW_MINUTES)).with_timezone(&Utc)
}

/// Normalizes one store's raw samples (already filtered to `ts_utc >=
/// left_utc_bound(now_local)`) into an ascending-by-`k` poll sequence.
///
/// Unknown status strings are dropped. Within a minute, the sample with the
/// latest original UTC timestamp wins (the dedup rule). An empty result
/// means the store has zero in-window polls and must be excluded upstream
/// — this function does not itself decide exclusion, it just reports what
/// survived.
pub fn normalize_polls(samples: &[RawSample], tz: Tz, now_local: DateTime<Tz>) -> Vec<Poll> {
    use std::collections::HashMap;

    let mut latest_by_minute: HashMap<i64, (DateTime<Utc>, Status)> = HashMap::new();

    for sample in samples {
        let Some(status) = Status::parse(&sample.status) else {
            continue;
        };
        let local = sample.ts_utc.with_timezone(&tz);
        let floored = floor_minute(local);
        let k = minute_index(floored, now_local);

        latest_by_minute
            .entry(k)
            .and_modify(|(ts, st)| {
                if sample.ts_utc > *ts {
                    *ts = sample.ts_utc;
                    *st = status;
                }
            })
            .or_insert((sample.ts_utc, status));
    }

    let mut polls: Vec<Poll> = latest_by_minute
        .into_iter()
        .map(|(k, (_, status))| Poll { k, status })
        .collect();
    polls.sort_by_key(|p| p.k);
    polls
}
