//! Minute-index primitives: the arithmetic substrate every other engine
//! module builds on.
//!
//! A minute index `k` counts whole minutes back from the dataset anchor,
//! with `k = 1` the minute immediately preceding it. The three nested bands
//! are half-open intervals over this index: `H = [1, 61)`, `D = [1, 1441)`,
//! `W = [1, 10081)`.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// A half-open integer interval `[lo, hi)`. Indices grow into the past, so
/// for business-hours segments `lo` is the more recent edge and `hi` the
/// older one, but the pair is always stored with `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub lo: i64,
    pub hi: i64,
}

impl Interval {
    pub fn new(lo: i64, hi: i64) -> Self {
        debug_assert!(lo <= hi, "interval must be non-decreasing: {lo}..{hi}");
        Interval { lo, hi }
    }

    pub fn len(self) -> i64 {
        (self.hi - self.lo).max(0)
    }

    pub fn is_empty(self) -> bool {
        self.hi <= self.lo
    }
}

pub const HOUR: Interval = Interval { lo: 1, hi: 61 };
pub const DAY: Interval = Interval { lo: 1, hi: 1441 };
pub const WEEK: Interval = Interval { lo: 1, hi: 10081 };

/// The overlap length of two half-open integer intervals.
pub fn overlap(a: Interval, b: Interval) -> i64 {
    (a.hi.min(b.hi) - a.lo.max(b.lo)).max(0)
}

/// Zeroes seconds and sub-second components.
pub fn floor_minute<Tz2: TimeZone>(t: DateTime<Tz2>) -> DateTime<Tz2> {
    t - Duration::seconds(t.timestamp() % 60) - Duration::nanoseconds(t.timestamp_subsec_nanos() as i64)
}

/// Rounds up to the next minute boundary, unless `t` already lands on one.
pub fn ceil_minute<Tz2: TimeZone>(t: DateTime<Tz2>) -> DateTime<Tz2> {
    let floored = floor_minute(t.clone());
    if floored == t {
        floored
    } else {
        floored + Duration::minutes(1)
    }
}

/// `k(t_local) = max(1, floor(Delta minutes) + 1)` where `Delta = now_local - t_local`.
///
/// Both operands must already be in the same zone. A `t_local` at or after
/// `now_local` clamps to index 1 (the sweep never needs negative indices).
pub fn minute_index(t_local: DateTime<Tz>, now_local: DateTime<Tz>) -> i64 {
    let delta_minutes = (now_local - t_local).num_seconds().div_euclid(60);
    (delta_minutes + 1).max(1)
}

/// DST-safe localization of a naive wall-clock time.
///
/// - Ambiguous (fall-back) wall-times resolve to the *later* instance.
/// - Non-existent (spring-forward) wall-times are shifted forward by one
///   hour before localizing, then resolved again (which is always
///   unambiguous for the one-hour DST transitions this engine targets).
///
/// This policy is deterministic and must stay stable across releases —
/// changing it changes every historical report.
pub fn localize(tz: Tz, naive_wall: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive_wall) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(_earliest, latest) => latest,
        chrono::LocalResult::None => {
            let shifted = naive_wall + Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                chrono::LocalResult::Single(dt) => dt,
                chrono::LocalResult::Ambiguous(_earliest, latest) => latest,
                chrono::LocalResult::None => {
                    // Pathological (e.g. a zone with >1h transitions); keep
                    // shifting until we land on solid ground.
                    let mut candidate = shifted;
                    loop {
                        candidate += Duration::hours(1);
                        if let chrono::LocalResult::Single(dt) = tz.from_local_datetime(&candidate) {
                            break dt;
                        }
                    }
                }
            }
        }
    }
}
