//! Business-hours interval builder.
//!
//! Turns a weekly schedule, anchored by `now_local`, into a sorted set of
//! merged half-open minute-index intervals inside `[1, 10081)`. Handles
//! overnight wrap (e.g. 22:00-02:00) and DST transitions near the edges of
//! the inspection window.

use chrono::{Datelike, Duration, NaiveTime};
use chrono_tz::Tz;

use crate::time_index::{ceil_minute, floor_minute, localize, minute_index, Interval, WEEK};

/// One row of the `hours` table: a store's declared open period for a given
/// weekday, in local wall-clock time. Multiple rows per (store, day) are
/// permitted and merged by [`build_bh`].
#[derive(Debug, Clone)]
pub struct BusinessHoursRow {
    /// 0 = Monday .. 6 = Sunday, matching `chrono::Weekday::num_days_from_monday`.
    pub day_of_week: u32,
    pub start_local: NaiveTime,
    pub end_local: NaiveTime,
}

/// Builds the merged, sorted, pairwise-disjoint set of business-hours
/// intervals for one store, anchored at `now_local`.
///
/// An empty `schedule` means the store is open 24x7, matching §4.3's
/// edge policy.
pub fn build_bh(schedule: &[BusinessHoursRow], tz: Tz, now_local: chrono::DateTime<Tz>) -> Vec<Interval> {
    if schedule.is_empty() {
        return vec![WEEK];
    }

    let mut segments: Vec<Interval> = Vec::new();
    let start_date = (now_local - Duration::days(8)).date_naive();
    let end_date = (now_local + Duration::days(1)).date_naive();

    let mut date = start_date;
    while date <= end_date {
        let weekday = date.weekday().num_days_from_monday();
        for row in schedule.iter().filter(|r| r.day_of_week == weekday) {
            for (start_naive_date, start_time, end_naive_date, end_time) in wall_segments(date, row) {
                let start_dt = floor_minute(localize(tz, start_naive_date.and_time(start_time)));
                let end_dt = ceil_minute(localize(tz, end_naive_date.and_time(end_time)));

                let idx_start = minute_index(start_dt, now_local);
                let idx_end = minute_index(end_dt, now_local);
                let lo = idx_start.min(idx_end);
                let hi = idx_start.max(idx_end);

                if lo < 1 || hi > WEEK.hi {
                    continue;
                }
                if hi > lo {
                    segments.push(Interval::new(lo, hi));
                }
            }
        }
        date += Duration::days(1);
    }

    merge(segments)
}

/// Splits one (possibly overnight) schedule row for a calendar date into one
/// or two plain (start, end) wall-clock segments, each tagged with the
/// calendar date its endpoints fall on.
fn wall_segments(
    date: chrono::NaiveDate,
    row: &BusinessHoursRow,
) -> Vec<(chrono::NaiveDate, NaiveTime, chrono::NaiveDate, NaiveTime)> {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
    if row.end_local <= row.start_local {
        let next_date = date + Duration::days(1);
        vec![
            (date, row.start_local, next_date, midnight),
            (next_date, midnight, next_date, row.end_local),
        ]
    } else {
        vec![(date, row.start_local, date, row.end_local)]
    }
}

/// Sorts and merges overlapping or touching half-open intervals.
fn merge(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by_key(|iv| iv.lo);
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        if let Some(last) = merged.last_mut() {
            if iv.lo <= last.hi {
                last.hi = last.hi.max(iv.hi);
                continue;
            }
        }
        merged.push(iv);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn now_at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> chrono::DateTime<Tz> {
        localize(
            UTC,
            chrono::NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, mi, s)
                .unwrap(),
        )
    }

    #[test]
    fn empty_schedule_is_24x7() {
        let now = now_at(2024, 10, 14, 12, 0, 0);
        let bh = build_bh(&[], UTC, now);
        assert_eq!(bh, vec![WEEK]);
    }

    #[test]
    fn full_day_every_day_covers_1440_per_day_budget() {
        let now = now_at(2024, 10, 14, 12, 0, 0);
        let schedule: Vec<BusinessHoursRow> = (0..7)
            .map(|d| BusinessHoursRow {
                day_of_week: d,
                start_local: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
                end_local: NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            })
            .collect();
        let bh = build_bh(&schedule, UTC, now);
        let budget: i64 = bh
            .iter()
            .map(|iv| crate::time_index::overlap(*iv, crate::time_index::DAY))
            .sum();
        assert_eq!(budget, 1440);
        let week_budget: i64 = bh.iter().map(|iv| iv.len()).sum();
        assert_eq!(week_budget, 10080);
    }

    #[test]
    fn overnight_schedule_budgets_240_minutes_per_day() {
        let now = now_at(2024, 10, 14, 12, 0, 0);
        let schedule: Vec<BusinessHoursRow> = (0..7)
            .map(|d| BusinessHoursRow {
                day_of_week: d,
                start_local: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                end_local: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            })
            .collect();
        let bh = build_bh(&schedule, UTC, now);
        let budget: i64 = bh
            .iter()
            .map(|iv| crate::time_index::overlap(*iv, crate::time_index::DAY))
            .sum();
        assert_eq!(budget, 240);
    }

    #[test]
    fn segments_are_merged_and_disjoint() {
        let now = now_at(2024, 10, 14, 12, 0, 0);
        let schedule = vec![BusinessHoursRow {
            day_of_week: now.weekday().num_days_from_monday(),
            start_local: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_local: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }];
        let bh = build_bh(&schedule, UTC, now);
        for pair in bh.windows(2) {
            assert!(pair[0].hi < pair[1].lo, "intervals must be disjoint and sorted");
        }
    }
}
