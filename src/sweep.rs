//! Interval sweep: the two-pointer intersection of business-hours
//! intervals with status spans, accumulating active/inactive minutes into
//! the three nested bands.

use crate::spans::Span;
use crate::status::Status;
use crate::time_index::{overlap, Interval, DAY, HOUR, WEEK};

/// Minute totals for one band, always satisfying `uptime + downtime == budget`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandMinutes {
    pub uptime: i64,
    pub downtime: i64,
    pub budget: i64,
}

/// Uptime/downtime minute totals for the hour, day, and week bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bands {
    pub hour: BandMinutes,
    pub day: BandMinutes,
    pub week: BandMinutes,
}

/// Sweeps the sorted, disjoint `bh` intervals against the sorted, tiling
/// `spans`, accumulating active minutes into each band, then derives
/// downtime from the per-band business-hours budget.
///
/// `bh` and `spans` must both be sorted ascending by `lo`. Runs in
/// `O(|bh| + |spans|)`.
pub fn sweep(bh: &[Interval], spans: &[Span]) -> Bands {
    let mut active_h = 0i64;
    let mut active_d = 0i64;
    let mut active_w = 0i64;

    let mut i = 0usize;
    let mut j = 0usize;
    while i < bh.len() && j < spans.len() {
        let a = bh[i];
        let b = spans[j].interval;
        let ov = overlap(a, b);
        if ov > 0 && spans[j].status == Status::Active {
            active_h += overlap(Interval::new(a.lo.max(b.lo), a.hi.min(b.hi)), HOUR);
            active_d += overlap(Interval::new(a.lo.max(b.lo), a.hi.min(b.hi)), DAY);
            active_w += overlap(Interval::new(a.lo.max(b.lo), a.hi.min(b.hi)), WEEK);
        }
        if a.hi <= b.hi {
            i += 1;
        }
        if b.hi <= a.hi {
            j += 1;
        }
    }

    let budget_h: i64 = bh.iter().map(|iv| overlap(*iv, HOUR)).sum();
    let budget_d: i64 = bh.iter().map(|iv| overlap(*iv, DAY)).sum();
    let budget_w: i64 = bh.iter().map(|iv| overlap(*iv, WEEK)).sum();

    let clamp = |u: i64, b: i64| u.clamp(0, b);
    let uptime_h = clamp(active_h, budget_h);
    let uptime_d = clamp(active_d, budget_d);
    let uptime_w = clamp(active_w, budget_w);

    Bands {
        hour: BandMinutes {
            uptime: uptime_h,
            downtime: budget_h - uptime_h,
            budget: budget_h,
        },
        day: BandMinutes {
            uptime: uptime_d,
            downtime: budget_d - uptime_d,
            budget: budget_d,
        },
        week: BandMinutes {
            uptime: uptime_w,
            downtime: budget_w - uptime_w,
            budget: budget_w,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_index::WEEK;

    #[test]
    fn all_active_week_fully_open_yields_full_uptime() {
        let bh = vec![WEEK];
        let spans = vec![Span {
            interval: WEEK,
            status: Status::Active,
        }];
        let bands = sweep(&bh, &spans);
        assert_eq!(bands.hour, BandMinutes { uptime: 60, downtime: 0, budget: 60 });
        assert_eq!(bands.day, BandMinutes { uptime: 1440, downtime: 0, budget: 1440 });
        assert_eq!(bands.week, BandMinutes { uptime: 10080, downtime: 0, budget: 10080 });
    }

    #[test]
    fn all_inactive_week_yields_full_downtime() {
        let bh = vec![WEEK];
        let spans = vec![Span {
            interval: WEEK,
            status: Status::Inactive,
        }];
        let bands = sweep(&bh, &spans);
        assert_eq!(bands.hour.uptime, 0);
        assert_eq!(bands.hour.downtime, 60);
        assert_eq!(bands.week.downtime, 10080);
    }

    #[test]
    fn coverage_identity_holds_for_every_band() {
        let bh = vec![WEEK];
        let spans = vec![
            Span { interval: Interval::new(1, 30), status: Status::Active },
            Span { interval: Interval::new(30, 10080), status: Status::Inactive },
        ];
        let bands = sweep(&bh, &spans);
        for band in [bands.hour, bands.day, bands.week] {
            assert_eq!(band.uptime + band.downtime, band.budget);
        }
    }

    #[test]
    fn partial_business_hours_only_counts_overlap() {
        // BH covers only the most recent 10 minutes of the hour band.
        let bh = vec![Interval::new(1, 11)];
        let spans = vec![Span { interval: WEEK, status: Status::Active }];
        let bands = sweep(&bh, &spans);
        assert_eq!(bands.hour.budget, 10);
        assert_eq!(bands.hour.uptime, 10);
        assert_eq!(bands.day.budget, 10);
    }
}
