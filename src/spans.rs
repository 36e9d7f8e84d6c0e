//! Status-span builder: reconstructs a contiguous carry-forward step
//! function over the week band `[1, 10081)` from sparse, irregularly
//! indexed polls.
//!
//! Pure carry-forward only — no midpoint interpolation, no 23:00-local
//! cutoff. The status at any unobserved minute equals the status of the
//! nearest strictly-older poll.

use crate::status::Status;
use crate::time_index::{Interval, WEEK};

/// One normalized poll: a minute index paired with its carried status.
#[derive(Debug, Clone, Copy)]
pub struct Poll {
    pub k: i64,
    pub status: Status,
}

/// A half-open span `[lo, hi)` tiling part of the week window, all with the
/// same status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub interval: Interval,
    pub status: Status,
}

/// Builds the tiling span sequence for one store from its polls, sorted
/// ascending by `k` (oldest-to-newest is descending `k`; see below).
///
/// `polls` must be sorted ascending by `k` (the same order `load_polls`
/// returns), covering both in-window polls (`k < 10080`) and any
/// pre-window seed candidates (`k >= 10080`). Never called for a store with
/// zero polls — the caller excludes that store upstream.
pub fn build_spans(polls: &[Poll]) -> Vec<Span> {
    let start_k = WEEK.hi - 1; // 10080

    let in_window: Vec<Poll> = polls.iter().copied().filter(|p| p.k < start_k).collect();
    let pre_window: Vec<Poll> = polls.iter().copied().filter(|p| p.k >= start_k).collect();

    let seed = if let Some(nearest) = pre_window.iter().min_by_key(|p| p.k) {
        nearest.status
    } else if let Some(nearest_in_window) = in_window.iter().min_by_key(|p| p.k) {
        nearest_in_window.status
    } else {
        // build_spans is never called for a store with zero polls at all.
        unreachable!("build_spans called with no polls")
    };

    let mut raw: Vec<Span> = Vec::new();

    if in_window.is_empty() {
        raw.push(Span {
            interval: Interval::new(WEEK.lo, WEEK.hi),
            status: seed,
        });
    } else {
        // Walk in descending k (earliest wall-time first).
        let mut ordered = in_window.clone();
        ordered.sort_by(|a, b| b.k.cmp(&a.k));

        let mut prev_k = start_k;
        let mut prev_s = seed;
        for poll in &ordered {
            if poll.k < prev_k {
                raw.push(Span {
                    interval: Interval::new(poll.k, prev_k),
                    status: prev_s,
                });
            }
            prev_k = poll.k;
            prev_s = poll.status;
        }
        if prev_k > WEEK.lo {
            raw.push(Span {
                interval: Interval::new(WEEK.lo, prev_k),
                status: prev_s,
            });
        }
    }

    merge(raw)
}

/// Merges adjacent spans that share a status. The raw walk never produces
/// overlaps, only (rarely) equal-status neighbors when two consecutive
/// polls carry the same status.
fn merge(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by_key(|s| s.interval.lo);
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = merged.last_mut() {
            if last.status == span.status && last.interval.hi == span.interval.lo {
                last.interval = Interval::new(last.interval.lo, span.interval.hi);
                continue;
            }
        }
        merged.push(span);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(k: i64, s: Status) -> Poll {
        Poll { k, status: s }
    }

    #[test]
    fn tiles_the_week_without_gaps_or_overlaps() {
        let polls = vec![
            poll(9000, Status::Active),
            poll(5000, Status::Inactive),
            poll(100, Status::Active),
        ];
        let spans = build_spans(&polls);
        assert_eq!(spans.first().unwrap().interval.lo, WEEK.lo);
        assert_eq!(spans.last().unwrap().interval.hi, WEEK.hi);
        for w in spans.windows(2) {
            assert_eq!(w[0].interval.hi, w[1].interval.lo);
        }
    }

    #[test]
    fn single_transition_mid_hour_carries_forward() {
        // One "inactive" poll at k=60 (11:00Z, an hour before NOW=12:00Z),
        // one "active" poll at k=30 (11:30Z), then silence until NOW.
        let polls = vec![poll(60, Status::Inactive), poll(30, Status::Active)];
        let spans = build_spans(&polls);
        // carry-forward extends "active" down to k=1 (minute before NOW).
        let tail = spans.last().unwrap();
        assert!(tail.interval.lo <= 1 && tail.interval.hi >= 30);
        assert_eq!(tail.status, Status::Active);
    }

    #[test]
    fn no_in_window_polls_emits_a_single_seeded_span() {
        let polls = vec![poll(10080, Status::Active)];
        let spans = build_spans(&polls);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].interval, WEEK);
        assert_eq!(spans[0].status, Status::Active);
    }

    #[test]
    fn seed_prefers_nearest_pre_window_poll() {
        let polls = vec![
            poll(10080, Status::Active),
            poll(10200, Status::Inactive),
            poll(5000, Status::Inactive),
        ];
        let spans = build_spans(&polls);
        // the tail span (nearest the window's old edge) should carry the
        // seed's status, which comes from k=10080 (Active), not k=10200.
        let tail = spans.iter().find(|s| s.interval.hi == 5000).unwrap();
        assert_eq!(tail.status, Status::Active);
    }
}
