//! Prometheus metrics exposition for the job lifecycle and engine.
//!
//! ## Metrics exposed
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `storehealth_reports_triggered_total` | Counter | Trigger requests accepted (new or idempotent) |
//! | `storehealth_reports_completed_total` | Counter | Reports that reached Complete |
//! | `storehealth_reports_failed_total` | Counter | Reports that reached Failed |
//! | `storehealth_stores_processed_total` | Counter | Stores that produced a result row |
//! | `storehealth_stores_skipped_total` | Counter | Stores excluded or skipped after an invariant violation |
//! | `storehealth_last_report_duration_seconds` | Gauge | Wall-clock duration of the most recently completed report |

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;

pub struct Metrics {
    registry: Registry,
    pub reports_triggered: Counter,
    pub reports_completed: Counter,
    pub reports_failed: Counter,
    pub stores_processed: Counter,
    pub stores_skipped: Counter,
    pub last_report_duration_seconds: Gauge<f64, AtomicU64>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let reports_triggered = Counter::default();
        registry.register(
            "storehealth_reports_triggered",
            "Trigger requests accepted, new or idempotent",
            reports_triggered.clone(),
        );

        let reports_completed = Counter::default();
        registry.register(
            "storehealth_reports_completed",
            "Reports that reached Complete",
            reports_completed.clone(),
        );

        let reports_failed = Counter::default();
        registry.register(
            "storehealth_reports_failed",
            "Reports that reached Failed",
            reports_failed.clone(),
        );

        let stores_processed = Counter::default();
        registry.register(
            "storehealth_stores_processed",
            "Stores that produced a result row",
            stores_processed.clone(),
        );

        let stores_skipped = Counter::default();
        registry.register(
            "storehealth_stores_skipped",
            "Stores excluded or skipped after an invariant violation",
            stores_skipped.clone(),
        );

        let last_report_duration_seconds = Gauge::<f64, AtomicU64>::default();
        registry.register(
            "storehealth_last_report_duration_seconds",
            "Wall-clock duration of the most recently completed report",
            last_report_duration_seconds.clone(),
        );

        Metrics {
            registry,
            reports_triggered,
            reports_completed,
            reports_failed,
            stores_processed,
            stores_skipped,
            last_report_duration_seconds,
        }
    }

    pub fn encode(&self) -> String {
        let mut buf = String::new();
        encode(&mut buf, &self.registry).expect("encoding to a String never fails");
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
