//! # storehealth — Core Library
//!
//! Computes, on demand, a store-health report summarizing uptime and
//! downtime for every monitored store over the last hour, last day, and
//! last week, counted only during each store's declared business hours and
//! anchored at the newest observation present in the data.
//!
//! ## Module organization
//!
//! **Engine modules** (the interval-sweep computation core):
//! - [`time_index`] — minute flooring/ceiling, DST-safe localization, interval overlap
//! - [`status`] — the tagged active/inactive sum, parsed once at the ingestion boundary
//! - [`polls`] — poll loader & normalizer: timestamp parsing, per-minute dedup
//! - [`business_hours`] — weekly schedule → merged minute-index intervals
//! - [`spans`] — carry-forward status-span reconstruction with a pre-window seed
//! - [`sweep`] — the two-pointer interval sweep producing per-band uptime/downtime
//! - [`orchestrator`] — per-store pipeline wiring and invariant enforcement
//!
//! **Service modules** (the asynchronous job lifecycle and its collaborators):
//! - [`report`] — idempotent trigger, job state machine, status translation
//! - [`engine`] — bulk corpus fetch and per-report pipeline fan-out
//! - [`artifact`] — CSV artifact writer and public URL translation
//! - [`worker`] — the background worker loop and time-budget enforcement
//! - [`queue`] — the Redis queue adapter
//! - [`db`] — the PostgreSQL persistence layer (input corpus + job table)
//! - [`http`] — the Axum HTTP surface
//! - [`config`] — CLI/env configuration
//! - [`metrics`] — Prometheus exposition
//! - [`error`] — the per-store and per-report error taxonomy

pub mod artifact;
pub mod business_hours;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod http;
pub mod metrics;
pub mod orchestrator;
pub mod polls;
pub mod queue;
pub mod report;
pub mod spans;
pub mod status;
pub mod sweep;
pub mod time_index;
pub mod worker;
