//! Read-only queries over the input corpus: `status`, `hours`, `timezones`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::business_hours::BusinessHoursRow;
use crate::error::EngineError;
use crate::polls::{parse_ts_utc, RawSample};

use super::Database;

#[derive(sqlx::FromRow)]
struct StatusRow {
    store_id: String,
    status: String,
    ts_utc: String,
}

#[derive(sqlx::FromRow)]
struct HoursRow {
    store_id: String,
    day_of_week: i32,
    start_local: chrono::NaiveTime,
    end_local: chrono::NaiveTime,
}

#[derive(sqlx::FromRow)]
struct TimezoneRow {
    store_id: String,
    tz: String,
}

impl Database {
    /// Bulk-fetches every status sample at or after `left_utc`, across all
    /// stores, ordered ascending by timestamp — the single query that backs
    /// every store's `load_polls` for one report run (§4.2).
    ///
    /// A malformed timestamp aborts the whole report: it indicates the
    /// ingestion pipeline, not an individual store, is broken.
    pub async fn fetch_status_since(&self, left_utc: DateTime<Utc>) -> Result<Vec<RawSample>, EngineError> {
        let rows = sqlx::query_as::<_, StatusRow>(
            "SELECT store_id, status, ts_utc::text AS ts_utc
             FROM status
             WHERE ts_utc >= $1
             ORDER BY ts_utc ASC",
        )
        .bind(left_utc)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(RawSample {
                    store_id: r.store_id,
                    status: r.status,
                    ts_utc: parse_ts_utc(&r.ts_utc)?,
                })
            })
            .collect()
    }

    /// Fetches every business-hours row, grouped by store.
    pub async fn fetch_hours(&self) -> Result<HashMap<String, Vec<BusinessHoursRow>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, HoursRow>(
            "SELECT store_id, day_of_week, start_local, end_local FROM hours",
        )
        .fetch_all(self.pool())
        .await?;

        let mut by_store: HashMap<String, Vec<BusinessHoursRow>> = HashMap::new();
        for r in rows {
            by_store
                .entry(r.store_id)
                .or_default()
                .push(BusinessHoursRow {
                    day_of_week: r.day_of_week as u32,
                    start_local: r.start_local,
                    end_local: r.end_local,
                });
        }
        Ok(by_store)
    }

    /// Fetches every store's declared IANA timezone string (unvalidated —
    /// the caller resolves and falls back to UTC on a bad zone).
    pub async fn fetch_timezones(&self) -> Result<HashMap<String, String>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TimezoneRow>("SELECT store_id, tz FROM timezones")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(|r| (r.store_id, r.tz)).collect())
    }

    /// The union of store ids observed across all three input tables.
    pub async fn fetch_all_store_ids(&self) -> Result<HashSet<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT store_id FROM status
             UNION SELECT store_id FROM hours
             UNION SELECT store_id FROM timezones",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The newest observation instant across the whole corpus — the single
    /// anchor shared by every store in one run.
    pub async fn fetch_anchor(&self) -> Result<Option<DateTime<Utc>>, EngineError> {
        let max_raw: Option<String> = sqlx::query_scalar("SELECT MAX(ts_utc)::text FROM status")
            .fetch_one(self.pool())
            .await?;
        match max_raw {
            Some(raw) => Ok(Some(parse_ts_utc(&raw)?)),
            None => Ok(None),
        }
    }
}
