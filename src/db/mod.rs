//! PostgreSQL persistence layer.
//!
//! Two concerns live here, split into submodules: the read-only input
//! corpus ([`corpus`] — `status`, `hours`, `timezones`) and the
//! read/write job table ([`reports`]).

pub mod corpus;
pub mod reports;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Thin wrapper around a `sqlx::PgPool`. One pool serves both the
/// request-handling and worker tiers — each logical task borrows a
/// connection for the duration of its query, never holding one across an
/// `await` boundary longer than necessary.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Bounded-timeout liveness probe used by `/readyz`.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
