//! Process configuration: a `clap`-derived CLI, loaded after
//! `dotenvy::dotenv()` so a local `.env` can supply connection strings
//! during development.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "storehealth", about = "On-demand store-health uptime/downtime reports")]
pub struct Config {
    /// PostgreSQL connection URL (or set DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Redis connection URL (or set REDIS_URL env var)
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// HTTP port the request-handling tier listens on
    #[arg(long, env = "PORT", default_value_t = 7001)]
    pub port: u16,

    /// Directory artifact CSVs are written to and served from
    #[arg(long, env = "STATIC_DIR", default_value = "reports")]
    pub static_dir: PathBuf,

    /// Caps the number of stores processed per report (0 = unlimited);
    /// mirrors the queue payload's optional `max_stores` field.
    #[arg(long, env = "MAX_STORES", default_value_t = 0)]
    pub max_stores: usize,

    /// Soft per-report time budget in seconds before a warning is logged
    #[arg(long, env = "SOFT_TIMEOUT_SECS", default_value_t = 25 * 60)]
    pub soft_timeout_secs: u64,

    /// Hard per-report time budget in seconds; exceeding it fails the job
    #[arg(long, env = "HARD_TIMEOUT_SECS", default_value_t = 30 * 60)]
    pub hard_timeout_secs: u64,

    /// Run store pipelines across the ambient Rayon pool instead of
    /// sequentially
    #[arg(long, env = "PARALLEL")]
    pub parallel: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server and an in-process worker task together
    Serve,
    /// Run only the background worker loop (for horizontal separation)
    Worker,
    /// Run database migrations and exit
    Migrate,
}

impl Config {
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Config::parse()
    }
}
