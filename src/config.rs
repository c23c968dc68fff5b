use std::time::Duration;

use clap::Parser;
use tracing::Level;

/// Runtime configuration for the `coupon_server` binary.
///
/// Every value can be given as a CLI argument or an environment variable. A
/// `.env` file in the working directory is loaded before parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "coupon_server",
    version,
    about = "Issues a bounded number of coupons per campaign"
)]
pub struct Config {
    /// Address the HTTP server listens on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("127.0.0.1:8080"))]
    pub server_addr: String,

    /// Environment variable: `MONGODB_URI`
    #[arg(long, env = "MONGODB_URI", default_value_t = String::from("mongodb://localhost:27017"))]
    pub mongodb_uri: String,

    /// Environment variable: `MONGODB_DATABASE`
    #[arg(long, env = "MONGODB_DATABASE", default_value_t = String::from("coupons"))]
    pub mongodb_database: String,

    /// Where the remaining counts and requester sets live.
    ///
    /// A `redis://` URI connects to Redis. `memory://` keeps everything inside
    /// this process, which only makes sense for a single local instance.
    ///
    /// Environment variable: `CACHE_URI`
    #[arg(long, env = "CACHE_URI", default_value_t = String::from("redis://127.0.0.1:6379/0"))]
    pub cache_uri: String,

    /// Deadline for a single request, in milliseconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_MS`
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 3000)]
    pub request_timeout_ms: u64,

    /// Environment variable: `LOG_LEVEL`
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: Level,

    /// Create a demo campaign with 500 coupons on startup.
    ///
    /// Environment variable: `SEED_CAMPAIGN`
    #[arg(long, env = "SEED_CAMPAIGN", default_value_t = false)]
    pub seed_campaign: bool,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
