use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub redis_url: String,
    /// Hard cap on pageSize and on top-percent slices.
    #[serde(default = "default_max_returned_members")]
    pub max_returned_members: i64,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8880
}

fn default_max_returned_members() -> i64 {
    2000
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}
