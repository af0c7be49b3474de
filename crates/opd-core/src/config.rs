//! Runtime configuration and logging setup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "opd-core";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default PBKDF2 rounds for stored password hashes.
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;

/// Core configuration. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
    /// PBKDF2 rounds for new password hashes
    pub password_iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("opd.sqlite3"),
            log_filter: default_log_filter().to_string(),
            busy_timeout_ms: 5_000,
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }
}

impl Config {
    /// Defaults overridden by `OPD_*` environment variables.
    ///
    /// Unparsable numbers keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("OPD_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(filter) = lookup("OPD_LOG") {
            config.log_filter = filter;
        }
        if let Some(timeout) = lookup("OPD_BUSY_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.busy_timeout_ms = timeout;
        }
        if let Some(rounds) = lookup("OPD_PASSWORD_ITERATIONS").and_then(|v| v.parse().ok()) {
            config.password_iterations = rounds;
        }
        config
    }
}

/// Default log filter
pub fn default_log_filter() -> &'static str {
    "opd_core=info"
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter. Returns false when a
/// subscriber was already installed.
pub fn init_logging(config: &Config) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .try_init()
        .is_ok()
}
