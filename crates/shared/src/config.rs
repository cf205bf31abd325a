//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Account ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Posting engine configuration.
    #[serde(default)]
    pub posting: PostingConfig,
}

/// Account ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Maximum attempts to acquire the per-account locks of one posting.
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,
    /// Backoff between lock acquisition attempts, in milliseconds.
    #[serde(default = "default_lock_backoff_ms")]
    pub lock_backoff_ms: u64,
}

fn default_lock_attempts() -> u32 {
    200
}

fn default_lock_backoff_ms() -> u64 {
    1
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_attempts: default_lock_attempts(),
            lock_backoff_ms: default_lock_backoff_ms(),
        }
    }
}

/// Posting engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PostingConfig {
    /// How many transaction numbers to generate before giving up on a
    /// store-level uniqueness collision.
    #[serde(default = "default_number_retries")]
    pub number_retries: u32,
    /// How many times a posting is retried after a per-account contention
    /// conflict before the conflict is surfaced to the caller.
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
    /// Backoff between conflict retries, in milliseconds.
    #[serde(default = "default_conflict_backoff_ms")]
    pub conflict_backoff_ms: u64,
}

fn default_number_retries() -> u32 {
    5
}

fn default_conflict_retries() -> u32 {
    3
}

fn default_conflict_backoff_ms() -> u64 {
    25
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            number_retries: default_number_retries(),
            conflict_retries: default_conflict_retries(),
            conflict_backoff_ms: default_conflict_backoff_ms(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
