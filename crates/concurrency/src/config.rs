//! Store configuration
//!
//! `StoreConfig` can be built in code or parsed from TOML:
//!
//! ```toml
//! [retention]
//! policy = "auto_vacuum"
//! every_commits = 1024
//!
//! [retry]
//! max_retries = 3
//! base_delay_ms = 10
//! max_delay_ms = 100
//! ```
//!
//! Every section and field is optional; missing values take their defaults.

use serde::{Deserialize, Serialize};
use snapkv_core::{Result, StoreError};
use std::time::Duration;

/// How long superseded versions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Never drop old versions. Chains grow for the lifetime of the store;
    /// `vacuum()` can still be called explicitly.
    #[default]
    Unbounded,
    /// Run a vacuum pass after every `every_commits` successful commits
    AutoVacuum {
        /// Commit interval between passes (must be > 0)
        every_commits: u64,
    },
}

/// Configuration for transaction retry behavior
///
/// Used by `TransactionalStore::transaction_with_retry` when a commit loses
/// a write-write race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: usize,
    /// Base delay between retries in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Calculate delay for a given attempt (exponential backoff)
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

/// Top-level store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Version retention policy
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// Default retry behavior for closure transactions
    #[serde(default)]
    pub retry: RetryConfig,
}

impl StoreConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: StoreConfig =
            toml::from_str(source).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the retention policy
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Set the retry configuration
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `every_commits` is zero or if
    /// `max_delay_ms` is below `base_delay_ms`.
    pub fn validate(&self) -> Result<()> {
        if let RetentionPolicy::AutoVacuum { every_commits: 0 } = self.retention {
            return Err(StoreError::InvalidConfig(
                "retention.every_commits must be greater than 0".to_string(),
            ));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(StoreError::InvalidConfig(format!(
                "retry.max_delay_ms ({}) is below retry.base_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# SnapKV store configuration
#
# Retention policy: "unbounded" (default) or "auto_vacuum"
#   "unbounded"   = keep every committed version for the life of the store
#   "auto_vacuum" = drop versions no active snapshot can see, every N commits
[retention]
policy = "unbounded"
# every_commits = 1024

# Backoff for closure transactions that lose a write-write race
[retry]
max_retries = 3
base_delay_ms = 10
max_delay_ms = 100
"#
    }
}
