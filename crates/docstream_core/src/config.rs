//! Cursor configuration.

use crate::error::{CursorError, CursorResult};
use docstream_store::Filter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Configuration for a retried operation: a fixed delay between a bounded
/// number of attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay between two consecutive attempts.
    pub delay: Duration,
}

impl RetryConfig {
    /// Creates a retry configuration with the default delay.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_millis(2000),
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the delay to wait before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            self.delay
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(5)
    }
}

/// The tunable part of a cursor configuration.
///
/// Unlike [`CursorConfig`], this carries no filter and can be loaded from
/// a host application's configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorOptions {
    /// Maximum number of records per batch.
    pub batch_size: usize,
    /// Session keep-alive interval.
    pub refresh_interval: Option<Duration>,
    /// Retry policy for the existence check.
    pub probe_retry: RetryConfig,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            refresh_interval: None,
            probe_retry: RetryConfig::default(),
        }
    }
}

/// Configuration for a [`crate::Cursor`].
#[derive(Debug, Clone, PartialEq)]
pub struct CursorConfig {
    /// Read predicate forwarded to the store.
    pub filter: Filter,

    /// Collection name override. When unset, the name is derived from the
    /// record type.
    pub collection_name: Option<String>,

    /// Maximum number of records per batch. Must be at least 1.
    pub batch_size: usize,

    /// How often to refresh the session while iterating (`None` = never).
    pub refresh_interval: Option<Duration>,

    /// Retry policy for the existence check.
    pub probe_retry: RetryConfig,
}

impl CursorConfig {
    /// Creates a configuration with default values for the given filter.
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self::default().with_filter(filter)
    }

    /// Sets the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Overrides the collection name.
    #[must_use]
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Sets the session refresh interval.
    #[must_use]
    pub const fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Sets the retry policy for the existence check.
    #[must_use]
    pub fn with_probe_retry(mut self, retry: RetryConfig) -> Self {
        self.probe_retry = retry;
        self
    }

    /// Applies a set of tunables loaded from elsewhere.
    #[must_use]
    pub fn with_options(mut self, options: CursorOptions) -> Self {
        self.batch_size = options.batch_size;
        self.refresh_interval = options.refresh_interval;
        self.probe_retry = options.probe_retry;
        self
    }

    /// Returns the tunables of this configuration.
    pub fn options(&self) -> CursorOptions {
        CursorOptions {
            batch_size: self.batch_size,
            refresh_interval: self.refresh_interval,
            probe_retry: self.probe_retry.clone(),
        }
    }

    /// Checks the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::InvalidConfig`] if the batch size or the
    /// attempt budget is zero, or the collection override is empty.
    pub fn validate(&self) -> CursorResult<()> {
        if self.batch_size == 0 {
            return Err(CursorError::invalid_config("batch size must be at least 1"));
        }
        if self.probe_retry.max_attempts == 0 {
            return Err(CursorError::invalid_config(
                "probe retry needs at least one attempt",
            ));
        }
        if self.collection_name.as_deref().is_some_and(str::is_empty) {
            return Err(CursorError::invalid_config(
                "collection name override must not be empty",
            ));
        }
        Ok(())
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        let options = CursorOptions::default();
        Self {
            filter: Filter::all(),
            collection_name: None,
            batch_size: options.batch_size,
            refresh_interval: options.refresh_interval,
            probe_retry: options.probe_retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CursorConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert!(config.collection_name.is_none());
        assert!(config.refresh_interval.is_none());
        assert_eq!(config.probe_retry.max_attempts, 5);
        assert_eq!(config.probe_retry.delay, Duration::from_secs(2));
        assert!(config.filter.is_match_all());
        config.validate().unwrap();
    }

    #[test]
    fn builder_pattern() {
        let config = CursorConfig::new(Filter::field_eq("status", "open"))
            .with_batch_size(50)
            .with_collection_name("tickets")
            .with_refresh_interval(Duration::from_secs(60))
            .with_probe_retry(RetryConfig::no_retry());

        assert_eq!(config.batch_size, 50);
        assert_eq!(config.collection_name.as_deref(), Some("tickets"));
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(60)));
        assert_eq!(config.probe_retry.max_attempts, 1);
        assert!(!config.filter.is_match_all());
    }

    #[test]
    fn validation_rejects_zero_batch_size() {
        let err = CursorConfig::default().with_batch_size(0).validate().unwrap_err();
        assert!(err.to_string().contains("batch size"));
    }

    #[test]
    fn validation_rejects_zero_attempts() {
        let config = CursorConfig::default().with_probe_retry(RetryConfig::new(0));
        assert!(matches!(
            config.validate(),
            Err(CursorError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validation_rejects_empty_collection_name() {
        let config = CursorConfig::default().with_collection_name("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn retry_delay_is_fixed() {
        let config = RetryConfig::new(5).with_delay(Duration::from_millis(250));
        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(250));
    }

    #[test]
    fn options_load_from_json() {
        let json = r#"{"batch_size": 250, "refresh_interval": {"secs": 30, "nanos": 0}}"#;
        let options: CursorOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.batch_size, 250);
        assert_eq!(options.refresh_interval, Some(Duration::from_secs(30)));
        assert_eq!(options.probe_retry, RetryConfig::default());

        let config = CursorConfig::default().with_options(options.clone());
        assert_eq!(config.options(), options);
    }
}
