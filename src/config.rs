//! Reconnect policy configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, CONNECTION_RESET_PHRASE};

/// Controls backoff and the liveness probe.
///
/// The backoff window is `backoff_base ^ retry_count` milliseconds, with
/// `retry_count` never exceeding `max_retry_exponent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Base of the exponential backoff (default: 10)
    pub backoff_base: u64,
    /// Cap on the retry counter (default: 4, i.e. 10 s)
    pub max_retry_exponent: u32,
    /// Round-trip query used to test liveness
    pub probe_query: String,
    /// Single integer the probe must return
    pub probe_expected: i64,
    /// Error-message suffix that marks a transport reset
    pub reset_phrase: String,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            backoff_base: 10,
            max_retry_exponent: 4,
            probe_query: "select 1 + 1".to_string(),
            probe_expected: 2,
            reset_phrase: CONNECTION_RESET_PHRASE.to_string(),
        }
    }
}

impl ReconnectConfig {
    /// Create a configuration with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base of the exponential backoff.
    pub fn backoff_base(mut self, base: u64) -> Self {
        self.backoff_base = base;
        self
    }

    /// Set the cap on the retry counter.
    pub fn max_retry_exponent(mut self, max: u32) -> Self {
        self.max_retry_exponent = max;
        self
    }

    /// Set the probe query and the value it must return.
    pub fn probe(mut self, query: &str, expected: i64) -> Self {
        self.probe_query = query.to_string();
        self.probe_expected = expected;
        self
    }

    /// Set the error-message suffix treated as a transport reset.
    pub fn reset_phrase(mut self, phrase: &str) -> Self {
        self.reset_phrase = phrase.to_string();
        self
    }

    /// Check that the backoff base is non-zero and the probe query is set.
    pub fn validate(&self) -> Result<()> {
        if self.backoff_base == 0 {
            return Err(Error::Config("backoff_base must be at least 1".to_string()));
        }
        if self.probe_query.trim().is_empty() {
            return Err(Error::Config("probe_query must not be empty".to_string()));
        }
        Ok(())
    }

    /// Backoff window in milliseconds for a given retry count.
    pub fn delay_ms(&self, retry_count: u32) -> u64 {
        self.backoff_base
            .checked_pow(retry_count.min(self.max_retry_exponent))
            .unwrap_or(u64::MAX)
    }
}
