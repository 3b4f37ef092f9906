//! Reconnect supervisor.
//!
//! Decides whether enough time has passed since the last attempt to try a
//! dead connection again, runs a liveness probe, and tracks the retry
//! counter that drives the backoff window.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ReconnectConfig;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::rows::{Row, Rows};

/// Backoff bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// When the last probe was sent. `None` until the first attempt.
    pub last_retry: Option<Instant>,
    pub retry_count: u32,
}

/// Owns the retry state for one wrapped driver.
pub struct Supervisor<D: Driver> {
    driver: Arc<D>,
    config: ReconnectConfig,
    state: Mutex<RetryState>,
    /// Held for a whole check-probe-update cycle so attempts never overlap.
    gate: tokio::sync::Mutex<()>,
}

impl<D: Driver> Supervisor<D> {
    /// Create a supervisor probing through `driver`, with no attempts yet.
    pub fn new(driver: Arc<D>, config: ReconnectConfig) -> Self {
        Self {
            driver,
            config,
            state: Mutex::new(RetryState::default()),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Get the reconnect policy.
    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Snapshot of the retry bookkeeping.
    pub fn state(&self) -> RetryState {
        *self.state.lock()
    }

    /// Number of failed probes since the last success, capped.
    pub fn retry_count(&self) -> u32 {
        self.state.lock().retry_count
    }

    /// When the last probe was sent.
    pub fn last_retry(&self) -> Option<Instant> {
        self.state.lock().last_retry
    }

    /// Backoff window that applies to the next attempt.
    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.config.delay_ms(self.retry_count()))
    }

    /// Run the liveness query and check its answer.
    pub async fn probe(&self) -> Result<()> {
        let rows = self
            .driver
            .query(&self.config.probe_query, &[])
            .await
            .map(Rows::new);
        let (got,): (i64,) = Row::new(rows).scan().await?;
        if got != self.config.probe_expected {
            return Err(Error::Ping(format!(
                "expected {}, got {}",
                self.config.probe_expected, got
            )));
        }
        Ok(())
    }

    /// Try to bring the connection back.
    ///
    /// Returns false without probing while the backoff window is open.
    /// Otherwise probes once: true on success, false on failure.
    pub async fn reconnect(&self) -> bool {
        let _gate = self.gate.lock().await;

        let RetryState {
            last_retry,
            retry_count,
        } = self.state();
        let delay = Duration::from_millis(self.config.delay_ms(retry_count));
        let now = Instant::now();

        if let Some(last) = last_retry {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < delay {
                debug!(
                    retry_count,
                    elapsed_ms = elapsed.as_millis() as u64,
                    window_ms = delay.as_millis() as u64,
                    "reconnect skipped, backoff window open"
                );
                return false;
            }
        }

        self.state.lock().last_retry = Some(now);

        match self.probe().await {
            Ok(()) => {
                self.state.lock().retry_count = 0;
                info!(previous_retry_count = retry_count, "connection recovered");
                true
            }
            Err(err) => {
                let mut state = self.state.lock();
                if state.retry_count < self.config.max_retry_exponent {
                    state.retry_count += 1;
                }
                warn!(
                    error = %err,
                    retry_count = state.retry_count,
                    "liveness probe failed"
                );
                false
            }
        }
    }
}
