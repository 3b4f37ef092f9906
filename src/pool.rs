//! Query facade with transparent reconnect.
//!
//! [`ResilientPool`] forwards every call to the wrapped [`Driver`]. When
//! `exec` or `query` fails because the connection died, it asks the
//! [`Supervisor`] to reconnect and, if that succeeds, issues the same call
//! once more with the same arguments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ReconnectConfig;
use crate::copy::CopyFromSource;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::rows::{Row, Rows};
use crate::supervisor::Supervisor;
use crate::tx::Tx;
use crate::types::{CommandTag, Identifier, Value};

// ============================================================================
// Pool Inner
// ============================================================================

struct PoolInner<D: Driver> {
    driver: Arc<D>,
    supervisor: Supervisor<D>,
    closed: AtomicBool,
}

// ============================================================================
// Resilient Pool
// ============================================================================

/// A driver pool wrapped with dead-connection detection and retry.
///
/// Cloning is cheap and clones share the retry state.
pub struct ResilientPool<D: Driver> {
    inner: Arc<PoolInner<D>>,
}

impl<D: Driver> Clone for ResilientPool<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Driver> ResilientPool<D> {
    /// Wrap `driver` with the default reconnect policy.
    pub fn new(driver: D) -> Self {
        Self::build(Arc::new(driver), ReconnectConfig::default())
    }

    /// Wrap `driver` with a custom reconnect policy.
    ///
    /// Fails with [`Error::Config`] if the policy is invalid.
    pub fn with_config(driver: D, config: ReconnectConfig) -> Result<Self> {
        Self::from_shared(Arc::new(driver), config)
    }

    /// Wrap a driver that is also used elsewhere.
    pub fn from_shared(driver: Arc<D>, config: ReconnectConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(driver, config))
    }

    fn build(driver: Arc<D>, config: ReconnectConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                supervisor: Supervisor::new(Arc::clone(&driver), config),
                driver,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Get the wrapped driver.
    pub fn driver(&self) -> &D {
        &self.inner.driver
    }

    /// Get the reconnect supervisor.
    pub fn supervisor(&self) -> &Supervisor<D> {
        &self.inner.supervisor
    }

    /// Check if [`ResilientPool::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Execute a statement that returns no rows.
    pub async fn exec(&self, query: &str, args: &[Value]) -> Result<CommandTag> {
        self.ensure_open()?;
        let err = match self.inner.driver.exec(query, args).await {
            Ok(tag) => return Ok(tag),
            Err(err) => err,
        };
        if self.should_retry(&err, query).await {
            self.inner.driver.exec(query, args).await
        } else {
            Err(err)
        }
    }

    /// Run a query and return its rows.
    pub async fn query(&self, query: &str, args: &[Value]) -> Result<Rows<D::Rows>> {
        self.ensure_open()?;
        let err = match self.query_once(query, args).await {
            Ok(rows) => return Ok(rows),
            Err(err) => err,
        };
        if self.should_retry(&err, query).await {
            self.query_once(query, args).await
        } else {
            Err(err)
        }
    }

    /// Run a query expected to return at most one row.
    ///
    /// Not retried. Errors are reported by [`Row::scan`].
    pub async fn query_row(&self, query: &str, args: &[Value]) -> Row<D::Rows> {
        let rows = match self.ensure_open() {
            Ok(()) => self.query_once(query, args).await,
            Err(err) => Err(err),
        };
        Row::new(rows)
    }

    /// Bulk-load rows into `table`. Not retried.
    ///
    /// Table and column names are lower-cased.
    pub async fn copy_from<S: CopyFromSource>(
        &self,
        table: impl Into<Identifier>,
        columns: &[&str],
        mut source: S,
    ) -> Result<u64> {
        self.ensure_open()?;
        let table = table.into();
        let columns: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
        self.inner
            .driver
            .copy_from(&table, &columns, &mut source)
            .await
    }

    /// Begin a transaction. Not retried.
    pub async fn begin(&self) -> Result<Tx<D::Tx>> {
        self.ensure_open()?;
        self.inner.driver.begin().await.map(Tx::new)
    }

    /// Close the underlying pool. Later calls are no-ops.
    pub async fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            self.inner.driver.close().await;
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::PoolClosed)
        } else {
            Ok(())
        }
    }

    async fn query_once(&self, query: &str, args: &[Value]) -> Result<Rows<D::Rows>> {
        Rows::from_driver(self.inner.driver.query(query, args).await?)
    }

    async fn should_retry(&self, err: &Error, query: &str) -> bool {
        let supervisor = &self.inner.supervisor;
        if !err.is_dead_connection_with(&supervisor.config().reset_phrase) {
            return false;
        }
        warn!(error = %err, "dead connection detected");
        if supervisor.reconnect().await {
            debug!(query, "reissuing after reconnect");
            true
        } else {
            false
        }
    }
}
