//! Transaction passthrough.

use crate::copy::CopyFromSource;
use crate::driver::DriverTx;
use crate::error::Result;
use crate::rows::{Row, Rows};
use crate::types::{CommandTag, Identifier, Value};

/// An open transaction.
///
/// Statements are not retried: a transaction is bound to the connection it
/// started on and cannot be replayed elsewhere.
pub struct Tx<T: DriverTx> {
    inner: T,
}

impl<T: DriverTx> Tx<T> {
    pub(crate) fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Execute a statement inside the transaction.
    pub async fn exec(&mut self, query: &str, args: &[Value]) -> Result<CommandTag> {
        self.inner.exec(query, args).await
    }

    /// Run a query inside the transaction.
    ///
    /// A cursor that arrives already failed is closed and its error returned.
    pub async fn query(&mut self, query: &str, args: &[Value]) -> Result<Rows<T::Rows>> {
        Rows::from_driver(self.inner.query(query, args).await?)
    }

    /// Run a query expected to return at most one row.
    pub async fn query_row(&mut self, query: &str, args: &[Value]) -> Row<T::Rows> {
        Row::new(self.query(query, args).await)
    }

    /// Bulk-load rows into `table`. Table and column names are lower-cased.
    pub async fn copy_from<S: CopyFromSource>(
        &mut self,
        table: impl Into<Identifier>,
        columns: &[&str],
        mut source: S,
    ) -> Result<u64> {
        let table = table.into();
        let columns: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
        self.inner.copy_from(&table, &columns, &mut source).await
    }

    /// Commit the transaction.
    pub async fn commit(self) -> Result<()> {
        self.inner.commit().await
    }

    /// Roll back the transaction.
    pub async fn rollback(self) -> Result<()> {
        self.inner.rollback().await
    }
}
