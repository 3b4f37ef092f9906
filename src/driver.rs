//! Contracts a database driver must satisfy to be wrapped.
//!
//! The wire protocol, the connection pool and SQL execution all live in
//! the driver. This crate only relies on the operations below.

use async_trait::async_trait;

use crate::copy::CopyFromSource;
use crate::error::{Error, Result};
use crate::field::NativeField;
use crate::types::{CommandTag, Identifier, Value};

/// A pooled connection provider.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Rows: DriverRows;
    type Tx: DriverTx<Rows = Self::Rows>;

    async fn begin(&self) -> Result<Self::Tx>;

    /// Release every pooled connection.
    async fn close(&self);

    async fn exec(&self, query: &str, args: &[Value]) -> Result<CommandTag>;

    async fn query(&self, query: &str, args: &[Value]) -> Result<Self::Rows>;

    async fn copy_from(
        &self,
        table: &Identifier,
        columns: &[String],
        source: &mut dyn CopyFromSource,
    ) -> Result<u64>;
}

/// A driver's in-flight result cursor.
#[async_trait]
pub trait DriverRows: Send {
    /// Handle of the connection the cursor reads from.
    type Conn: Send + Sync;
    type Field: NativeField + Send + Sync;

    async fn next(&mut self) -> bool;

    /// Return the connection to the pool. Must tolerate repeated calls.
    fn close(&mut self);

    fn conn(&self) -> Option<&Self::Conn>;

    fn err(&self) -> Option<&Error>;

    fn fatal(&mut self, err: Error);

    fn field_descriptions(&self) -> &[Self::Field];

    /// Values of the row the cursor is positioned on.
    fn values(&self) -> Result<Vec<Value>>;
}

/// A driver transaction, pinned to a single connection.
#[async_trait]
pub trait DriverTx: Send {
    type Rows: DriverRows;

    async fn exec(&mut self, query: &str, args: &[Value]) -> Result<CommandTag>;

    async fn query(&mut self, query: &str, args: &[Value]) -> Result<Self::Rows>;

    async fn copy_from(
        &mut self,
        table: &Identifier,
        columns: &[String],
        source: &mut dyn CopyFromSource,
    ) -> Result<u64>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}
