//! Resilience layer for pooled PostgreSQL drivers.
//!
//! Wraps any [`Driver`] in a [`ResilientPool`] that:
//! - notices when a pooled connection died (dead-connection sentinel or a
//!   peer reset) and reconnects with bounded base-10 backoff before
//!   retrying `exec`/`query` once
//! - exposes results through [`Rows`], a cursor that does not depend on the
//!   driver's own types
//!
//! Architecture:
//! - `driver`: traits the wrapped driver implements
//! - `supervisor`: backoff state and the liveness probe
//! - `pool`: the query facade
//! - `rows`: cursor adapter and single-row scanner
//! - `field`: column metadata translation
//! - `types`: values, typed extraction, command tags, identifiers

pub mod config;
pub mod copy;
pub mod driver;
pub mod error;
pub mod field;
pub mod pool;
pub mod rows;
pub mod supervisor;
pub mod tx;
pub mod types;

#[cfg(test)]
mod mock;

pub use config::ReconnectConfig;
pub use copy::{copy_from_rows, CopyFromIter, CopyFromRows, CopyFromSource};
pub use driver::{Driver, DriverRows, DriverTx};
pub use error::{Error, ProtocolError, Result};
pub use field::{FieldDescription, NativeField};
pub use pool::ResilientPool;
pub use rows::{Row, Rows};
pub use supervisor::{RetryState, Supervisor};
pub use tx::Tx;
pub use types::{CommandTag, FromRow, FromValue, Identifier, Oid, Value};
