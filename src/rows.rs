//! Portable cursor over a driver result set.
//!
//! [`Rows`] delegates to a [`DriverRows`] implementation and exposes a
//! narrow scanning contract. [`Row`] is the single-row form returned by
//! `query_row`, which reports query errors when it is scanned.

use std::fmt;

use crate::driver::DriverRows;
use crate::error::{Error, Result};
use crate::field::{translate, FieldDescription};
use crate::types::{FromRow, Value};

/// Callback run after a cursor closes.
pub type AfterCloseFn<R> = Box<dyn FnOnce(&Rows<R>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// `next` has not been called yet
    Fresh,
    OnRow,
    Exhausted,
}

/// An open result set.
///
/// Closing releases the connection back to the pool. It happens on
/// [`Rows::close`], on [`Rows::fatal`], once [`Rows::next`] runs out of
/// rows, or on drop.
pub struct Rows<R: DriverRows> {
    inner: R,
    position: Position,
    closed: bool,
    fatal: Option<Error>,
    after_close: Vec<AfterCloseFn<R>>,
}

impl<R: DriverRows> Rows<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            position: Position::Fresh,
            closed: false,
            fatal: None,
            after_close: Vec::new(),
        }
    }

    /// Wrap a cursor a driver just returned.
    ///
    /// A cursor that already carries an error is closed and the error
    /// returned instead.
    pub fn from_driver(inner: R) -> Result<Self> {
        let mut rows = Self::new(inner);
        if let Some(err) = rows.err().cloned() {
            rows.close()?;
            return Err(err);
        }
        Ok(rows)
    }

    /// Advance to the next row.
    ///
    /// Returns false when the rows are exhausted or the cursor failed. Use
    /// [`Rows::err`] to tell which. The cursor closes itself on false.
    pub async fn next(&mut self) -> bool {
        if self.closed {
            return false;
        }
        if self.inner.next().await {
            self.position = Position::OnRow;
            true
        } else {
            self.position = Position::Exhausted;
            self.close_inner();
            false
        }
    }

    /// Scan the current row into `T`.
    ///
    /// A cursor that has not been advanced yet is moved to its first row.
    /// Returns [`Error::NoRows`] if no row is available and the cursor has
    /// not failed. Rows after the current one are left alone.
    pub async fn scan<T: FromRow>(&mut self) -> Result<T> {
        let values = self.current_values().await?;
        T::from_row(&values)
    }

    /// Untyped scan into caller-supplied slots, in column order.
    pub async fn scan_into(&mut self, dest: &mut [Value]) -> Result<()> {
        let values = self.current_values().await?;
        if dest.len() != values.len() {
            return Err(Error::ColumnCount {
                expected: dest.len(),
                got: values.len(),
            });
        }
        for (slot, value) in dest.iter_mut().zip(values) {
            *slot = value;
        }
        Ok(())
    }

    /// All values of the current row.
    pub fn values(&self) -> Result<Vec<Value>> {
        if self.closed || self.position != Position::OnRow {
            return Err(self.err().cloned().unwrap_or(Error::NoRows));
        }
        self.inner.values()
    }

    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(self
            .field_descriptions()
            .into_iter()
            .map(|f| f.name)
            .collect())
    }

    pub fn field_descriptions(&self) -> Vec<FieldDescription> {
        translate(self.inner.field_descriptions())
    }

    /// The error that stopped iteration, if any.
    pub fn err(&self) -> Option<&Error> {
        self.fatal.as_ref().or_else(|| self.inner.err())
    }

    /// Connection handle the cursor reads from.
    pub fn conn(&self) -> Option<&R::Conn> {
        self.inner.conn()
    }

    /// Close the cursor. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        self.close_inner();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Fail the cursor with `err` and close it.
    ///
    /// A cursor that already holds an error keeps the first one.
    pub fn fatal(&mut self, err: Error) {
        if self.err().is_none() {
            self.fatal = Some(err.clone());
            self.inner.fatal(err);
        }
        self.close_inner();
    }

    /// Register `f` to run once the cursor closes.
    ///
    /// Callbacks run last-registered first. On a closed cursor `f` runs
    /// immediately.
    pub fn after_close<F>(&mut self, f: F)
    where
        F: FnOnce(&Rows<R>) + Send + 'static,
    {
        if self.closed {
            f(self);
        } else {
            self.after_close.push(Box::new(f));
        }
    }

    async fn current_values(&mut self) -> Result<Vec<Value>> {
        if self.position == Position::Fresh && !self.closed {
            self.next().await;
        }
        self.values()
    }

    fn close_inner(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.inner.close();
        let callbacks = std::mem::take(&mut self.after_close);
        for f in callbacks.into_iter().rev() {
            f(self);
        }
    }
}

impl<R: DriverRows> Drop for Rows<R> {
    fn drop(&mut self) {
        self.close_inner();
    }
}

impl<R: DriverRows> fmt::Debug for Rows<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("position", &self.position)
            .field("closed", &self.closed)
            .field("err", &self.err())
            .finish()
    }
}

/// Single-row result of `query_row`.
pub struct Row<R: DriverRows> {
    rows: Result<Rows<R>>,
}

impl<R: DriverRows> Row<R> {
    pub(crate) fn new(rows: Result<Rows<R>>) -> Self {
        Self { rows }
    }

    /// Scan the first row and close the cursor.
    ///
    /// Returns the query error if the query failed, or [`Error::NoRows`]
    /// if it matched nothing.
    pub async fn scan<T: FromRow>(self) -> Result<T> {
        let mut rows = self.rows?;
        let out = rows.scan().await;
        rows.close()?;
        out
    }

    pub async fn scan_into(self, dest: &mut [Value]) -> Result<()> {
        let mut rows = self.rows?;
        let out = rows.scan_into(dest).await;
        rows.close()?;
        out
    }
}
