//! Scripted in-memory driver used by the test suite.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::copy::CopyFromSource;
use crate::driver::{Driver, DriverRows, DriverTx};
use crate::error::{Error, Result};
use crate::field::FieldDescription;
use crate::types::{CommandTag, Identifier, Oid, Value};

/// Connection handle exposed through `Rows::conn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConn {
    pub id: u32,
}

// ============================================================================
// Rows
// ============================================================================

pub struct MockRows {
    pending: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    fields: Vec<FieldDescription>,
    err: Option<Error>,
    fail_after: Option<(usize, Error)>,
    yielded: usize,
    closes: Arc<AtomicUsize>,
    closed: bool,
    conn: MockConn,
}

impl MockRows {
    /// Column types are taken from the first row, TEXT when there is none.
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let fields = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let data_type = rows
                    .first()
                    .and_then(|r| r.get(i))
                    .map(Value::type_oid)
                    .unwrap_or(Oid::TEXT);
                FieldDescription {
                    name: name.to_string(),
                    table: Oid(16384),
                    attribute_number: (i + 1) as u16,
                    data_type,
                    data_type_size: -1,
                    data_type_name: String::new(),
                    modifier: -1,
                    format_code: 1,
                }
            })
            .collect();

        Self {
            pending: rows.into(),
            current: None,
            fields,
            err: None,
            fail_after: None,
            yielded: 0,
            closes: Arc::new(AtomicUsize::new(0)),
            closed: false,
            conn: MockConn { id: 1 },
        }
    }

    /// A single-column, single-row result.
    pub fn scalar(name: &str, value: Value) -> Self {
        Self::new(&[name], vec![vec![value]])
    }

    /// Cursor returned with its error already set.
    pub fn with_err(mut self, err: Error) -> Self {
        self.err = Some(err);
        self
    }

    /// Yield `n` rows, then fail with `err`.
    pub fn failing_after(mut self, n: usize, err: Error) -> Self {
        self.fail_after = Some((n, err));
        self
    }

    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

#[async_trait]
impl DriverRows for MockRows {
    type Conn = MockConn;
    type Field = FieldDescription;

    async fn next(&mut self) -> bool {
        if self.closed || self.err.is_some() {
            return false;
        }
        if let Some((n, err)) = &self.fail_after {
            if self.yielded >= *n {
                self.err = Some(err.clone());
                self.current = None;
                return false;
            }
        }
        match self.pending.pop_front() {
            Some(row) => {
                self.current = Some(row);
                self.yielded += 1;
                true
            }
            None => {
                self.current = None;
                false
            }
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn conn(&self) -> Option<&MockConn> {
        Some(&self.conn)
    }

    fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    fn fatal(&mut self, err: Error) {
        if self.err.is_none() {
            self.err = Some(err);
        }
        self.close();
    }

    fn field_descriptions(&self) -> &[FieldDescription] {
        &self.fields
    }

    fn values(&self) -> Result<Vec<Value>> {
        self.current
            .clone()
            .ok_or_else(|| Error::Driver("no current row".to_string()))
    }
}

// ============================================================================
// Driver
// ============================================================================

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: &'static str,
    pub query: String,
    pub args: Vec<Value>,
}

#[derive(Default)]
struct Script {
    exec: VecDeque<Result<CommandTag>>,
    query: VecDeque<Result<MockRows>>,
    probe: VecDeque<Result<Value>>,
    begin: VecDeque<Error>,
    copy: VecDeque<Error>,
}

/// Driver whose responses are queued up front.
///
/// Unscripted calls succeed: `exec` returns `SELECT 0`, `query` an empty
/// result, and the probe query `select 1 + 1` answers 2.
#[derive(Default)]
pub struct MockDriver {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    probes: AtomicUsize,
    closes: AtomicUsize,
    log: Arc<Mutex<Vec<String>>>,
    tx_query: Arc<Mutex<VecDeque<MockRows>>>,
}

pub const PROBE_QUERY: &str = "select 1 + 1";

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_exec(&self, result: Result<CommandTag>) -> &Self {
        self.script.lock().exec.push_back(result);
        self
    }

    pub fn push_query(&self, result: Result<MockRows>) -> &Self {
        self.script.lock().query.push_back(result);
        self
    }

    pub fn push_probe(&self, result: Result<Value>) -> &Self {
        self.script.lock().probe.push_back(result);
        self
    }

    pub fn fail_begin(&self, err: Error) -> &Self {
        self.script.lock().begin.push_back(err);
        self
    }

    pub fn fail_copy(&self, err: Error) -> &Self {
        self.script.lock().copy.push_back(err);
        self
    }

    /// Queue a cursor for the next `query` inside a transaction.
    pub fn push_tx_query(&self, rows: MockRows) -> &Self {
        self.tx_query.lock().push_back(rows);
        self
    }

    /// Driver calls other than probes.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Events recorded by transactions and copies.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn record(&self, op: &'static str, query: &str, args: &[Value]) {
        self.calls.lock().push(Call {
            op,
            query: query.to_string(),
            args: args.to_vec(),
        });
    }
}

fn drain(source: &mut dyn CopyFromSource) -> Result<u64> {
    let mut copied = 0;
    while let Some(row) = source.next_row() {
        row?;
        copied += 1;
    }
    Ok(copied)
}

#[async_trait]
impl Driver for MockDriver {
    type Rows = MockRows;
    type Tx = MockTx;

    async fn begin(&self) -> Result<MockTx> {
        if let Some(err) = self.script.lock().begin.pop_front() {
            return Err(err);
        }
        self.log.lock().push("begin".to_string());
        Ok(MockTx {
            log: Arc::clone(&self.log),
            queued: Arc::clone(&self.tx_query),
        })
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    async fn exec(&self, query: &str, args: &[Value]) -> Result<CommandTag> {
        tokio::task::yield_now().await;
        self.record("exec", query, args);
        self.script
            .lock()
            .exec
            .pop_front()
            .unwrap_or_else(|| Ok(CommandTag::from("SELECT 0")))
    }

    async fn query(&self, query: &str, args: &[Value]) -> Result<MockRows> {
        tokio::task::yield_now().await;
        if query == PROBE_QUERY {
            self.probes.fetch_add(1, Ordering::SeqCst);
            let answer = self
                .script
                .lock()
                .probe
                .pop_front()
                .unwrap_or(Ok(Value::Int4(2)));
            return answer.map(|v| MockRows::scalar("?column?", v));
        }
        self.record("query", query, args);
        self.script
            .lock()
            .query
            .pop_front()
            .unwrap_or_else(|| Ok(MockRows::new(&[], vec![])))
    }

    async fn copy_from(
        &self,
        table: &Identifier,
        columns: &[String],
        source: &mut dyn CopyFromSource,
    ) -> Result<u64> {
        if let Some(err) = self.script.lock().copy.pop_front() {
            return Err(err);
        }
        self.log
            .lock()
            .push(format!("copy {} ({})", table.sanitize(), columns.join(", ")));
        drain(source)
    }
}

// ============================================================================
// Transaction
// ============================================================================

pub struct MockTx {
    log: Arc<Mutex<Vec<String>>>,
    queued: Arc<Mutex<VecDeque<MockRows>>>,
}

#[async_trait]
impl DriverTx for MockTx {
    type Rows = MockRows;

    async fn exec(&mut self, query: &str, _args: &[Value]) -> Result<CommandTag> {
        self.log.lock().push(format!("tx exec {}", query));
        Ok(CommandTag::from("INSERT 0 1"))
    }

    async fn query(&mut self, query: &str, _args: &[Value]) -> Result<MockRows> {
        self.log.lock().push(format!("tx query {}", query));
        let queued = self.queued.lock().pop_front();
        Ok(queued.unwrap_or_else(|| MockRows::scalar("n", Value::Int8(7))))
    }

    async fn copy_from(
        &mut self,
        table: &Identifier,
        _columns: &[String],
        source: &mut dyn CopyFromSource,
    ) -> Result<u64> {
        self.log
            .lock()
            .push(format!("tx copy {}", table.sanitize()));
        drain(source)
    }

    async fn commit(self) -> Result<()> {
        self.log.lock().push("commit".to_string());
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.log.lock().push("rollback".to_string());
        Ok(())
    }
}
