//! Row sources for bulk copy.

use crate::error::Result;
use crate::types::Value;

/// Produces rows for `copy_from`, one at a time.
///
/// Returning `None` ends the copy. Returning `Some(Err(_))` aborts it.
pub trait CopyFromSource: Send {
    fn next_row(&mut self) -> Option<Result<Vec<Value>>>;
}

/// An in-memory copy source.
#[derive(Debug, Clone, Default)]
pub struct CopyFromRows {
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl CopyFromSource for CopyFromRows {
    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        self.rows.next().map(Ok)
    }
}

/// Wrap pre-built rows as a copy source.
pub fn copy_from_rows(rows: Vec<Vec<Value>>) -> CopyFromRows {
    CopyFromRows {
        rows: rows.into_iter(),
    }
}

/// Adapts any iterator of fallible rows.
pub struct CopyFromIter<I>(pub I);

impl<I> CopyFromSource for CopyFromIter<I>
where
    I: Iterator<Item = Result<Vec<Value>>> + Send,
{
    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        self.0.next()
    }
}
