use crate::{sql::Params, value::Value};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// DriverError
///
/// Failures crossing the store boundary. The core never retries; every
/// variant propagates to the caller after any open transaction has been
/// rolled back.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DriverError {
    #[error("store connection could not be opened: {0}")]
    Connection(String),

    #[error("statement execution failed: {0}")]
    Execute(String),

    #[error("result row could not be read: {0}")]
    Row(String),
}

///
/// Row
///
/// One result row: shared column header plus positional values. Joined
/// selects repeat column names across segments, so graph rehydration
/// addresses cells by position; by-name access is for callers reading
/// single-table results.
///

#[derive(Clone, Debug)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    #[must_use]
    pub fn new(columns: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// First cell under the given column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// A single-pass stream of result rows. Each logical query execution
/// yields exactly one stream; it is not restartable.
pub type RowStream = BoxStream<'static, Result<Row, DriverError>>;

///
/// StoreDriver
///
/// The factory side of the store boundary. Every top-level repository
/// call acquires its own connection and drops it on every exit path;
/// nested cascade levels reuse the caller's transaction and never
/// connect.
///

#[async_trait]
pub trait StoreDriver: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, DriverError>;
}

///
/// StoreConnection
///
/// One open connection. The contract the executor relies on: a
/// transaction can be begun, committed, or rolled back; parameterized
/// statements execute within it; selects stream rows back.
///

#[async_trait]
pub trait StoreConnection: Send {
    async fn begin(&mut self) -> Result<(), DriverError>;

    async fn commit(&mut self) -> Result<(), DriverError>;

    async fn rollback(&mut self) -> Result<(), DriverError>;

    /// Execute a statement, returning the affected-row count.
    async fn execute(&mut self, sql: &str, params: &Params) -> Result<u64, DriverError>;

    /// Execute a select, returning its row stream.
    async fn query(&mut self, sql: &str, params: &Params) -> Result<RowStream, DriverError>;
}
