//! Scripted in-memory store driver for tests: records every transaction
//! event and executed statement, returns canned row streams, and can be
//! told to fail the nth write for rollback tests.

use crate::{
    driver::{DriverError, Row, RowStream, StoreConnection, StoreDriver},
    sql::Params,
    value::Value,
};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

///
/// DriverEvent
///

#[derive(Clone, Debug, PartialEq)]
pub enum DriverEvent {
    Begin,
    Commit,
    Rollback,
    Execute {
        sql: String,
        params: Vec<(String, Value)>,
    },
    Query {
        sql: String,
        params: Vec<(String, Value)>,
    },
}

#[derive(Default)]
struct DriverState {
    events: Vec<DriverEvent>,
    results: VecDeque<Vec<Row>>,
    executed: usize,
    fail_on: Option<usize>,
}

///
/// MemoryDriver
///
/// Shared-state mock: every connection it hands out appends to the same
/// event log, so a test can assert on statement order across the whole
/// call.
///

#[derive(Clone, Default)]
pub struct MemoryDriver {
    state: Arc<Mutex<DriverState>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the nth executed write statement, 1-based.
    pub fn fail_on_statement(&self, n: usize) {
        self.lock().fail_on = Some(n);
    }

    /// Queue a canned result for the next select, in FIFO order.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.lock().results.push_back(rows);
    }

    pub fn events(&self) -> Vec<DriverEvent> {
        self.lock().events.clone()
    }

    /// Executed write statements, in order.
    pub fn statements(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                DriverEvent::Execute { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// Executed selects, in order.
    pub fn queries(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                DriverEvent::Query { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// Parameters of the nth executed write statement.
    pub fn params_of(&self, index: usize) -> Vec<(String, Value)> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                DriverEvent::Execute { params, .. } => Some(params.clone()),
                _ => None,
            })
            .nth(index)
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StoreDriver for MemoryDriver {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, DriverError> {
        Ok(Box::new(MemoryConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryConnection {
    state: Arc<Mutex<DriverState>>,
}

impl MemoryConnection {
    fn lock(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn begin(&mut self) -> Result<(), DriverError> {
        self.lock().events.push(DriverEvent::Begin);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.lock().events.push(DriverEvent::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.lock().events.push(DriverEvent::Rollback);
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &Params) -> Result<u64, DriverError> {
        let mut state = self.lock();
        state.executed += 1;
        if state.fail_on == Some(state.executed) {
            return Err(DriverError::Execute("injected failure".to_string()));
        }
        state.events.push(DriverEvent::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        Ok(1)
    }

    async fn query(&mut self, sql: &str, params: &Params) -> Result<RowStream, DriverError> {
        let mut state = self.lock();
        state.events.push(DriverEvent::Query {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        let rows = state.results.pop_front().unwrap_or_default();

        Ok(stream::iter(rows.into_iter().map(Ok)).boxed())
    }
}

/// A result row with anonymous columns; graph selects read positionally.
pub fn row(values: Vec<Value>) -> Row {
    let columns = Arc::new(vec![String::new(); values.len()]);

    Row::new(columns, values)
}
