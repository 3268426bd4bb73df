//! Shared mock driver for integration tests.
//!
//! Records every statement and lifecycle event, and can be told to fail
//! connects, queries, commits, or rollbacks to exercise error paths.

#![allow(dead_code)]

use async_trait::async_trait;
use firebird_query::config::Config;
use firebird_query::driver::{Connection, Driver, Isolation, QueryRow, TransactionHandle};
use firebird_query::error::{FbError, FbResult, QueryPhase};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockState {
    executed: Mutex<Vec<String>>,
    events: Mutex<Vec<String>>,
    responses: Mutex<Vec<Vec<QueryRow>>>,
    pub fail_connect: AtomicBool,
    pub fail_query: AtomicBool,
    pub fail_commit: AtomicBool,
    pub fail_rollback: AtomicBool,
    pub connects: AtomicUsize,
    pub detaches: AtomicUsize,
}

impl MockState {
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self, name: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == name).count()
    }

    /// Queue rows to return from the next query, FIFO.
    pub fn push_response(&self, rows: Vec<QueryRow>) {
        self.responses.lock().unwrap().push(rows);
    }

    fn record(&self, sql: &str) -> FbResult<Vec<QueryRow>> {
        self.executed.lock().unwrap().push(sql.to_string());
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(FbError::query(QueryPhase::Execute, "mock query failure"));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(responses.remove(0))
        }
    }

    fn event(&self, name: &str) {
        self.events.lock().unwrap().push(name.to_string());
    }
}

pub struct MockDriver {
    state: Arc<MockState>,
}

pub fn mock_driver() -> (MockDriver, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    (
        MockDriver {
            state: Arc::clone(&state),
        },
        state,
    )
}

#[async_trait]
impl Driver for MockDriver {
    type Conn = MockConn;

    async fn connect(&self, _config: &Config) -> FbResult<MockConn> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(FbError::connection(
                "login failed",
                "Verify the user name and password",
            ));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MockConn {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockConn {
    state: Arc<MockState>,
}

#[async_trait]
impl Connection for MockConn {
    type Tx = MockTx;

    async fn query(&mut self, sql: &str) -> FbResult<Vec<QueryRow>> {
        self.state.record(sql)
    }

    async fn begin(&mut self, _isolation: Isolation) -> FbResult<MockTx> {
        self.state.event("begin");
        Ok(MockTx {
            state: Arc::clone(&self.state),
        })
    }

    async fn detach(&mut self) -> FbResult<()> {
        self.state.detaches.fetch_add(1, Ordering::SeqCst);
        self.state.event("detach");
        Ok(())
    }
}

pub struct MockTx {
    state: Arc<MockState>,
}

#[async_trait]
impl TransactionHandle for MockTx {
    async fn query(&mut self, sql: &str) -> FbResult<Vec<QueryRow>> {
        self.state.record(sql)
    }

    async fn commit(&mut self) -> FbResult<()> {
        self.state.event("commit");
        if self.state.fail_commit.load(Ordering::SeqCst) {
            return Err(FbError::transaction("commit failed on server"));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> FbResult<()> {
        self.state.event("rollback");
        if self.state.fail_rollback.load(Ordering::SeqCst) {
            return Err(FbError::transaction("rollback failed on server"));
        }
        Ok(())
    }
}

/// Build a result row from column/value pairs.
pub fn row(pairs: &[(&str, serde_json::Value)]) -> QueryRow {
    let mut row = QueryRow::new();
    for (column, value) in pairs {
        row.insert(column.to_string(), value.clone());
    }
    row
}

pub fn test_config() -> Config {
    Config::new("localhost", "/data/test.fdb")
}

/// Install a subscriber once so failing tests print their traces with
/// `RUST_LOG=debug`.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
