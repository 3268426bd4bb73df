//! Driver traits decoupling the core from the Firebird wire protocol.
//!
//! The pool and transaction manager only need three capabilities: open a
//! physical connection, run SQL text on it, and drive a server transaction.
//! Any Firebird client library can be plugged in by implementing these traits;
//! the crate itself never touches the wire.
//!
//! Implementations produce [`FbError`](crate::error::FbError) directly: `Connection` for handshake
//! failures, `Query` with the executing phase for rejected statements, and
//! `Transaction` for begin/commit/rollback failures. Rows surface as JSON
//! object maps and are deserialized into caller types by the statement layer.

use crate::config::Config;
use crate::error::FbResult;
use async_trait::async_trait;

/// A single result row, keyed by column name.
pub type QueryRow = serde_json::Map<String, serde_json::Value>;

/// Transaction isolation level.
///
/// The transaction manager only ever begins at [`Isolation::ReadCommitted`];
/// the other Firebird levels are listed for driver completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Isolation {
    #[default]
    ReadCommitted,
    Snapshot,
    SnapshotTableStability,
}

/// Factory for physical database connections.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Conn: Connection;

    /// Open a new physical connection. Network or authentication failures
    /// surface as `FbError::Connection`.
    async fn connect(&self, config: &Config) -> FbResult<Self::Conn>;
}

/// An exclusively-owned handle to one physical database session.
#[async_trait]
pub trait Connection: Send + 'static {
    type Tx: TransactionHandle;

    /// Run a statement in auto-commit mode and return its rows.
    async fn query(&mut self, sql: &str) -> FbResult<Vec<QueryRow>>;

    /// Begin a server transaction at the given isolation level.
    async fn begin(&mut self, isolation: Isolation) -> FbResult<Self::Tx>;

    /// Close the physical session.
    async fn detach(&mut self) -> FbResult<()>;
}

/// A server transaction bound to one connection.
#[async_trait]
pub trait TransactionHandle: Send + 'static {
    /// Run a statement inside this transaction and return its rows.
    async fn query(&mut self, sql: &str) -> FbResult<Vec<QueryRow>>;

    async fn commit(&mut self) -> FbResult<()>;

    async fn rollback(&mut self) -> FbResult<()>;
}
