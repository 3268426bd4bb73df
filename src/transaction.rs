//! Explicit transactions with a commit/rollback state machine.
//!
//! A [`Transaction`] wraps one pooled connection and a server transaction
//! begun at READ COMMITTED isolation. It is owned by exactly one caller and
//! executes statements strictly in the order issued. `commit` failure triggers
//! exactly one rollback attempt before the commit error surfaces, so a
//! transaction is never left half-committed and abandoned.

use crate::driver::{Connection, Driver, Isolation, QueryRow, TransactionHandle};
use crate::error::{FbError, FbResult};
use crate::pool::PooledConnection;
use crate::sql::statement::{DeleteOne, InsertMany, InsertOne, Template, UpdateOne, UpdateOrInsert};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Open,
    Committing,
    Committed,
    RollingBack,
    RolledBack,
}

impl std::fmt::Display for TxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Committing => write!(f, "committing"),
            Self::Committed => write!(f, "committed"),
            Self::RollingBack => write!(f, "rolling back"),
            Self::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// An explicit transaction bound to one pooled connection.
pub struct Transaction<D: Driver> {
    id: String,
    tx: <D::Conn as Connection>::Tx,
    conn: Option<PooledConnection<D>>,
    state: TxState,
    log_queries: bool,
}

impl<D: Driver> Transaction<D> {
    /// Begin a READ COMMITTED transaction on the given connection.
    pub(crate) async fn begin(
        mut conn: PooledConnection<D>,
        log_queries: bool,
    ) -> FbResult<Self> {
        let tx = conn.begin(Isolation::ReadCommitted).await?;
        let id = generate_transaction_id();
        info!(transaction_id = %id, "Transaction started");
        Ok(Self {
            id,
            tx,
            conn: Some(conn),
            state: TxState::Open,
            log_queries,
        })
    }

    /// Log-correlation identifier, `tx_` followed by a uuid.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    fn ensure_open(&self) -> FbResult<()> {
        if self.state == TxState::Open {
            Ok(())
        } else {
            Err(FbError::transaction(format!(
                "transaction {} is {}",
                self.id, self.state
            )))
        }
    }

    async fn run(&mut self, sql: &str) -> FbResult<Vec<QueryRow>> {
        self.ensure_open()?;
        if self.log_queries {
            debug!(transaction_id = %self.id, sql = %sql, "Executing query");
        }
        self.tx.query(sql).await
    }

    /// Run a templated select inside this transaction.
    pub async fn query_raw<T: DeserializeOwned>(
        &mut self,
        template: &Template,
    ) -> FbResult<Vec<T>> {
        let rows = self.run(&template.render()).await?;
        crate::client::rows_into(rows)
    }

    pub async fn insert_one<T: DeserializeOwned>(
        &mut self,
        params: &InsertOne,
    ) -> FbResult<Vec<T>> {
        let rows = self.run(&params.sql()).await?;
        crate::client::rows_into(rows)
    }

    /// Bulk insert; resolves to a row-count status string such as
    /// `"2 rows inserted"`.
    pub async fn insert_many(&mut self, params: &InsertMany) -> FbResult<String> {
        self.run(&params.sql()).await?;
        Ok(crate::client::inserted_status(params.len()))
    }

    pub async fn update_one<T: DeserializeOwned>(
        &mut self,
        params: &UpdateOne,
    ) -> FbResult<Vec<T>> {
        let rows = self.run(&params.sql()).await?;
        crate::client::rows_into(rows)
    }

    pub async fn update_or_insert<T: DeserializeOwned>(
        &mut self,
        params: &UpdateOrInsert,
    ) -> FbResult<Vec<T>> {
        let rows = self.run(&params.sql()).await?;
        crate::client::rows_into(rows)
    }

    pub async fn delete_one<T: DeserializeOwned>(
        &mut self,
        params: &DeleteOne,
    ) -> FbResult<Vec<T>> {
        let rows = self.run(&params.sql()).await?;
        crate::client::rows_into(rows)
    }

    /// Commit the transaction.
    ///
    /// On commit failure, exactly one rollback is attempted before the
    /// original commit error surfaces. A rollback failure on that path is
    /// logged and does not displace the commit error.
    pub async fn commit(&mut self) -> FbResult<()> {
        self.ensure_open()?;
        self.state = TxState::Committing;
        match self.tx.commit().await {
            Ok(()) => {
                self.state = TxState::Committed;
                info!(transaction_id = %self.id, "Transaction committed");
                Ok(())
            }
            Err(commit_err) => {
                warn!(
                    transaction_id = %self.id,
                    error = %commit_err,
                    "Commit failed, rolling back"
                );
                self.state = TxState::RollingBack;
                if let Err(rollback_err) = self.tx.rollback().await {
                    warn!(
                        transaction_id = %self.id,
                        error = %rollback_err,
                        "Rollback after failed commit also failed"
                    );
                }
                self.state = TxState::RolledBack;
                Err(commit_err)
            }
        }
    }

    /// Roll the transaction back explicitly.
    pub async fn rollback(&mut self) -> FbResult<()> {
        self.ensure_open()?;
        self.state = TxState::RollingBack;
        let result = self.tx.rollback().await;
        // Terminal either way: after a failed rollback the server-side state
        // is unknown and no further statements may run.
        self.state = TxState::RolledBack;
        match result {
            Ok(()) => {
                info!(transaction_id = %self.id, "Transaction rolled back");
                Ok(())
            }
            Err(e) => Err(FbError::transaction(format!(
                "rollback of {} failed: {e}",
                self.id
            ))),
        }
    }

    /// Finalize the transaction and return its connection to the pool.
    ///
    /// Commits if still open (with the auto-rollback-on-failure policy), then
    /// detaches the connection exactly once regardless of the commit outcome.
    /// A commit error takes priority over a detach error.
    pub async fn close(mut self) -> FbResult<()> {
        let finalize = if self.state == TxState::Open {
            self.commit().await
        } else {
            Ok(())
        };
        let detach = match self.conn.take() {
            Some(conn) => conn.detach().await,
            None => Ok(()),
        };
        finalize?;
        detach
    }
}

impl<D: Driver> Drop for Transaction<D> {
    fn drop(&mut self) {
        if self.state == TxState::Open {
            warn!(
                transaction_id = %self.id,
                "Transaction dropped while open; the server will roll it back on detach"
            );
        }
        // The pooled connection's own Drop returns it to the pool.
    }
}

/// Generate a unique transaction id for log correlation.
fn generate_transaction_id() -> String {
    format!("tx_{}", uuid::Uuid::new_v4().simple())
}
