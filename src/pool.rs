//! Bounded connection pool.
//!
//! The pool owns up to `max_connections` physical connections. `acquire`
//! suspends the caller until a slot and a live connection are available;
//! callers beyond the limit wait on the semaphore. Slots are released by
//! detaching the [`PooledConnection`], which returns the physical connection
//! to the idle list for reuse.

use crate::config::Config;
use crate::driver::{Connection, Driver, Isolation, QueryRow};
use crate::error::{FbError, FbResult, QueryPhase};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

struct PoolInner<D: Driver> {
    driver: D,
    config: Config,
    semaphore: Arc<Semaphore>,
    idle: Mutex<Vec<D::Conn>>,
}

impl<D: Driver> PoolInner<D> {
    fn idle(&self) -> MutexGuard<'_, Vec<D::Conn>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A bounded pool of Firebird connections.
pub struct Pool<D: Driver> {
    inner: Arc<PoolInner<D>>,
}

impl<D: Driver> Clone for Pool<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Driver> Pool<D> {
    /// Create a pool for the given driver and configuration.
    ///
    /// No connections are opened up front; each slot connects lazily on first
    /// acquire and is reused afterwards.
    pub fn new(driver: D, config: Config) -> FbResult<Self> {
        config.validate().map_err(FbError::invalid_input)?;
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections,
            "Creating connection pool"
        );
        Ok(Self {
            inner: Arc::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(config.max_connections as usize)),
                idle: Mutex::new(Vec::new()),
                driver,
                config,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Acquire an exclusively-owned connection.
    ///
    /// Suspends until a pool slot frees when all slots are checked out. Fails
    /// with a `Connection` error if the handshake fails or the pool has been
    /// destroyed.
    pub async fn acquire(&self) -> FbResult<PooledConnection<D>> {
        let permit = Arc::clone(&self.inner.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| {
                FbError::connection(
                    "Connection pool is closed",
                    "Create a new pool before acquiring connections",
                )
            })?;

        let reused = self.inner.idle().pop();
        let conn = match reused {
            Some(conn) => {
                debug!("Reusing idle connection");
                conn
            }
            None => {
                debug!(
                    host = %self.inner.config.host,
                    database = %self.inner.config.database,
                    "Opening new connection"
                );
                // The permit drops on failure so the slot frees for retries.
                self.inner.driver.connect(&self.inner.config).await?
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            permit: Some(permit),
            pool: Arc::clone(&self.inner),
        })
    }

    /// Tear down the pool.
    ///
    /// Outstanding and future acquires fail cleanly with a `Connection` error.
    /// Idle physical connections are detached best-effort.
    pub async fn destroy(&self) {
        self.inner.semaphore.close();
        let drained: Vec<D::Conn> = self.inner.idle().drain(..).collect();
        for mut conn in drained {
            if let Err(e) = conn.detach().await {
                warn!(error = %e, "Failed to detach connection during pool teardown");
            }
        }
        info!("Connection pool destroyed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.semaphore.is_closed()
    }

    /// Number of idle connections currently held by the pool.
    pub fn idle_count(&self) -> usize {
        self.inner.idle().len()
    }
}

/// An exclusively-owned connection checked out of a [`Pool`].
///
/// Detach explicitly with [`detach`](Self::detach) to return the connection
/// and free the slot. Dropping the handle returns the connection as well, so
/// a slot is never leaked on an error path.
pub struct PooledConnection<D: Driver> {
    conn: Option<D::Conn>,
    permit: Option<OwnedSemaphorePermit>,
    pool: Arc<PoolInner<D>>,
}

impl<D: Driver> std::fmt::Debug for PooledConnection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("detached", &self.conn.is_none())
            .finish_non_exhaustive()
    }
}

impl<D: Driver> PooledConnection<D> {
    fn conn_mut(&mut self) -> FbResult<&mut D::Conn> {
        self.conn.as_mut().ok_or_else(|| {
            FbError::query(QueryPhase::Execute, "connection has already been detached")
        })
    }

    /// Run a statement on this connection in auto-commit mode.
    pub async fn query(&mut self, sql: &str) -> FbResult<Vec<QueryRow>> {
        self.conn_mut()?.query(sql).await
    }

    /// Begin a server transaction on this connection.
    pub async fn begin(
        &mut self,
        isolation: Isolation,
    ) -> FbResult<<D::Conn as Connection>::Tx> {
        self.conn_mut()?.begin(isolation).await
    }

    /// Return the connection to the pool and free the slot.
    ///
    /// After a `destroy` the pool no longer reuses connections, so the
    /// physical session is detached instead.
    pub async fn detach(mut self) -> FbResult<()> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        if self.pool.semaphore.is_closed() {
            conn.detach().await?;
        } else {
            self.pool.idle().push(conn);
        }
        drop(self.permit.take());
        Ok(())
    }
}

impl<D: Driver> Drop for PooledConnection<D> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.pool.semaphore.is_closed() {
                // Cannot detach asynchronously here; the session closes with
                // the driver handle.
                drop(conn);
            } else {
                self.pool.idle().push(conn);
                debug!("Connection returned to pool via Drop - consider explicit detach()");
            }
        }
    }
}
