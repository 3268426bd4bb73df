//! Pooled client: statement construction bound to pool dispatch.
//!
//! [`Client`] is the main entry point. Builder methods are pure: they compile
//! SQL text immediately and hand back a statement object exposing the text via
//! `sql()` and dispatch via `execute()`. Each execution acquires a connection,
//! runs the statement, and detaches — the query error takes priority when both
//! the statement and the detach fail.

use crate::config::Config;
use crate::driver::{Driver, QueryRow};
use crate::error::{FbError, FbResult, QueryPhase};
use crate::pool::Pool;
use crate::sql::statement::{
    DeleteOne, InsertMany, InsertOne, Template, UpdateOne, UpdateOrInsert, paginate,
};
use crate::transaction::Transaction;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Deserialize raw rows into the caller-supplied type.
pub(crate) fn rows_into<T: DeserializeOwned>(rows: Vec<QueryRow>) -> FbResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| {
                FbError::query(QueryPhase::Execute, format!("failed to decode row: {e}"))
            })
        })
        .collect()
}

/// Row-count status string for bulk inserts.
pub(crate) fn inserted_status(rows: usize) -> String {
    if rows == 1 {
        "1 row inserted".to_string()
    } else {
        format!("{rows} rows inserted")
    }
}

/// A pooled Firebird client.
pub struct Client<D: Driver> {
    pool: Pool<D>,
}

impl<D: Driver> Client<D> {
    /// Create a client with its own pool for the given driver and config.
    pub fn new(driver: D, config: Config) -> FbResult<Self> {
        Ok(Self {
            pool: Pool::new(driver, config)?,
        })
    }

    /// Create a client over an existing pool.
    pub fn from_pool(pool: Pool<D>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<D> {
        &self.pool
    }

    /// Acquire, run, detach. The statement error wins over a detach error.
    async fn run(&self, sql: &str) -> FbResult<Vec<QueryRow>> {
        if self.pool.config().log_queries {
            debug!(sql = %sql, "Executing query");
        }
        let mut conn = self.pool.acquire().await?;
        let result = conn.query(sql).await;
        let detached = conn.detach().await;
        let rows = result?;
        detached?;
        Ok(rows)
    }

    /// Build a templated select statement.
    pub fn query_raw(&self, template: Template) -> SelectStatement<'_, D> {
        SelectStatement {
            inner: Statement {
                sql: template.render(),
                client: self,
            },
        }
    }

    pub fn insert_one(&self, params: InsertOne) -> Statement<'_, D> {
        Statement {
            sql: params.sql(),
            client: self,
        }
    }

    pub fn insert_many(&self, params: InsertMany) -> BulkInsert<'_, D> {
        BulkInsert {
            sql: params.sql(),
            rows: params.len(),
            client: self,
        }
    }

    pub fn update_one(&self, params: UpdateOne) -> Statement<'_, D> {
        Statement {
            sql: params.sql(),
            client: self,
        }
    }

    pub fn update_or_insert(&self, params: UpdateOrInsert) -> Statement<'_, D> {
        Statement {
            sql: params.sql(),
            client: self,
        }
    }

    pub fn delete_one(&self, params: DeleteOne) -> Statement<'_, D> {
        Statement {
            sql: params.sql(),
            client: self,
        }
    }

    /// Begin a READ COMMITTED transaction on a dedicated connection.
    ///
    /// The transaction owns the connection until [`Transaction::close`]
    /// returns it to the pool.
    pub async fn transaction(&self) -> FbResult<Transaction<D>> {
        let conn = self.pool.acquire().await?;
        Transaction::begin(conn, self.pool.config().log_queries).await
    }

    /// Tear down the underlying pool.
    pub async fn destroy(&self) {
        self.pool.destroy().await;
    }
}

/// A built statement bound to a client.
pub struct Statement<'a, D: Driver> {
    sql: String,
    client: &'a Client<D>,
}

impl<D: Driver> Statement<'_, D> {
    /// The generated SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Execute against a pooled connection and decode the result rows.
    pub async fn execute<T: DeserializeOwned>(&self) -> FbResult<Vec<T>> {
        rows_into(self.client.run(&self.sql).await?)
    }
}

/// A templated select statement, which can additionally run paginated.
pub struct SelectStatement<'a, D: Driver> {
    inner: Statement<'a, D>,
}

impl<D: Driver> SelectStatement<'_, D> {
    pub fn sql(&self) -> &str {
        self.inner.sql()
    }

    pub async fn execute<T: DeserializeOwned>(&self) -> FbResult<Vec<T>> {
        self.inner.execute().await
    }

    /// Execute wrapped in `FIRST take SKIP take * (page - 1)`. Pages are
    /// 1-indexed.
    pub async fn paginated<T: DeserializeOwned>(
        &self,
        take: u32,
        page: u32,
    ) -> FbResult<Vec<T>> {
        let sql = paginate(&self.inner.sql, take, page);
        rows_into(self.inner.client.run(&sql).await?)
    }
}

/// A bulk insert statement; execution resolves to a row-count status string.
pub struct BulkInsert<'a, D: Driver> {
    sql: String,
    rows: usize,
    client: &'a Client<D>,
}

impl<D: Driver> BulkInsert<'_, D> {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub async fn execute(&self) -> FbResult<String> {
        self.client.run(&self.sql).await?;
        Ok(inserted_status(self.rows))
    }
}
