//! firebird-query
//!
//! Typed query construction and execution for Firebird databases: a condition
//! tree compiler and pure statement builders for the dialect's quirks
//! (`FIRST`/`SKIP` pagination, `UPDATE OR INSERT`, `UNION ALL` multi-row
//! inserts), plus a bounded connection pool and explicit READ COMMITTED
//! transactions with a commit/rollback lifecycle.
//!
//! The wire protocol stays behind the [`driver`] traits; plug in any Firebird
//! client library by implementing them.

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod pool;
pub mod sql;
pub mod transaction;

pub use client::{BulkInsert, Client, SelectStatement, Statement};
pub use config::Config;
pub use driver::{Connection, Driver, Isolation, QueryRow, TransactionHandle};
pub use error::{FbError, FbResult, QueryPhase};
pub use pool::{Pool, PooledConnection};
pub use sql::{
    DeleteOne, Field, Filter, InsertMany, InsertOne, Op, RowValues, Template, UpdateOne,
    UpdateOrInsert, Value, paginate,
};
pub use transaction::{Transaction, TxState};
