//! Error types for firebird-query.
//!
//! This module defines all error types using `thiserror` for ergonomic error
//! handling. Query errors carry the phase in which they occurred so callers can
//! tell a failed handshake from a rejected statement or a failed detach.

use thiserror::Error;

/// Phase of a database operation, used to qualify query errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    /// Acquiring or establishing the underlying connection.
    Connect,
    /// Running a statement against the server.
    Execute,
    /// Returning the connection to the pool.
    Detach,
}

impl std::fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => write!(f, "establishing connection"),
            Self::Execute => write!(f, "executing query"),
            Self::Detach => write!(f, "detaching connection"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Query failed while {phase}: {message}")]
    Query { phase: QueryPhase, message: String },

    #[error("Transaction error: {message}")]
    Transaction { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl FbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a query error for the given phase.
    pub fn query(phase: QueryPhase, message: impl Into<String>) -> Self {
        Self::Query {
            phase,
            message: message.into(),
        }
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Connection errors may succeed on a fresh acquire; rejected statements
    /// and transaction failures will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::Query {
                    phase: QueryPhase::Connect,
                    ..
                }
        )
    }
}

/// Result type alias for database operations.
pub type FbResult<T> = Result<T, FbError>;
