//! The SQL execution seam between the fuzzer and a live server.
//!
//! The engine only ever needs three operations: fire-and-check execution,
//! a full row scan widened to strings, and a single-value probe. Keeping the
//! seam this narrow lets tests substitute a scripted executor while the
//! binary plugs in the MySQL-protocol implementation from [`crate::mysql`].

use std::fmt;

use async_trait::async_trait;

/// An error reported by the server or the transport underneath it.
#[derive(Clone, Debug)]
pub struct SqlError {
    /// Server error code, when the failure came from the server.
    pub code: Option<u16>,
    /// Human-readable message.
    pub message: String,
}

impl SqlError {
    /// A server error with a code.
    pub fn server(code: u16, message: impl Into<String>) -> SqlError {
        SqlError {
            code: Some(code),
            message: message.into(),
        }
    }

    /// A transport-level error without a server code.
    pub fn transport(message: impl Into<String>) -> SqlError {
        SqlError {
            code: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "server error {code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for SqlError {}

/// Handle for executing SQL against the target server.
///
/// Row values are widened to strings, with SQL NULL rendered as `"NULL"`,
/// which is all the order oracle and the rebase read-back need.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a statement, discarding any result set.
    async fn exec(&self, sql: &str) -> Result<(), SqlError>;

    /// Run a query and return every row as a vector of string columns.
    async fn query(&self, sql: &str) -> Result<Vec<Vec<String>>, SqlError>;

    /// Run a query expected to yield at most one value.
    async fn query_single(&self, sql: &str) -> Result<Option<String>, SqlError>;
}
