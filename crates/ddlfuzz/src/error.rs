//! Error types for the fuzzer engine.
//!
//! Everything here is fatal to the run. Benign local rejections live in
//! [`ddlfuzz_core::Error`] and are consumed by the outcome comparison rather
//! than propagated.

use thiserror::Error;

use crate::executor::SqlError;

/// A convenience `Result` type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that stop a fuzzing case.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A non-ignorable SQL transport or server failure outside the oracle
    /// comparison, e.g. the history query itself failing.
    #[error("sql error: {0}")]
    Sql(#[from] SqlError),

    /// The server and the shadow catalog disagreed on a statement's outcome.
    #[error(
        "divergence executing {sql}\n  local err: {local:?}\n  remote err: {server:?}\n{dump}"
    )]
    Divergence {
        /// The statement whose outcomes differ.
        sql: String,
        /// The local applier error, if any.
        local: Option<String>,
        /// The recorded server error, if any.
        server: Option<String>,
        /// Debug dump of the affected table, when one is attached.
        dump: String,
    },

    /// The DDL history could not be reconciled one-to-one with the batch.
    #[error("linearization failure:\n{detail}")]
    Linearization {
        /// History, task and partial-order listings.
        detail: String,
    },

    /// The shadow catalog detected an impossible state.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// A row of `admin show ddl jobs` did not have the expected shape.
    #[error("malformed ddl history row: {0}")]
    MalformedHistory(String),

    /// The task channel closed while the dispatcher still expected tasks.
    #[error("task channel closed")]
    ChannelClosed,

    /// A fan-out worker panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}
