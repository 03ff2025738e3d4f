//! Error and Result types for the shadow catalog.

use thiserror::Error;

/// A convenience `Result` type.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for shadow-catalog mutations.
///
/// Every variant except [`Error::Invariant`] describes a *local rejection*: the
/// shadow catalog refused a mutation because the target is gone or protected.
/// Local rejections are expected during a fuzzing run and are compared against
/// the server's verdict for the same statement. An invariant violation means
/// the catalog itself is corrupt and the run must stop.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema is no longer present in the catalog.
    #[error("schema {0} is not exists")]
    SchemaNotExists(String),

    /// The table is no longer present in the catalog.
    #[error("table {0} is not exists")]
    TableNotExists(String),

    /// The column is no longer present in its table.
    #[error("column {column} on table {table} is not exists")]
    ColumnNotExists {
        /// Owning table name.
        table: String,
        /// Column name as recorded at prepare time.
        column: String,
    },

    /// The index is no longer present in its table.
    #[error("index {index} on table {table} is not exists")]
    IndexNotExists {
        /// Owning table name.
        table: String,
        /// Index name as recorded at prepare time.
        index: String,
    },

    /// A column still referenced by at least one index cannot be dropped.
    #[error("column {column} on table {table} still has index references")]
    ColumnIndexed {
        /// Owning table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// The catalog reached a state that must be impossible, e.g. an index
    /// reference count about to go negative.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl Error {
    /// Whether this error is a fatal catalog invariant violation rather than a
    /// benign local rejection.
    pub fn is_invariant(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }
}
