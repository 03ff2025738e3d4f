//! ddlfuzz: a concurrent schema-change fuzzer for MySQL-dialect distributed
//! SQL servers that claim online DDL.
//!
//! The engine fires batches of randomized, independently generated DDL at a
//! remote server in parallel, recovers the server's serialization order from
//! its job history, and replays the batch against the in-memory shadow
//! catalog from [`ddlfuzz_core`]. Any statement where the server and the
//! shadow catalog disagree on success stops the run with a diagnostic; so
//! does a batch the history cannot be reconciled with.

pub mod apply;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod history;
pub mod ignore;
pub mod mysql;
pub mod prepare;
pub mod registry;
pub mod runner;
pub mod task;

pub use config::{FuzzConfig, RunMode};
pub use dispatch::Dispatcher;
pub use error::{EngineError, Result};
pub use executor::{SqlError, SqlExecutor};
pub use ignore::ddl_ignorable;
pub use mysql::MysqlExecutor;
pub use registry::{kind_for_job_type, OpSpec, OPS};
pub use runner::Runner;
pub use task::{DdlKind, Target, Task, TaskArg};
