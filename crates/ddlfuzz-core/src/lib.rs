//! The core crate for ddlfuzz, providing the shadow catalog and column model.
//!
//! The shadow catalog is an in-memory mirror of the schema state a remote SQL
//! server is expected to hold after a sequence of DDL statements. The fuzzer
//! engine mutates it through preparers (optimistic marks before a statement is
//! sent) and appliers (committed mutations replayed in the server's order).

#![deny(missing_docs)]

pub mod catalog;
pub mod error;
pub mod value;

pub use catalog::{
    Catalog, ColId, Column, ColumnPos, Entity, Index, NameMap, Schema, Table, TableState, View,
};
pub use error::{Error, Result};
pub use value::{ColumnDef, ColumnKind, ColumnValue};
