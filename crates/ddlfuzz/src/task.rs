//! Tasks: one prepared DDL statement plus everything its applier needs.

use std::sync::Arc;

use ddlfuzz_core::value::{ColumnDef, ColumnKind, ColumnValue};
use ddlfuzz_core::{ColId, ColumnPos, Schema, Table, View};

use crate::executor::SqlError;

/// Every DDL kind the fuzzer generates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DdlKind {
    CreateTable,
    DropTable,
    AddIndex,
    DropIndex,
    AddColumn,
    ModifyColumn,
    DropColumn,
    CreateView,
    CreateSchema,
    DropSchema,
    RenameTable,
    RenameIndex,
    TruncateTable,
    ShardRowBits,
    RebaseAutoInc,
    SetDefaultValue,
    ModifyTableComment,
    ModifyTableCharset,
}

/// The catalog entity a task operates on. Exactly one per task.
#[derive(Clone, Debug)]
pub enum Target {
    /// A table (or, for create-table, the table to be registered).
    Table(Arc<Table>),
    /// A schema.
    Schema(Arc<Schema>),
    /// A view.
    View(Arc<View>),
}

impl Target {
    /// The table handle, when the target is a table.
    pub fn table(&self) -> Option<&Arc<Table>> {
        match self {
            Target::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Short description for diagnostics: entity kind, name and server id.
    pub fn describe(&self) -> String {
        match self {
            Target::Table(t) => format!("table `{}` id={:?}", t.name(), t.server_id()),
            Target::Schema(s) => format!("schema `{}` id={:?}", s.name(), s.server_id()),
            Target::View(v) => format!("view `{}` id={:?}", v.name(), v.server_id()),
        }
    }
}

/// Kind-specific arguments carried from preparer to applier.
///
/// The dispatcher never looks inside; only the applier for the matching kind
/// does.
#[derive(Clone, Debug)]
pub enum TaskArg {
    /// No arguments beyond the target.
    None,
    /// Rename-table: the successor object to register.
    RenameTable {
        /// The live replacement table sharing the old table's state.
        new_table: Arc<Table>,
    },
    /// New table comment.
    TableComment {
        /// Replacement comment text.
        comment: String,
    },
    /// New table charset/collation.
    TableCharset {
        /// Target character set.
        charset: String,
        /// Target collation.
        collate: String,
    },
    /// New `SHARD_ROW_ID_BITS` value.
    ShardRowBits {
        /// Requested bit count.
        bits: u32,
    },
    /// Requested auto-increment rebase target.
    RebaseAutoInc {
        /// The value sent to the server; the applier reads back the value the
        /// server actually settled on.
        target: i64,
    },
    /// Add-index: the index to register.
    AddIndex {
        /// Index name.
        name: String,
        /// Member columns as `(id, name)` pairs, in index order.
        columns: Vec<(ColId, String)>,
        /// Canonical signature over the member names.
        signature: String,
    },
    /// Rename-index.
    RenameIndex {
        /// Name at prepare time.
        from: String,
        /// Replacement name.
        to: String,
    },
    /// Drop-index.
    DropIndex {
        /// Name of the index to remove.
        name: String,
    },
    /// Add-column: blueprint plus position.
    AddColumn {
        /// The column blueprint.
        def: ColumnDef,
        /// Where to insert it.
        pos: ColumnPos,
    },
    /// Modify-column (in place or rename-change) plus positional move.
    ModifyColumn {
        /// Position of the column at prepare time.
        orig_pos: usize,
        /// Stable id of the column.
        orig_id: ColId,
        /// Name at prepare time.
        orig_name: String,
        /// Name after the change (same as `orig_name` for in-place modify).
        new_name: String,
        /// Kind after the change.
        new_kind: ColumnKind,
        /// Default after the change.
        new_default: ColumnValue,
        /// Where the column ends up. Mirrors the statement exactly: `After`
        /// if and only if an AFTER clause was emitted, `Last` when no
        /// positional clause was (the column keeps its place).
        pos: ColumnPos,
    },
    /// Drop-column.
    DropColumn {
        /// Stable id of the condemned column.
        id: ColId,
        /// Name at prepare time.
        name: String,
    },
    /// Set-default-value.
    SetDefault {
        /// Stable id of the column.
        id: ColId,
        /// Name at prepare time.
        name: String,
        /// The new default.
        value: ColumnValue,
    },
}

/// One prepared DDL statement in flight.
#[derive(Clone, Debug)]
pub struct Task {
    /// DDL kind.
    pub kind: DdlKind,
    /// The exact statement sent to the server.
    pub sql: String,
    /// The entity the statement operates on.
    pub target: Target,
    /// Kind-specific applier arguments.
    pub arg: TaskArg,
    /// Server history job id; zero until the order oracle stamps it.
    pub job_id: i64,
    /// Non-ignorable error the server returned for this statement, if any.
    pub server_err: Option<SqlError>,
}

impl Task {
    /// A fresh, unstamped task.
    pub fn new(kind: DdlKind, sql: String, target: Target, arg: TaskArg) -> Task {
        Task {
            kind,
            sql,
            target,
            arg,
            job_id: 0,
            server_err: None,
        }
    }
}
