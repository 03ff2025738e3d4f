//! Appliers: one per DDL kind.
//!
//! An applier replays a task's mutation against the shadow catalog, assuming
//! the server already committed it. Because the order oracle hands tasks over
//! in true committed order, the only surprises left are effects of *earlier*
//! appliers in the same batch; every applier therefore re-checks that its
//! target still exists before touching it. Errors returned here are benign
//! local rejections compared against the server's verdict, except
//! invariant violations, which the dispatcher escalates.

mod column;
mod index;
mod schema;
mod table;

use std::sync::Arc;

use ddlfuzz_core::{Catalog, Error, Result};

use crate::executor::SqlExecutor;
use crate::task::{DdlKind, Task};

/// Everything an applier may touch.
pub struct ApplyCtx<'a> {
    /// The shadow catalog.
    pub catalog: &'a Catalog,
    /// Execution handle, for the appliers that read server state back.
    pub executor: &'a Arc<dyn SqlExecutor>,
    /// Name of the working database.
    pub db: &'a str,
}

/// Replay one task against the shadow catalog.
pub async fn apply(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    match task.kind {
        DdlKind::CreateSchema => schema::create_schema(ctx, task),
        DdlKind::DropSchema => schema::drop_schema(ctx, task),
        DdlKind::CreateTable => table::create_table(ctx, task),
        DdlKind::DropTable => table::drop_table(ctx, task),
        DdlKind::RenameTable => table::rename_table(ctx, task),
        DdlKind::TruncateTable => table::truncate_table(ctx, task),
        DdlKind::ModifyTableComment => table::modify_comment(ctx, task),
        DdlKind::ModifyTableCharset => table::modify_charset(ctx, task),
        DdlKind::ShardRowBits => table::shard_row_bits(ctx, task),
        DdlKind::RebaseAutoInc => table::rebase_auto_inc(ctx, task).await,
        DdlKind::CreateView => table::create_view(ctx, task),
        DdlKind::AddIndex => index::add_index(ctx, task),
        DdlKind::RenameIndex => index::rename_index(ctx, task),
        DdlKind::DropIndex => index::drop_index(ctx, task),
        DdlKind::AddColumn => column::add_column(ctx, task),
        DdlKind::ModifyColumn => column::modify_column(ctx, task),
        DdlKind::DropColumn => column::drop_column(ctx, task),
        DdlKind::SetDefaultValue => column::set_default_value(ctx, task),
    }
}

/// The table a task must operate on, failing like the server would when a
/// prior applier already removed it.
fn live_table<'t>(ctx: &ApplyCtx<'_>, task: &'t Task) -> Result<&'t Arc<ddlfuzz_core::Table>> {
    let table = task
        .target
        .table()
        .ok_or_else(|| Error::Invariant(format!("task {:?} carries no table", task.kind)))?;
    if ctx.catalog.is_table_removed(table) {
        return Err(Error::TableNotExists(table.name().to_string()));
    }
    Ok(table)
}
