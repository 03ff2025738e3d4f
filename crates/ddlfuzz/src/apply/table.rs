//! Appliers for table-level DDL.

use std::sync::Arc;

use ddlfuzz_core::{Error, Result};

use crate::apply::{live_table, ApplyCtx};
use crate::task::{Target, Task, TaskArg};

pub(super) fn create_table(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table_unchecked(task)?;
    ctx.catalog.tables().insert(Arc::clone(table));
    Ok(())
}

pub(super) fn drop_table(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = task
        .target
        .table()
        .ok_or_else(|| Error::Invariant("drop table without a table".to_string()))?;
    let mut tables = ctx.catalog.tables();
    if !tables.contains(table.name()) {
        return Err(Error::TableNotExists(table.name().to_string()));
    }
    tables.remove(table.name());
    Ok(())
}

pub(super) fn rename_table(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = task
        .target
        .table()
        .ok_or_else(|| Error::Invariant("rename table without a table".to_string()))?;
    let new_table = match &task.arg {
        TaskArg::RenameTable { new_table } => new_table,
        other => return Err(Error::Invariant(format!("rename table arg {other:?}"))),
    };
    let mut tables = ctx.catalog.tables();
    if !tables.contains(table.name()) {
        return Err(Error::TableNotExists(table.name().to_string()));
    }
    tables.remove(table.name());
    tables.insert(Arc::clone(new_table));
    Ok(())
}

pub(super) fn truncate_table(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let mut state = table.write();
    state.row_count = 0;
    for col in &mut state.columns {
        if !col.is_generated() {
            col.rows.clear();
        }
    }
    Ok(())
}

pub(super) fn modify_comment(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    match &task.arg {
        TaskArg::TableComment { comment } => {
            table.write().comment = comment.clone();
            Ok(())
        }
        other => Err(Error::Invariant(format!("modify comment arg {other:?}"))),
    }
}

pub(super) fn modify_charset(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    match &task.arg {
        TaskArg::TableCharset { charset, collate } => {
            let mut state = table.write();
            state.charset = charset.clone();
            state.collate = collate.clone();
            Ok(())
        }
        other => Err(Error::Invariant(format!("modify charset arg {other:?}"))),
    }
}

pub(super) fn shard_row_bits(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    match &task.arg {
        TaskArg::ShardRowBits { bits } => {
            table.write().shard_row_bits = *bits;
            Ok(())
        }
        other => Err(Error::Invariant(format!("shard row bits arg {other:?}"))),
    }
}

/// The rebase target the server settles on can differ from the one requested,
/// so read the cursor back instead of trusting the task.
pub(super) async fn rebase_auto_inc(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let sql = format!(
        "select auto_increment from information_schema.tables \
         where table_schema='{}' and table_name='{}'",
        ctx.db,
        table.name(),
    );
    // A failed read-back doesn't matter; the next rebase prepares from
    // whatever cursor we have.
    if let Ok(Some(value)) = ctx.executor.query_single(&sql).await {
        if let Ok(value) = value.parse::<i64>() {
            table.write().auto_inc = value;
        }
    }
    Ok(())
}

pub(super) fn create_view(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    match &task.target {
        Target::View(view) => {
            ctx.catalog.views().insert(Arc::clone(view));
            Ok(())
        }
        other => Err(Error::Invariant(format!("create view on {}", other.describe()))),
    }
}

fn live_table_unchecked(task: &Task) -> Result<&Arc<ddlfuzz_core::Table>> {
    task.target
        .table()
        .ok_or_else(|| Error::Invariant("create table without a table".to_string()))
}
