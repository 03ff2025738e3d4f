//! Appliers for index-level DDL.

use ddlfuzz_core::{Error, Index, Result};

use crate::apply::{live_table, ApplyCtx};
use crate::task::{Task, TaskArg};

pub(super) fn add_index(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let (name, columns, signature) = match &task.arg {
        TaskArg::AddIndex { name, columns, signature } => (name, columns, signature),
        other => return Err(Error::Invariant(format!("add index arg {other:?}"))),
    };
    let mut state = table.write();
    // A member dropped by an earlier applier of this batch sinks the index,
    // exactly as it sank the statement on the server.
    for (id, col_name) in columns {
        if state.position(*id).is_none() {
            return Err(Error::ColumnNotExists {
                table: table.name().to_string(),
                column: col_name.clone(),
            });
        }
    }
    state.indexes.push(Index {
        name: name.clone(),
        signature: signature.clone(),
        columns: columns.iter().map(|(id, _)| *id).collect(),
    });
    for (id, _) in columns {
        if let Some(col) = state.col_mut(*id) {
            col.index_refs += 1;
        }
    }
    Ok(())
}

pub(super) fn rename_index(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let (from, to) = match &task.arg {
        TaskArg::RenameIndex { from, to } => (from, to),
        other => return Err(Error::Invariant(format!("rename index arg {other:?}"))),
    };
    let mut state = table.write();
    let at = state.index_position(from).ok_or_else(|| Error::IndexNotExists {
        table: table.name().to_string(),
        index: from.clone(),
    })?;
    state.indexes[at].name = to.clone();
    Ok(())
}

pub(super) fn drop_index(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let name = match &task.arg {
        TaskArg::DropIndex { name } => name,
        other => return Err(Error::Invariant(format!("drop index arg {other:?}"))),
    };
    let mut state = table.write();
    let at = state.index_position(name).ok_or_else(|| Error::IndexNotExists {
        table: table.name().to_string(),
        index: name.clone(),
    })?;
    let index = state.indexes.remove(at);
    for id in &index.columns {
        let col = state.col_mut(*id).ok_or_else(|| {
            Error::Invariant(format!(
                "index `{}` references missing column {id} on table `{}`",
                index.name,
                table.name(),
            ))
        })?;
        if col.index_refs == 0 {
            return Err(Error::Invariant(format!(
                "index reference count underflow on column `{}` of table `{}`",
                col.name,
                table.name(),
            )));
        }
        col.index_refs -= 1;
    }
    Ok(())
}
