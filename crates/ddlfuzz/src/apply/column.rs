//! Appliers for column-level DDL.

use ddlfuzz_core::{Column, ColumnPos, Error, Result};

use crate::apply::{live_table, ApplyCtx};
use crate::task::{Task, TaskArg};

pub(super) fn add_column(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let (def, pos) = match &task.arg {
        TaskArg::AddColumn { def, pos } => (def, pos),
        other => return Err(Error::Invariant(format!("add column arg {other:?}"))),
    };
    let mut state = table.write();
    if let ColumnPos::After(anchor) = pos {
        if state.position_by_name(anchor).is_none() {
            return Err(Error::ColumnNotExists {
                table: table.name().to_string(),
                column: anchor.clone(),
            });
        }
    }
    let id = state.alloc_col();
    let mut col = Column::from_def(id, def);
    // Existing rows take the new column's default.
    col.rows = vec![col.default.clone(); state.row_count];
    state.insert_column(col, pos).map_err(|err| with_table_name(err, table.name()))
}

pub(super) fn modify_column(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let (orig_pos, orig_id, orig_name, new_name, new_kind, new_default, pos) = match &task.arg {
        TaskArg::ModifyColumn {
            orig_pos,
            orig_id,
            orig_name,
            new_name,
            new_kind,
            new_default,
            pos,
        } => (*orig_pos, *orig_id, orig_name, new_name, new_kind, new_default, pos),
        other => return Err(Error::Invariant(format!("modify column arg {other:?}"))),
    };
    let mut state = table.write();
    let current = state.position(orig_id).ok_or_else(|| Error::ColumnNotExists {
        table: table.name().to_string(),
        column: orig_name.clone(),
    })?;
    // A statement with an AFTER clause whose anchor a prior applier dropped
    // failed on the server as well; reject before touching anything.
    if let ColumnPos::After(anchor) = pos {
        if state.position_by_name(anchor).is_none() {
            return Err(Error::ColumnNotExists {
                table: table.name().to_string(),
                column: anchor.clone(),
            });
        }
    }
    // Prefer the position recorded at prepare time; earlier appliers of the
    // same batch may have shifted it.
    let remove_at = if state.columns.get(orig_pos).map(|c| c.id) == Some(orig_id) {
        orig_pos
    } else {
        current
    };

    let mut col = state.columns.remove(remove_at);
    col.name = new_name.clone();
    col.kind = *new_kind;
    col.default = new_default.clone();
    col.set_recovered();

    // The insert position is recomputed against the post-removal sequence.
    // `Last` means the statement carried no positional clause: the column
    // keeps its place.
    match pos {
        ColumnPos::First => state.columns.insert(0, col),
        ColumnPos::Last => {
            let at = remove_at.min(state.columns.len());
            state.columns.insert(at, col);
        }
        ColumnPos::After(anchor) => {
            // The anchor exists and is never the column itself, so it
            // survives the removal.
            let at = state.position_by_name(anchor).ok_or_else(|| {
                Error::Invariant(format!("modify column anchor `{anchor}` vanished mid-apply"))
            })?;
            state.columns.insert(at + 1, col);
        }
    }
    Ok(())
}

pub(super) fn drop_column(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let (id, name) = match &task.arg {
        TaskArg::DropColumn { id, name } => (*id, name),
        other => return Err(Error::Invariant(format!("drop column arg {other:?}"))),
    };
    let mut state = table.write();
    let at = state.position_by_name(name).ok_or_else(|| Error::ColumnNotExists {
        table: table.name().to_string(),
        column: name.clone(),
    })?;
    // An index registered since the prepare protects the column after all;
    // lift the tombstone so later preparers may pick it again.
    if state.columns[at].index_refs > 0 {
        state.columns[at].set_recovered();
        return Err(Error::ColumnIndexed {
            table: table.name().to_string(),
            column: name.clone(),
        });
    }
    let col = state.columns.remove(at);
    debug_assert_eq!(col.id, id);
    // A dropped generated column detaches from its base.
    if let Some(base_id) = col.depends_on {
        if let Some(base) = state.col_mut(base_id) {
            base.dependents.retain(|dep| *dep != col.id);
        }
    }
    Ok(())
}

pub(super) fn set_default_value(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    let table = live_table(ctx, task)?;
    let (id, name, value) = match &task.arg {
        TaskArg::SetDefault { id, name, value } => (*id, name, value),
        other => return Err(Error::Invariant(format!("set default arg {other:?}"))),
    };
    let mut state = table.write();
    let col = state.col_mut(id).ok_or_else(|| Error::ColumnNotExists {
        table: table.name().to_string(),
        column: name.clone(),
    })?;
    col.default = value.clone();
    Ok(())
}

fn with_table_name(err: Error, table: &str) -> Error {
    match err {
        Error::ColumnNotExists { column, .. } => Error::ColumnNotExists {
            table: table.to_string(),
            column,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{SqlError, SqlExecutor};
    use crate::task::{DdlKind, Target};
    use async_trait::async_trait;
    use ddlfuzz_core::value::{ColumnDef, ColumnKind, ColumnValue};
    use ddlfuzz_core::{Catalog, Table, TableState};
    use std::result::Result;
    use std::sync::Arc;

    struct NoopExecutor;

    #[async_trait]
    impl SqlExecutor for NoopExecutor {
        async fn exec(&self, _sql: &str) -> Result<(), SqlError> {
            Ok(())
        }
        async fn query(&self, _sql: &str) -> Result<Vec<Vec<String>>, SqlError> {
            Ok(Vec::new())
        }
        async fn query_single(&self, _sql: &str) -> Result<Option<String>, SqlError> {
            Ok(None)
        }
    }

    fn plain_def(name: &str) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            kind: ColumnKind::Int,
            default: ColumnValue::Int(0),
            generated: None,
        }
    }

    fn fixture(names: &[&str]) -> (Catalog, Arc<Table>) {
        let catalog = Catalog::new();
        let mut state = TableState::new(String::new(), "utf8", "utf8_general_ci");
        for name in names {
            state.push_column_from_def(&plain_def(name)).unwrap();
        }
        let table = Arc::new(Table::new("t".to_string(), state));
        catalog.tables().insert(Arc::clone(&table));
        (catalog, table)
    }

    fn names(table: &Table) -> Vec<String> {
        table.read().columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Adding a column FIRST puts it ahead of the rest.
    #[test]
    fn add_column_first() {
        let (catalog, table) = fixture(&["a"]);
        let executor: Arc<dyn SqlExecutor> = Arc::new(NoopExecutor);
        let ctx = ApplyCtx { catalog: &catalog, executor: &executor, db: "test" };

        table.write().row_count = 3;
        let task = Task::new(
            DdlKind::AddColumn,
            String::new(),
            Target::Table(Arc::clone(&table)),
            TaskArg::AddColumn { def: plain_def("b"), pos: ColumnPos::First },
        );
        add_column(&ctx, &task).unwrap();
        assert_eq!(names(&table), ["b", "a"]);
        // Backfilled with the default for every existing row.
        assert_eq!(table.read().columns[0].rows.len(), 3);
    }

    /// AFTER X moves the column immediately after X, and an
    /// AFTER anchored on the column itself leaves the order unchanged.
    #[test]
    fn modify_column_positions() {
        let (catalog, table) = fixture(&["a", "b", "c", "d"]);
        let executor: Arc<dyn SqlExecutor> = Arc::new(NoopExecutor);
        let ctx = ApplyCtx { catalog: &catalog, executor: &executor, db: "test" };

        let id_b = table.read().columns[1].id;
        let mk = |pos: ColumnPos| {
            Task::new(
                DdlKind::ModifyColumn,
                String::new(),
                Target::Table(Arc::clone(&table)),
                TaskArg::ModifyColumn {
                    orig_pos: 1,
                    orig_id: id_b,
                    orig_name: "b".to_string(),
                    new_name: "b".to_string(),
                    new_kind: ColumnKind::BigInt,
                    new_default: ColumnValue::Int(1),
                    pos,
                },
            )
        };

        modify_column(&ctx, &mk(ColumnPos::After("d".to_string()))).unwrap();
        assert_eq!(names(&table), ["a", "c", "d", "b"]);
        assert_eq!(table.read().col(id_b).unwrap().kind, ColumnKind::BigInt);

        // Move back after `a`, then anchor on itself: order must not change.
        let task = Task::new(
            DdlKind::ModifyColumn,
            String::new(),
            Target::Table(Arc::clone(&table)),
            TaskArg::ModifyColumn {
                orig_pos: 3,
                orig_id: id_b,
                orig_name: "b".to_string(),
                new_name: "b".to_string(),
                new_kind: ColumnKind::BigInt,
                new_default: ColumnValue::Int(1),
                pos: ColumnPos::After("a".to_string()),
            },
        );
        modify_column(&ctx, &task).unwrap();
        assert_eq!(names(&table), ["a", "b", "c", "d"]);

        // No positional clause (the anchor would have been the column
        // itself): the order must not change.
        let task = Task::new(
            DdlKind::ModifyColumn,
            String::new(),
            Target::Table(Arc::clone(&table)),
            TaskArg::ModifyColumn {
                orig_pos: 1,
                orig_id: id_b,
                orig_name: "b".to_string(),
                new_name: "b".to_string(),
                new_kind: ColumnKind::BigInt,
                new_default: ColumnValue::Int(1),
                pos: ColumnPos::Last,
            },
        );
        modify_column(&ctx, &task).unwrap();
        assert_eq!(names(&table), ["a", "b", "c", "d"]);

        // An AFTER anchor a prior applier removed fails without reordering,
        // matching the server's rejection of the statement.
        let task = Task::new(
            DdlKind::ModifyColumn,
            String::new(),
            Target::Table(Arc::clone(&table)),
            TaskArg::ModifyColumn {
                orig_pos: 1,
                orig_id: id_b,
                orig_name: "b".to_string(),
                new_name: "b".to_string(),
                new_kind: ColumnKind::BigInt,
                new_default: ColumnValue::Int(1),
                pos: ColumnPos::After("gone".to_string()),
            },
        );
        let err = modify_column(&ctx, &task).unwrap_err();
        assert!(matches!(err, Error::ColumnNotExists { .. }));
        assert_eq!(names(&table), ["a", "b", "c", "d"]);
    }

    #[test]
    fn rename_change_keeps_identity() {
        let (catalog, table) = fixture(&["a", "b"]);
        let executor: Arc<dyn SqlExecutor> = Arc::new(NoopExecutor);
        let ctx = ApplyCtx { catalog: &catalog, executor: &executor, db: "test" };

        let id_a = table.read().columns[0].id;
        table.write().col_mut(id_a).unwrap().index_refs = 2;
        table.write().col_mut(id_a).unwrap().set_renamed();

        let task = Task::new(
            DdlKind::ModifyColumn,
            String::new(),
            Target::Table(Arc::clone(&table)),
            TaskArg::ModifyColumn {
                orig_pos: 0,
                orig_id: id_a,
                orig_name: "a".to_string(),
                new_name: "a2".to_string(),
                new_kind: ColumnKind::BigInt,
                new_default: ColumnValue::Int(9),
                pos: ColumnPos::Last,
            },
        );
        modify_column(&ctx, &task).unwrap();
        let state = table.read();
        let col = state.col(id_a).unwrap();
        // Same id: the refcount and pickability survive the rename.
        assert_eq!(col.name, "a2");
        assert_eq!(col.index_refs, 2);
        assert!(col.is_pickable());
    }

    #[test]
    fn drop_refused_by_late_index_recovers_the_tombstone() {
        let (catalog, table) = fixture(&["a", "b"]);
        let executor: Arc<dyn SqlExecutor> = Arc::new(NoopExecutor);
        let ctx = ApplyCtx { catalog: &catalog, executor: &executor, db: "test" };

        let id_a = table.read().columns[0].id;
        table.write().col_mut(id_a).unwrap().set_deleted();
        table.write().col_mut(id_a).unwrap().index_refs = 1;

        let task = Task::new(
            DdlKind::DropColumn,
            String::new(),
            Target::Table(Arc::clone(&table)),
            TaskArg::DropColumn { id: id_a, name: "a".to_string() },
        );
        let err = drop_column(&ctx, &task).unwrap_err();
        assert!(matches!(err, Error::ColumnIndexed { .. }));
        let state = table.read();
        assert!(state.col(id_a).unwrap().is_pickable());
        assert_eq!(state.columns.len(), 2);
    }

    #[test]
    fn drop_of_generated_column_detaches_the_base() {
        let (catalog, table) = fixture(&["base"]);
        let executor: Arc<dyn SqlExecutor> = Arc::new(NoopExecutor);
        let ctx = ApplyCtx { catalog: &catalog, executor: &executor, db: "test" };

        let gen_id = {
            let mut state = table.write();
            state
                .push_column_from_def(&ColumnDef {
                    name: "gen".to_string(),
                    kind: ColumnKind::BigInt,
                    default: ColumnValue::Null,
                    generated: Some(ddlfuzz_core::value::GeneratedDef {
                        base: "base".to_string(),
                        expr: "`base` + 1".to_string(),
                    }),
                })
                .unwrap()
        };
        let base_id = table.read().columns[0].id;
        assert_eq!(table.read().col(base_id).unwrap().dependents, vec![gen_id]);

        let task = Task::new(
            DdlKind::DropColumn,
            String::new(),
            Target::Table(Arc::clone(&table)),
            TaskArg::DropColumn { id: gen_id, name: "gen".to_string() },
        );
        drop_column(&ctx, &task).unwrap();
        assert!(table.read().col(base_id).unwrap().dependents.is_empty());
    }
}
