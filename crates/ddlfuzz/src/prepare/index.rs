//! Preparers for index-level DDL.

use rand::seq::SliceRandom;
use rand::Rng;

use ddlfuzz_core::value::unique_name;
use ddlfuzz_core::{Catalog, ColId, Index};

use crate::task::{DdlKind, Target, Task, TaskArg};

/// An index never spans more than this many columns.
const MAX_INDEX_COLUMNS: usize = 10;

pub(super) fn add_index<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let (members, signature) = {
        let state = table.read();
        if state.columns.is_empty() {
            return None;
        }
        let mut members: Vec<(ColId, String)> = Vec::new();
        // Four strategies: first column, last column, a random single column,
        // or a random multi-column prefix capped at MAX_INDEX_COLUMNS.
        match rng.gen_range(0..4) {
            0 => {
                let col = &state.columns[0];
                if !col.kind.can_be_index() {
                    return None;
                }
                members.push((col.id, col.name.clone()));
            }
            1 => {
                let col = state.columns.last()?;
                if !col.kind.can_be_index() {
                    return None;
                }
                members.push((col.id, col.name.clone()));
            }
            2 => {
                let col = &state.columns[rng.gen_range(0..state.columns.len())];
                if !col.kind.can_be_index() {
                    return None;
                }
                members.push((col.id, col.name.clone()));
            }
            _ => {
                let want = rng.gen_range(1..=state.columns.len()).min(MAX_INDEX_COLUMNS);
                let mut order: Vec<usize> = (0..state.columns.len()).collect();
                order.shuffle(rng);
                for &at in order.iter().take(want) {
                    let col = &state.columns[at];
                    if col.kind.can_be_index() {
                        members.push((col.id, col.name.clone()));
                    }
                }
            }
        }
        if members.is_empty() {
            return None;
        }
        let signature = Index::signature_of(members.iter().map(|(_, name)| name.as_str()));
        if state.has_index_signature(&signature) {
            return None;
        }
        (members, signature)
    };

    let name = unique_name(rng);
    let sql = format!(
        "ALTER TABLE `{}` ADD INDEX `{}` ({})",
        table.name(),
        name,
        super::backtick_list(members.iter().map(|(_, n)| n.as_str())),
    );
    Some(Task::new(
        DdlKind::AddIndex,
        sql,
        Target::Table(table),
        TaskArg::AddIndex { name, columns: members, signature },
    ))
}

pub(super) fn rename_index<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let from = {
        let state = table.read();
        if state.indexes.is_empty() {
            return None;
        }
        state.indexes[rng.gen_range(0..state.indexes.len())].name.clone()
    };
    let to = unique_name(rng);
    let sql = format!("ALTER TABLE `{}` RENAME INDEX `{from}` to `{to}`", table.name());
    Some(Task::new(
        DdlKind::RenameIndex,
        sql,
        Target::Table(table),
        TaskArg::RenameIndex { from, to },
    ))
}

pub(super) fn drop_index<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let name = {
        let state = table.read();
        if state.indexes.is_empty() {
            return None;
        }
        state.indexes[rng.gen_range(0..state.indexes.len())].name.clone()
    };
    let sql = format!("ALTER TABLE `{}` DROP INDEX `{name}`", table.name());
    Some(Task::new(
        DdlKind::DropIndex,
        sql,
        Target::Table(table),
        TaskArg::DropIndex { name },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddlfuzz_core::value::{ColumnDef, ColumnKind, ColumnValue};
    use ddlfuzz_core::{Table, TableState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn catalog_with_columns(kinds: &[(&str, ColumnKind)]) -> Catalog {
        let catalog = Catalog::new();
        let mut state = TableState::new(String::new(), "utf8", "utf8_general_ci");
        for (name, kind) in kinds {
            state
                .push_column_from_def(&ColumnDef {
                    name: name.to_string(),
                    kind: *kind,
                    default: ColumnValue::Null,
                    generated: None,
                })
                .unwrap();
        }
        catalog.tables().insert(Arc::new(Table::new("t".to_string(), state)));
        catalog
    }

    #[test]
    fn blob_only_tables_produce_no_index() {
        let catalog = catalog_with_columns(&[("a", ColumnKind::Blob), ("b", ColumnKind::Text)]);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..128 {
            assert!(add_index(&catalog, &mut rng).is_none());
        }
    }

    #[test]
    fn duplicate_signatures_are_rejected() {
        let catalog = catalog_with_columns(&[("a", ColumnKind::Int)]);
        let mut rng = StdRng::seed_from_u64(2);
        let task = add_index(&catalog, &mut rng).unwrap();
        let (signature, columns) = match task.arg {
            TaskArg::AddIndex { signature, columns, .. } => (signature, columns),
            other => panic!("unexpected arg {other:?}"),
        };
        assert_eq!(signature, "a,");

        // Register the index as applied; every further attempt must dedupe.
        let table = catalog.tables().get("t").unwrap();
        table.write().indexes.push(Index {
            name: "ix".to_string(),
            signature,
            columns: columns.into_iter().map(|(id, _)| id).collect(),
        });
        for _ in 0..128 {
            assert!(add_index(&catalog, &mut rng).is_none());
        }
    }

    #[test]
    fn rename_and_drop_need_an_index() {
        let catalog = catalog_with_columns(&[("a", ColumnKind::Int)]);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(rename_index(&catalog, &mut rng).is_none());
        assert!(drop_index(&catalog, &mut rng).is_none());
    }
}
