//! Preparers for table-level DDL.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use ddlfuzz_core::value::{pick_random_charset_collate, unique_name, ColumnDef};
use ddlfuzz_core::{Catalog, Table, TableState, View};

use crate::task::{DdlKind, Target, Task, TaskArg};

/// Upper bound (exclusive) for `SHARD_ROW_ID_BITS` values.
const MAX_SHARD_ROW_BITS: u32 = 7;

pub(super) fn create_table<R: Rng>(_catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let column_count = rng.gen_range(2..=6);
    let defs = ColumnDef::random_set(rng, column_count);
    let (charset, collate) = pick_random_charset_collate(rng);

    // Elect up to two primary-key members among the eligible kinds.
    let pk_candidates: Vec<usize> = defs
        .iter()
        .enumerate()
        .filter(|(_, d)| d.kind.can_be_primary() && d.generated.is_none())
        .map(|(at, _)| at)
        .collect();
    let mut pk_positions: Vec<usize> = Vec::new();
    let pk_fields = rng.gen_range(0..3usize).min(pk_candidates.len());
    if pk_fields > 0 {
        let mut shuffled = pk_candidates;
        shuffled.shuffle(rng);
        pk_positions = shuffled[..pk_fields].to_vec();
        pk_positions.sort_unstable();
    }

    let mut state = TableState::new(unique_name(rng), charset, collate);
    for def in &defs {
        // Generated blueprints always follow their base in the set, so the
        // edge wiring cannot fail here.
        state.push_column_from_def(def).ok()?;
    }
    for &at in &pk_positions {
        state.columns[at].primary_key = true;
    }
    let table = Arc::new(Table::new(unique_name(rng), state));

    let mut sql = format!("CREATE TABLE `{}` (", table.name());
    for (at, def) in defs.iter().enumerate() {
        if at > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&format!("`{}` {}", def.name, def.definition()));
    }
    if !pk_positions.is_empty() {
        let names = pk_positions.iter().map(|&at| defs[at].name.as_str());
        sql.push_str(&format!(", PRIMARY KEY ({})", super::backtick_list(names)));
    }
    let comment = table.read().comment.clone();
    sql.push_str(&format!(
        ") COMMENT '{comment}' CHARACTER SET '{charset}' COLLATE '{collate}'"
    ));

    Some(Task::new(DdlKind::CreateTable, sql, Target::Table(table), TaskArg::None))
}

pub(super) fn drop_table<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let tables = catalog.tables();
    // Never condemn the last live table.
    if tables.live_count() <= 1 {
        return None;
    }
    let table = tables.pick_random(rng)?;
    table.set_deleted();
    let sql = format!("DROP TABLE `{}`", table.name());
    Some(Task::new(DdlKind::DropTable, sql, Target::Table(table), TaskArg::None))
}

pub(super) fn rename_table<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let tables = catalog.tables();
    let table = tables.pick_random(rng)?;
    table.set_deleted();
    let new_table = Arc::new(table.renamed_clone(unique_name(rng)));
    let sql = format!(
        "ALTER TABLE `{}` RENAME {} `{}`",
        table.name(),
        super::to_as_keyword(rng),
        new_table.name(),
    );
    Some(Task::new(
        DdlKind::RenameTable,
        sql,
        Target::Table(table),
        TaskArg::RenameTable { new_table },
    ))
}

pub(super) fn truncate_table<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let sql = format!("TRUNCATE TABLE `{}`", table.name());
    Some(Task::new(DdlKind::TruncateTable, sql, Target::Table(table), TaskArg::None))
}

pub(super) fn modify_comment<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let comment = unique_name(rng);
    let sql = format!("ALTER TABLE `{}` COMMENT '{comment}'", table.name());
    Some(Task::new(
        DdlKind::ModifyTableComment,
        sql,
        Target::Table(table),
        TaskArg::TableComment { comment },
    ))
}

/// Charset conversion is narrowed to utf8 -> utf8mb4 on BLOB-free tables;
/// anything wider is rejected or mangled by servers in ways the shadow
/// catalog cannot predict.
pub(super) fn modify_charset<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let (charset, collate) = {
        let state = table.read();
        if state.has_blob_column() {
            return None;
        }
        let (charset, collate) = pick_random_charset_collate(rng);
        if state.charset != "utf8" || charset != "utf8mb4" {
            return None;
        }
        (charset, collate)
    };
    let sql = format!(
        "ALTER TABLE `{}` CHARACTER SET '{charset}' COLLATE '{collate}'",
        table.name(),
    );
    Some(Task::new(
        DdlKind::ModifyTableCharset,
        sql,
        Target::Table(table),
        TaskArg::TableCharset {
            charset: charset.to_string(),
            collate: collate.to_string(),
        },
    ))
}

pub(super) fn shard_row_bits<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let bits = rng.gen_range(0..MAX_SHARD_ROW_BITS);
    let sql = format!("ALTER TABLE `{}` SHARD_ROW_ID_BITS = {bits}", table.name());
    Some(Task::new(
        DdlKind::ShardRowBits,
        sql,
        Target::Table(table),
        TaskArg::ShardRowBits { bits },
    ))
}

pub(super) fn rebase_auto_inc<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let target = {
        let state = table.read();
        // The rebase must aim above the current cursor.
        if state.auto_inc > i64::MAX - 1_000_001 {
            return None;
        }
        state.auto_inc + rng.gen_range(1..=1_000_000)
    };
    let sql = format!("alter table `{}` auto_increment={target}", table.name());
    Some(Task::new(
        DdlKind::RebaseAutoInc,
        sql,
        Target::Table(table),
        TaskArg::RebaseAutoInc { target },
    ))
}

pub(super) fn create_view<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let columns: Vec<String> = {
        let state = table.read();
        state
            .columns
            .iter()
            .filter(|c| c.is_pickable() && rng.gen_bool(0.5))
            .map(|c| c.name.clone())
            .collect()
    };
    if columns.is_empty() {
        return None;
    }
    let view = Arc::new(View::new(unique_name(rng), columns.clone(), Arc::clone(&table)));
    let sql = format!(
        "create view `{}` as select {} from `{}`",
        view.name(),
        super::backtick_list(columns.iter().map(|name| name.as_str())),
        table.name(),
    );
    Some(Task::new(DdlKind::CreateView, sql, Target::View(view), TaskArg::None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog_with_table(name: &str) -> (Catalog, Arc<Table>) {
        use ddlfuzz_core::value::{ColumnKind, ColumnValue};

        let catalog = Catalog::new();
        let mut state = TableState::new(String::new(), "utf8", "utf8_general_ci");
        for (col, kind) in [("a", ColumnKind::Int), ("b", ColumnKind::Varchar), ("c", ColumnKind::BigInt)] {
            state
                .push_column_from_def(&ColumnDef {
                    name: col.to_string(),
                    kind,
                    default: ColumnValue::Null,
                    generated: None,
                })
                .unwrap();
        }
        let table = Arc::new(Table::new(name.to_string(), state));
        catalog.tables().insert(Arc::clone(&table));
        (catalog, table)
    }

    #[test]
    fn last_live_table_is_never_dropped() {
        let (catalog, _table) = catalog_with_table("only");
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..128 {
            assert!(drop_table(&catalog, &mut rng).is_none());
        }
    }

    #[test]
    fn rename_tombstones_the_source() {
        let (catalog, table) = catalog_with_table("src");
        let mut rng = StdRng::seed_from_u64(2);
        let task = rename_table(&catalog, &mut rng).unwrap();
        assert!(table.is_deleted());
        match &task.arg {
            TaskArg::RenameTable { new_table } => {
                assert!(!new_table.is_deleted());
                assert_ne!(new_table.name(), table.name());
            }
            other => panic!("unexpected arg {other:?}"),
        }
        assert!(task.sql.contains("RENAME"));
    }

    #[test]
    fn charset_conversion_requires_utf8_source() {
        let (catalog, table) = catalog_with_table("t");
        table.write().charset = "latin1".to_string();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..128 {
            assert!(modify_charset(&catalog, &mut rng).is_none());
        }

        table.write().charset = "utf8".to_string();
        let mut rng = StdRng::seed_from_u64(4);
        let mut fired = false;
        for _ in 0..128 {
            if let Some(task) = modify_charset(&catalog, &mut rng) {
                assert!(task.sql.contains("'utf8mb4'"));
                fired = true;
            }
        }
        assert!(fired);
    }

    #[test]
    fn shard_bits_stay_in_range() {
        let (catalog, _table) = catalog_with_table("t");
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..128 {
            let task = shard_row_bits(&catalog, &mut rng).unwrap();
            match task.arg {
                TaskArg::ShardRowBits { bits } => assert!(bits < MAX_SHARD_ROW_BITS),
                ref other => panic!("unexpected arg {other:?}"),
            }
        }
    }

    #[test]
    fn rebase_targets_exceed_the_cursor() {
        let (catalog, table) = catalog_with_table("t");
        table.write().auto_inc = 500;
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..64 {
            let task = rebase_auto_inc(&catalog, &mut rng).unwrap();
            match task.arg {
                TaskArg::RebaseAutoInc { target } => assert!(target > 500),
                ref other => panic!("unexpected arg {other:?}"),
            }
        }
    }
}
