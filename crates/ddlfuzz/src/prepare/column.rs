//! Preparers for column-level DDL.

use rand::Rng;

use ddlfuzz_core::value::{ColumnDef, ColumnValue};
use ddlfuzz_core::{Catalog, ColumnPos};

use crate::task::{DdlKind, Target, Task, TaskArg};

pub(super) fn add_column<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let def = ColumnDef::random(rng);
    let (clause, pos) = {
        let state = table.read();
        if state.columns.is_empty() {
            return None;
        }
        match rng.gen_range(0..3) {
            0 => (" FIRST".to_string(), ColumnPos::First),
            1 => (String::new(), ColumnPos::Last),
            _ => {
                // Anchor on a column no in-flight statement is about to
                // destroy, falling back to the tail when none is available.
                let anchors: Vec<&str> = state
                    .columns
                    .iter()
                    .filter(|c| c.is_pickable())
                    .map(|c| c.name.as_str())
                    .collect();
                if anchors.is_empty() {
                    (String::new(), ColumnPos::Last)
                } else {
                    let anchor = anchors[rng.gen_range(0..anchors.len())].to_string();
                    (format!(" AFTER `{anchor}`"), ColumnPos::After(anchor))
                }
            }
        }
    };
    let sql = format!(
        "ALTER TABLE `{}` ADD COLUMN `{}` {}{clause}",
        table.name(),
        def.name,
        def.definition(),
    );
    Some(Task::new(
        DdlKind::AddColumn,
        sql,
        Target::Table(table),
        TaskArg::AddColumn { def, pos },
    ))
}

pub(super) fn modify_column<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let mut state = table.write();
    let (orig_pos, orig_id) = state.pick_random_column(rng)?;

    let (orig_name, orig_kind, has_dependents) = {
        let col = state.col(orig_id)?;
        if !col.kind.can_be_modified() || col.is_generated() {
            return None;
        }
        (col.name.clone(), col.kind, col.has_dependents())
    };

    let rename = rng.gen_bool(0.5);
    // A column other columns are generated from keeps its name.
    if rename && has_dependents {
        return None;
    }
    let new_kind = orig_kind.widened(rng);
    let new_default = if new_kind.can_have_default() {
        new_kind.random_value(rng)
    } else {
        ColumnValue::Null
    };
    let new_name = if rename {
        ddlfuzz_core::value::unique_name(rng)
    } else {
        orig_name.clone()
    };
    let rendered = ColumnDef {
        name: new_name.clone(),
        kind: new_kind,
        default: new_default.clone(),
        generated: None,
    }
    .definition();

    let mut sql = if rename {
        format!(
            "alter table `{}` change column `{orig_name}` `{new_name}` {rendered}",
            table.name(),
        )
    } else {
        format!("alter table `{}` modify column `{orig_name}` {rendered}", table.name())
    };

    // The recorded position mirrors the statement exactly: `After` if and
    // only if an AFTER clause was emitted, `Last` for no clause at all (the
    // column keeps its place, which for the tail strategy anchored on the
    // column itself is the same thing).
    let pos = match rng.gen_range(0..3) {
        0 => {
            sql.push_str(" FIRST");
            ColumnPos::First
        }
        1 => {
            let last = state.columns.last()?;
            if last.name != orig_name {
                sql.push_str(&format!(" AFTER `{}`", last.name));
                ColumnPos::After(last.name.clone())
            } else {
                ColumnPos::Last
            }
        }
        _ => {
            let anchors: Vec<(usize, String)> = state
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_pickable())
                .map(|(at, c)| (at, c.name.clone()))
                .collect();
            let (anchor_pos, anchor) = anchors[rng.gen_range(0..anchors.len())].clone();
            if anchor_pos != orig_pos {
                sql.push_str(&format!(" AFTER `{anchor}`"));
                ColumnPos::After(anchor)
            } else {
                ColumnPos::Last
            }
        }
    };

    if rename {
        state.col_mut(orig_id)?.set_renamed();
    }
    drop(state);

    Some(Task::new(
        DdlKind::ModifyColumn,
        sql,
        Target::Table(table),
        TaskArg::ModifyColumn {
            orig_pos,
            orig_id,
            orig_name,
            new_name,
            new_kind,
            new_default,
            pos,
        },
    ))
}

pub(super) fn drop_column<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let mut state = table.write();
    // Never condemn the last remaining column.
    if state.pickable_count() <= 1 {
        return None;
    }
    let at = match rng.gen_range(0..3) {
        0 => 0,
        1 => state.columns.len() - 1,
        _ => rng.gen_range(0..state.columns.len()),
    };
    let (id, name) = {
        let col = &state.columns[at];
        if !col.is_pickable() {
            return None;
        }
        // Primary-key members, generated-column parents and indexed columns
        // cannot be dropped.
        if col.primary_key || col.has_dependents() || col.index_refs > 0 {
            return None;
        }
        (col.id, col.name.clone())
    };
    state.col_mut(id)?.set_deleted();
    drop(state);

    let sql = format!("ALTER TABLE `{}` DROP COLUMN `{name}`", table.name());
    Some(Task::new(
        DdlKind::DropColumn,
        sql,
        Target::Table(table),
        TaskArg::DropColumn { id, name },
    ))
}

pub(super) fn set_default_value<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let table = catalog.pick_random_table(rng)?;
    let (id, name, value) = {
        let state = table.read();
        let (_, id) = state.pick_random_column(rng)?;
        let col = state.col(id)?;
        if !col.kind.can_have_default() || col.is_generated() {
            return None;
        }
        (id, col.name.clone(), col.kind.random_value(rng))
    };
    let sql = format!(
        "ALTER TABLE `{}` ALTER `{name}` SET DEFAULT {}",
        table.name(),
        value.literal(),
    );
    Some(Task::new(
        DdlKind::SetDefaultValue,
        sql,
        Target::Table(table),
        TaskArg::SetDefault { id, name, value },
    ))
}
