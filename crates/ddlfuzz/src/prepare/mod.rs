//! Preparers: one per DDL kind.
//!
//! A preparer picks a target under the appropriate locks, validates
//! eligibility, synthesizes the statement, marks any optimistic catalog
//! state, and emits one task. It returns `None` whenever no eligible target
//! exists or an eligibility rule fires; those are silent non-events. Locks
//! are released before the statement is sent.

mod column;
mod index;
mod schema;
mod table;

use rand::seq::SliceRandom;
use rand::Rng;

use ddlfuzz_core::Catalog;

use crate::task::{DdlKind, Task};

/// The two spellings the server accepts for the schema object keyword.
const DB_SCHEMA_SYNTAX: [&str; 2] = ["DATABASE", "SCHEMA"];

/// The two spellings the server accepts in `ALTER TABLE ... RENAME`.
const TO_AS_SYNTAX: [&str; 2] = ["TO", "AS"];

/// Run the preparer for one kind against the catalog.
pub fn prepare<R: Rng>(kind: DdlKind, catalog: &Catalog, rng: &mut R) -> Option<Task> {
    match kind {
        DdlKind::CreateSchema => schema::create_schema(catalog, rng),
        DdlKind::DropSchema => schema::drop_schema(catalog, rng),
        DdlKind::CreateTable => table::create_table(catalog, rng),
        DdlKind::DropTable => table::drop_table(catalog, rng),
        DdlKind::RenameTable => table::rename_table(catalog, rng),
        DdlKind::TruncateTable => table::truncate_table(catalog, rng),
        DdlKind::ModifyTableComment => table::modify_comment(catalog, rng),
        DdlKind::ModifyTableCharset => table::modify_charset(catalog, rng),
        DdlKind::ShardRowBits => table::shard_row_bits(catalog, rng),
        DdlKind::RebaseAutoInc => table::rebase_auto_inc(catalog, rng),
        DdlKind::CreateView => table::create_view(catalog, rng),
        DdlKind::AddIndex => index::add_index(catalog, rng),
        DdlKind::RenameIndex => index::rename_index(catalog, rng),
        DdlKind::DropIndex => index::drop_index(catalog, rng),
        DdlKind::AddColumn => column::add_column(catalog, rng),
        DdlKind::ModifyColumn => column::modify_column(catalog, rng),
        DdlKind::DropColumn => column::drop_column(catalog, rng),
        DdlKind::SetDefaultValue => column::set_default_value(catalog, rng),
    }
}

fn db_schema_keyword<R: Rng>(rng: &mut R) -> &'static str {
    DB_SCHEMA_SYNTAX.choose(rng).unwrap()
}

fn to_as_keyword<R: Rng>(rng: &mut R) -> &'static str {
    TO_AS_SYNTAX.choose(rng).unwrap()
}

/// Render names as a backtick-quoted, comma-separated list.
fn backtick_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}
