//! Preparers for schema-level DDL.

use std::sync::Arc;

use rand::Rng;

use ddlfuzz_core::value::{pick_random_charset_collate, unique_name};
use ddlfuzz_core::{Catalog, Schema};

use crate::task::{DdlKind, Target, Task, TaskArg};

pub(super) fn create_schema<R: Rng>(_catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let (charset, collate) = pick_random_charset_collate(rng);
    let schema = Arc::new(Schema::new(unique_name(rng), charset, collate));
    let sql = format!(
        "CREATE {} `{}` CHARACTER SET '{}' COLLATE '{}'",
        super::db_schema_keyword(rng),
        schema.name(),
        charset,
        collate,
    );
    Some(Task::new(DdlKind::CreateSchema, sql, Target::Schema(schema), TaskArg::None))
}

pub(super) fn drop_schema<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<Task> {
    let schemas = catalog.schemas();
    let schema = schemas.pick_random(rng)?;
    schema.set_deleted();
    let sql = format!("DROP {} `{}`", super::db_schema_keyword(rng), schema.name());
    Some(Task::new(DdlKind::DropSchema, sql, Target::Schema(schema), TaskArg::None))
}
