//! Appliers for schema-level DDL.

use std::sync::Arc;

use ddlfuzz_core::{Error, Result};

use crate::apply::ApplyCtx;
use crate::task::{Target, Task};

pub(super) fn create_schema(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    match &task.target {
        Target::Schema(schema) => {
            ctx.catalog.schemas().insert(Arc::clone(schema));
            Ok(())
        }
        other => Err(Error::Invariant(format!("create schema on {}", other.describe()))),
    }
}

pub(super) fn drop_schema(ctx: &ApplyCtx<'_>, task: &Task) -> Result<()> {
    match &task.target {
        Target::Schema(schema) => {
            let mut schemas = ctx.catalog.schemas();
            if !schemas.contains(schema.name()) {
                return Err(Error::SchemaNotExists(schema.name().to_string()));
            }
            schemas.remove(schema.name());
            Ok(())
        }
        other => Err(Error::Invariant(format!("drop schema on {}", other.describe()))),
    }
}
