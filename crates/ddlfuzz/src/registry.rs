//! The static operation registry.
//!
//! One entry per DDL kind: the history `JOB_TYPE` string (bit-exact, this is
//! the match key against `admin show ddl jobs`) and the Bernoulli weight a
//! generation pass rolls against. The entry order *is* the generation order;
//! together with the weights it pins the rng call sequence, so a recorded
//! seed replays the same operation stream. Do not reorder casually.

use crate::task::DdlKind;

/// One registry entry.
#[derive(Clone, Copy, Debug)]
pub struct OpSpec {
    /// The DDL kind.
    pub kind: DdlKind,
    /// The server's history `JOB_TYPE` string for this kind.
    pub job_type: &'static str,
    /// Independent Bernoulli probability per generation pass, in `[0, 1]`.
    /// Not a normalized distribution.
    pub weight: f64,
}

/// Every supported operation, in generation order.
pub const OPS: [OpSpec; 18] = [
    OpSpec { kind: DdlKind::CreateTable, job_type: "create table", weight: 0.15 },
    OpSpec { kind: DdlKind::DropTable, job_type: "drop table", weight: 0.15 },
    OpSpec { kind: DdlKind::AddIndex, job_type: "add index", weight: 0.80 },
    OpSpec { kind: DdlKind::DropIndex, job_type: "drop index", weight: 0.50 },
    OpSpec { kind: DdlKind::AddColumn, job_type: "add column", weight: 0.80 },
    OpSpec { kind: DdlKind::ModifyColumn, job_type: "modify column", weight: 0.50 },
    OpSpec { kind: DdlKind::DropColumn, job_type: "drop column", weight: 0.50 },
    OpSpec { kind: DdlKind::CreateView, job_type: "create view", weight: 0.30 },
    OpSpec { kind: DdlKind::CreateSchema, job_type: "create schema", weight: 0.10 },
    OpSpec { kind: DdlKind::DropSchema, job_type: "drop schema", weight: 0.10 },
    OpSpec { kind: DdlKind::RenameTable, job_type: "rename table", weight: 0.50 },
    OpSpec { kind: DdlKind::RenameIndex, job_type: "rename index", weight: 0.50 },
    OpSpec { kind: DdlKind::TruncateTable, job_type: "truncate table", weight: 0.50 },
    OpSpec { kind: DdlKind::ShardRowBits, job_type: "shard row ID", weight: 0.30 },
    OpSpec { kind: DdlKind::RebaseAutoInc, job_type: "rebase auto_increment ID", weight: 0.15 },
    OpSpec { kind: DdlKind::SetDefaultValue, job_type: "set default value", weight: 0.30 },
    OpSpec { kind: DdlKind::ModifyTableComment, job_type: "modify table comment", weight: 0.30 },
    OpSpec {
        kind: DdlKind::ModifyTableCharset,
        job_type: "modify table charset and collate",
        weight: 0.30,
    },
];

impl DdlKind {
    /// The history `JOB_TYPE` string for this kind.
    pub fn job_type(self) -> &'static str {
        OPS.iter()
            .find(|op| op.kind == self)
            .map(|op| op.job_type)
            .unwrap_or("unknown")
    }
}

/// Decode a history `JOB_TYPE` string. Unknown types yield `None` and are
/// silently skipped by the oracle.
pub fn kind_for_job_type(job_type: &str) -> Option<DdlKind> {
    OPS.iter().find(|op| op.job_type == job_type).map(|op| op.kind)
}
