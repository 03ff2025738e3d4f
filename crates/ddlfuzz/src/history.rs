//! The order oracle: recovering the server's DDL commit order.
//!
//! The server linearizes concurrent DDL internally; the only observable trace
//! of that order is its job history. After a batch is joined, the dispatcher
//! queries `admin show ddl jobs`, pairs each new history row with exactly one
//! task of the batch, and replays the appliers sorted by job id.
//!
//! A batch must never contain two tasks the history cannot tell apart (same
//! kind against the same object). The generator makes that statistically rare
//! rather than impossible; when it does happen and the history comes back
//! short, reconciliation fails loudly with the full listings.

use std::fmt::Write as _;

use crate::error::{EngineError, Result};
use crate::registry::kind_for_job_type;
use crate::task::{DdlKind, Target, Task};

/// One decoded row of `admin show ddl jobs`.
///
/// `schema_id` and `table_id` are opaque strings: they are only ever compared
/// for lexical equality against ids stamped from earlier rows.
#[derive(Clone, Debug)]
pub struct DdlJob {
    /// Monotonically increasing job id.
    pub id: i64,
    /// `DB_NAME` column; for create-schema jobs, the created schema's name.
    pub db_name: String,
    /// `TABLE_NAME` column; for create-table/view jobs, the created name.
    pub table_name: String,
    /// Decoded `JOB_TYPE`.
    pub kind: DdlKind,
    /// `SCHEMA_ID` column, opaque.
    pub schema_id: String,
    /// `TABLE_ID` column, opaque.
    pub table_id: String,
    /// `STATE` column, carried for diagnostics only.
    pub state: String,
}

/// Columns of the history result, by position.
const COL_JOB_ID: usize = 0;
const COL_DB_NAME: usize = 1;
const COL_TABLE_NAME: usize = 2;
const COL_JOB_TYPE: usize = 3;
const COL_SCHEMA_ID: usize = 5;
const COL_TABLE_ID: usize = 6;
const COL_STATE: usize = 9;
const MIN_COLUMNS: usize = 10;

/// Decode raw history rows, dropping rows at or below `last_seen` and rows
/// whose job type the registry does not know.
pub fn parse_jobs(rows: &[Vec<String>], last_seen: i64) -> Result<Vec<DdlJob>> {
    let mut jobs = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() < MIN_COLUMNS {
            return Err(EngineError::MalformedHistory(format!(
                "expected at least {MIN_COLUMNS} columns, got {}: {row:?}",
                row.len(),
            )));
        }
        let id: i64 = row[COL_JOB_ID]
            .parse()
            .map_err(|_| EngineError::MalformedHistory(format!("bad JOB_ID in {row:?}")))?;
        if id <= last_seen {
            continue;
        }
        let Some(kind) = kind_for_job_type(&row[COL_JOB_TYPE]) else {
            continue;
        };
        jobs.push(DdlJob {
            id,
            db_name: row[COL_DB_NAME].clone(),
            table_name: row[COL_TABLE_NAME].clone(),
            kind,
            schema_id: row[COL_SCHEMA_ID].clone(),
            table_id: row[COL_TABLE_ID].clone(),
            state: row[COL_STATE].clone(),
        });
    }
    Ok(jobs)
}

/// Pair every task with exactly one history row, stamp server ids and job
/// ids, and return task indices in committed (job id ascending) order.
///
/// Rows are visited in history order and claim the first still-unclaimed
/// matching task; surplus rows (other sessions' jobs) are ignored. Any task
/// left unclaimed means the batch was not reconcilable and the run must stop.
pub fn reconcile(jobs: &[DdlJob], tasks: &mut [Task]) -> Result<Vec<usize>> {
    let mut claimed: Vec<bool> = vec![false; tasks.len()];
    let mut matched = 0usize;
    for job in jobs {
        if matched == tasks.len() {
            break;
        }
        let hit = (0..tasks.len()).find(|&at| !claimed[at] && task_matches(&tasks[at], job));
        if let Some(at) = hit {
            stamp(&mut tasks[at], job);
            claimed[at] = true;
            matched += 1;
        }
    }
    if matched != tasks.len() {
        return Err(EngineError::Linearization {
            detail: render_failure(jobs, tasks, &claimed),
        });
    }
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by_key(|&at| tasks[at].job_id);
    Ok(order)
}

fn task_matches(task: &Task, job: &DdlJob) -> bool {
    if task.kind != job.kind {
        return false;
    }
    match task.kind {
        // Creations existed nowhere before the batch, so they match by the
        // name the server echoes back.
        DdlKind::CreateTable => match &task.target {
            Target::Table(table) => table.name() == job.table_name,
            _ => false,
        },
        DdlKind::CreateSchema => match &task.target {
            Target::Schema(schema) => schema.name() == job.db_name,
            _ => false,
        },
        DdlKind::CreateView => match &task.target {
            Target::View(view) => view.name() == job.table_name,
            _ => false,
        },
        // Everything else matches on the server id stamped when its target
        // was created.
        _ => match &task.target {
            Target::Table(table) => {
                let id = table.server_id();
                !id.is_empty() && id == job.table_id
            }
            Target::View(view) => {
                let id = view.server_id();
                !id.is_empty() && id == job.table_id
            }
            Target::Schema(schema) => {
                let id = schema.server_id();
                !id.is_empty() && id == job.schema_id
            }
        },
    }
}

fn stamp(task: &mut Task, job: &DdlJob) {
    task.job_id = job.id;
    match (&task.kind, &task.target) {
        (DdlKind::CreateTable, Target::Table(table)) => table.set_server_id(&job.table_id),
        (DdlKind::CreateSchema, Target::Schema(schema)) => schema.set_server_id(&job.schema_id),
        (DdlKind::CreateView, Target::View(view)) => view.set_server_id(&job.table_id),
        _ => {}
    }
}

fn render_failure(jobs: &[DdlJob], tasks: &[Task], claimed: &[bool]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "history rows and batch tasks do not reconcile one-to-one");
    let _ = writeln!(out, "history jobs:");
    let _ = writeln!(out, "  JOB_ID\tDB_NAME\tTABLE_NAME\tJOB_TYPE\tSCHEMA_ID\tTABLE_ID\tSTATE");
    for job in jobs {
        let _ = writeln!(
            out,
            "  {}\t{}\t{}\t{}\t{}\t{}\t{}",
            job.id,
            job.db_name,
            job.table_name,
            job.kind.job_type(),
            job.schema_id,
            job.table_id,
            job.state,
        );
    }
    let _ = writeln!(out, "batch tasks:");
    for (at, task) in tasks.iter().enumerate() {
        let _ = writeln!(
            out,
            "  [{}] job_id={} kind={} {} sql={}",
            if claimed[at] { "matched" } else { "UNMATCHED" },
            task.job_id,
            task.kind.job_type(),
            task.target.describe(),
            task.sql,
        );
    }
    out
}
