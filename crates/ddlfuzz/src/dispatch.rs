//! Batch dispatchers: fan a batch out to the server, then replay it locally
//! in the server's committed order.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::mpsc;

use ddlfuzz_core::Catalog;

use crate::apply::{self, ApplyCtx};
use crate::error::{EngineError, Result};
use crate::executor::SqlExecutor;
use crate::history;
use crate::ignore::ddl_ignorable;
use crate::task::Task;

/// Consumes prepared tasks and drives them to an agreed outcome.
///
/// The dispatcher itself is single-threaded; in parallel mode it spawns one
/// worker per task for the SQL round-trip and joins them all before touching
/// the order oracle. `last_seen_job_id` is dispatcher-local and only moves
/// forward.
pub struct Dispatcher {
    executor: Arc<dyn SqlExecutor>,
    catalog: Arc<Catalog>,
    rx: mpsc::Receiver<Task>,
    last_seen_job_id: i64,
    db: String,
    instance: usize,
}

impl Dispatcher {
    /// A dispatcher over one task channel.
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        catalog: Arc<Catalog>,
        rx: mpsc::Receiver<Task>,
        db: String,
        instance: usize,
    ) -> Dispatcher {
        Dispatcher {
            executor,
            catalog,
            rx,
            last_seen_job_id: 0,
            db,
            instance,
        }
    }

    /// The high-water mark of consumed history job ids.
    pub fn last_seen_job_id(&self) -> i64 {
        self.last_seen_job_id
    }

    /// Parallel protocol: drain `batch` tasks, fan out, recover the committed
    /// order from the history, replay appliers in that order and compare
    /// outcomes per task.
    pub async fn run_parallel(&mut self, batch: usize) -> Result<()> {
        if batch == 0 {
            return Ok(());
        }
        let mut tasks = Vec::with_capacity(batch);
        for _ in 0..batch {
            tasks.push(self.rx.recv().await.ok_or(EngineError::ChannelClosed)?);
        }

        let mut workers = Vec::with_capacity(tasks.len());
        for (at, task) in tasks.iter().enumerate() {
            let executor = Arc::clone(&self.executor);
            let sql = task.sql.clone();
            workers.push(tokio::spawn(async move {
                let started = Instant::now();
                let outcome = executor.exec(&sql).await;
                (at, outcome, started.elapsed())
            }));
        }
        for joined in join_all(workers).await {
            let (at, outcome, elapsed) = joined.map_err(|err| EngineError::Worker(err.to_string()))?;
            if let Err(err) = outcome {
                if ddl_ignorable(&err) {
                    continue;
                }
                tracing::info!(
                    instance = self.instance,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "server rejected {}: {err}",
                    tasks[at].sql,
                );
                tasks[at].server_err = Some(err);
            } else {
                tracing::info!(
                    instance = self.instance,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "server executed {}",
                    tasks[at].sql,
                );
            }
        }

        let started = Instant::now();
        let rows = match self.executor.query("admin show ddl jobs").await {
            Ok(rows) => rows,
            Err(err) if ddl_ignorable(&err) => {
                // The history read failed benignly; drop the batch's oracle
                // check rather than the run.
                tracing::warn!(instance = self.instance, "history query dropped: {err}");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(
            instance = self.instance,
            elapsed_ms = started.elapsed().as_millis() as u64,
            rows = rows.len(),
            "admin show ddl jobs",
        );
        let jobs = history::parse_jobs(&rows, self.last_seen_job_id)?;
        let order = history::reconcile(&jobs, &mut tasks)?;
        if let Some(&last) = order.last() {
            self.last_seen_job_id = tasks[last].job_id;
        }

        let ctx = ApplyCtx {
            catalog: &self.catalog,
            executor: &self.executor,
            db: &self.db,
        };
        for &at in &order {
            let task = &tasks[at];
            let local = apply::apply(&ctx, task).await;
            tracing::info!(
                instance = self.instance,
                job_id = task.job_id,
                "local applied {}: {:?}",
                task.sql,
                local.as_ref().err(),
            );
            if let Err(err) = &local {
                if err.is_invariant() {
                    return Err(EngineError::Invariant(err.to_string()));
                }
            }
            match (&local, &task.server_err) {
                (Ok(()), None) => {}
                (Err(_), Some(_)) => {}
                (local, server) => {
                    return Err(EngineError::Divergence {
                        sql: task.sql.clone(),
                        local: local.as_ref().err().map(|err| err.to_string()),
                        server: server.as_ref().map(|err| err.to_string()),
                        dump: table_dump(task),
                    });
                }
            }
        }
        Ok(())
    }

    /// Serial protocol: take one task if available, execute, then apply. Any
    /// one-sided failure is fatal.
    pub async fn run_serial(&mut self) -> Result<()> {
        let task = match self.rx.try_recv() {
            Ok(task) => task,
            Err(mpsc::error::TryRecvError::Empty) => return Ok(()),
            Err(mpsc::error::TryRecvError::Disconnected) => return Err(EngineError::ChannelClosed),
        };

        let started = Instant::now();
        let outcome = self.executor.exec(&task.sql).await;
        tracing::info!(
            instance = self.instance,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "server executed {}: {:?}",
            task.sql,
            outcome.as_ref().err(),
        );
        if let Err(err) = outcome {
            if ddl_ignorable(&err) {
                return Ok(());
            }
            return Err(EngineError::Divergence {
                sql: task.sql.clone(),
                local: None,
                server: Some(err.to_string()),
                dump: table_dump(&task),
            });
        }

        let ctx = ApplyCtx {
            catalog: &self.catalog,
            executor: &self.executor,
            db: &self.db,
        };
        if let Err(err) = apply::apply(&ctx, &task).await {
            if err.is_invariant() {
                return Err(EngineError::Invariant(err.to_string()));
            }
            return Err(EngineError::Divergence {
                sql: task.sql.clone(),
                local: Some(err.to_string()),
                server: None,
                dump: table_dump(&task),
            });
        }
        Ok(())
    }
}

/// Debug dump of the task's table, when it has one.
fn table_dump(task: &Task) -> String {
    match task.target.table() {
        Some(table) => table.read().debug_dump(table.name()),
        None => String::new(),
    }
}
