//! One fuzzing case: seeded generation rounds feeding a dispatcher.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use ddlfuzz_core::Catalog;

use crate::config::{FuzzConfig, RunMode};
use crate::dispatch::Dispatcher;
use crate::error::{EngineError, Result};
use crate::executor::SqlExecutor;
use crate::prepare;
use crate::registry::OPS;
use crate::task::DdlKind;

/// A self-contained fuzzing case against one working database.
///
/// Each round visits the registry in its fixed order, flips every kind's
/// weighted coin, pushes each prepared task onto the channel and hands the
/// batch to the dispatcher. All randomness flows from one seeded rng, so the
/// logged seed replays the identical operation stream.
pub struct Runner {
    config: FuzzConfig,
    catalog: Arc<Catalog>,
    rng: StdRng,
    tx: mpsc::Sender<crate::task::Task>,
    dispatcher: Dispatcher,
    instance: usize,
}

impl Runner {
    /// A new case over the given execution handle.
    pub fn new(config: FuzzConfig, executor: Arc<dyn SqlExecutor>, instance: usize) -> Runner {
        let base_seed = config.seed.unwrap_or_else(rand::random);
        let seed = base_seed.wrapping_add(instance as u64);
        tracing::info!(instance, seed, "fuzz case seeded");

        // A generation pass can queue at most one task per registry entry,
        // plus the bootstrap burst; the channel must hold a full pass so the
        // generator never blocks on its own dispatcher.
        let capacity = OPS.len().max(config.initial_tables) * 2;
        let (tx, rx) = mpsc::channel(capacity);
        let catalog = Arc::new(Catalog::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&executor),
            Arc::clone(&catalog),
            rx,
            config.case_database(instance),
            instance,
        );
        Runner {
            config,
            catalog,
            rng: StdRng::seed_from_u64(seed),
            tx,
            dispatcher,
            instance,
        }
    }

    /// The shadow catalog of this case.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Populate the working database with the initial tables, routed through
    /// the regular dispatcher so the order oracle stamps their server ids.
    async fn bootstrap(&mut self) -> Result<()> {
        let mut queued = 0usize;
        for _ in 0..self.config.initial_tables {
            if let Some(task) = prepare::prepare(DdlKind::CreateTable, &self.catalog, &mut self.rng)
            {
                self.tx.send(task).await.map_err(|_| EngineError::ChannelClosed)?;
                queued += 1;
            }
        }
        self.dispatch(queued).await
    }

    /// Run the whole case: bootstrap, then the configured number of rounds.
    pub async fn run(mut self) -> Result<()> {
        self.bootstrap().await?;
        for round in 0..self.config.rounds {
            tracing::debug!(instance = self.instance, round, "generation round");
            let queued = self.generation_pass().await?;
            self.dispatch(queued).await?;
        }
        Ok(())
    }

    /// One weighted pass over the registry. Returns the number of tasks
    /// queued.
    async fn generation_pass(&mut self) -> Result<usize> {
        let mut queued = 0usize;
        for op in &OPS {
            if !self.rng.gen_bool(op.weight) {
                continue;
            }
            if let Some(task) = prepare::prepare(op.kind, &self.catalog, &mut self.rng) {
                self.tx.send(task).await.map_err(|_| EngineError::ChannelClosed)?;
                queued += 1;
            }
        }
        Ok(queued)
    }

    async fn dispatch(&mut self, queued: usize) -> Result<()> {
        match self.config.mode {
            RunMode::Parallel => self.dispatcher.run_parallel(queued).await,
            RunMode::Serial => {
                for _ in 0..queued {
                    self.dispatcher.run_serial().await?;
                }
                Ok(())
            }
        }
    }
}
