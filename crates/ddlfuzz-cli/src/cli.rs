//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::Parser;

use ddlfuzz::{FuzzConfig, RunMode};

/// Concurrent schema-change fuzzer for MySQL-dialect servers with online DDL.
#[derive(Parser, Debug)]
#[command(name = "ddlfuzz")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Server host
    #[arg(long)]
    pub host: Option<String>,

    /// Server port
    #[arg(long)]
    pub port: Option<u16>,

    /// User name
    #[arg(long)]
    pub user: Option<String>,

    /// Password
    #[arg(long)]
    pub password: Option<String>,

    /// Base working database name
    #[arg(long)]
    pub database: Option<String>,

    /// Execute one statement at a time instead of parallel batches
    #[arg(long)]
    pub serial: bool,

    /// Number of generation rounds per case
    #[arg(long)]
    pub rounds: Option<usize>,

    /// Number of tables created before the first round
    #[arg(long)]
    pub initial_tables: Option<usize>,

    /// Number of concurrent fuzzing cases
    #[arg(long)]
    pub cases: Option<usize>,

    /// Seed for the operation stream (logged when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Suppress informational logging
    #[arg(long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Fold the flag overrides into a config.
    pub fn apply_to(&self, config: &mut FuzzConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if self.serial {
            config.mode = RunMode::Serial;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(initial_tables) = self.initial_tables {
            config.initial_tables = initial_tables;
        }
        if let Some(cases) = self.cases {
            config.cases = cases;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}
