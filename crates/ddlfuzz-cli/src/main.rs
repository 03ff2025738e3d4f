//! ddlfuzz CLI - drives one or more fuzzing cases against a live server.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use ddlfuzz::{EngineError, FuzzConfig, MysqlExecutor, Runner, SqlError, SqlExecutor};

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("sql error: {0}")]
    Sql(#[from] SqlError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ddlfuzz: {err}");
            ExitCode::from(1)
        }
    }
}

/// Initialize logging; RUST_LOG overrides the flag-derived default.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ddlfuzz={default_level}")));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => FuzzConfig::from_toml_path(path)?,
        None => FuzzConfig::default(),
    };
    cli.apply_to(&mut config);
    config.validate()?;

    // Working databases are created through a connection with no default
    // database, then each case gets its own bound pool.
    let admin = MysqlExecutor::from_url(&config.mysql_url(None))?;
    for instance in 0..config.cases {
        let database = config.case_database(instance);
        admin.exec(&format!("CREATE DATABASE IF NOT EXISTS `{database}`")).await?;
    }
    admin.disconnect().await?;

    let mut cases = Vec::with_capacity(config.cases);
    for instance in 0..config.cases {
        let database = config.case_database(instance);
        let url = config.mysql_url(Some(&database));
        let executor: Arc<dyn SqlExecutor> = Arc::new(MysqlExecutor::from_url(&url)?);
        let runner = Runner::new(config.clone(), executor, instance);
        cases.push(tokio::spawn(runner.run()));
    }

    let mut first_failure: Option<CliError> = None;
    for (instance, case) in cases.into_iter().enumerate() {
        match case.await {
            Ok(Ok(())) => tracing::info!(instance, "case finished"),
            Ok(Err(err)) => {
                tracing::error!(instance, "case failed: {err}");
                first_failure.get_or_insert(err.into());
            }
            Err(err) => {
                tracing::error!(instance, "case panicked: {err}");
                first_failure
                    .get_or_insert(EngineError::Worker(err.to_string()).into());
            }
        }
    }
    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
