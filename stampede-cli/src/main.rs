use anyhow::{Context, Result};
use clap::Parser;
use stampede_config::{ConfigLoader, StampedeConfig};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};

mod cli;
mod logging;
mod runner;
mod summary;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    logging::init_tracing(&config.logging, cli.log_level, cli.verbose);
    runner::apply_overrides(&mut config, &cli)?;

    debug!("Effective configuration: {:?}", config);

    let completed = runner::run(&config, cli.test, cli.parallel).await?;

    for test in &completed {
        println!("{}", summary::render_summary(&test.report, &test.result_file));
    }
    let reports: Vec<_> = completed.iter().map(|test| &test.report).collect();
    println!("{}", summary::render_overall(&reports));

    if reports.iter().all(|report| report.passed()) {
        info!("All tests passed");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Load configuration from file or environment
fn load_config(config_path: Option<&Path>) -> Result<StampedeConfig> {
    let loader = ConfigLoader::new();
    match config_path {
        Some(path) => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}
