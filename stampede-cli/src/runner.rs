//! Test execution and result file output

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use futures::future::join_all;
use stampede_config::{OutputConfig, StampedeConfig};
use stampede_http::{ApiClient, Credentials};
use stampede_runtime::{LoadTest, RunReport};
use stampede_scenarios::{ProductApi, TestName, TestPlanner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::Cli;

/// A finished test and where its results were written
#[derive(Debug)]
pub struct CompletedTest {
    pub report: RunReport,
    pub result_file: PathBuf,
}

/// Apply command-line selections on top of the loaded configuration
pub fn apply_overrides(config: &mut StampedeConfig, cli: &Cli) -> Result<()> {
    if let Some(profile) = cli.profile {
        config.profiles.selected = profile;
    }
    if let Some(host) = &cli.host {
        config.target.host = host.clone();
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }

    config
        .validate_all()
        .context("Invalid configuration after applying command-line options")
}

/// Build the planner for the configured target and profile
pub fn planner(config: &StampedeConfig) -> Result<TestPlanner> {
    let base_url = config.target.base_url();
    let client = ApiClient::new(
        base_url.clone(),
        Credentials::from(&config.target),
        &config.http,
    )
    .with_context(|| format!("Failed to create HTTP client for {}", base_url))?;

    let api = ProductApi::new(Arc::new(client), config.scenarios.clone());
    Ok(TestPlanner::new(api, config.profiles.selected_profile()))
}

/// Run the selected tests and write one result file per test
pub async fn run(
    config: &StampedeConfig,
    test: TestName,
    parallel: bool,
) -> Result<Vec<CompletedTest>> {
    let planner = planner(config)?;
    let profile = planner.profile();
    info!(
        "Running '{}' against {} with profile {} ({} VUs for {:?})",
        test,
        config.target.base_url(),
        config.profiles.selected,
        profile.virtual_users,
        profile.duration
    );

    let tests = planner
        .plan(test)
        .with_context(|| format!("Failed to plan test '{}'", test))?;

    run_tests(&tests, &config.output, parallel).await
}

/// Run tests one after another, or concurrently when `parallel` is set.
///
/// Each report is written as soon as its test finishes, so a later failure
/// does not lose the results of tests that already completed.
pub async fn run_tests(
    tests: &[LoadTest],
    output: &OutputConfig,
    parallel: bool,
) -> Result<Vec<CompletedTest>> {
    if parallel && tests.len() > 1 {
        info!("Running {} tests in parallel", tests.len());
        return join_all(tests.iter().map(|test| run_one(test, output)))
            .await
            .into_iter()
            .collect();
    }

    if parallel {
        warn!("--parallel has no effect with a single test");
    }
    let mut completed = Vec::with_capacity(tests.len());
    for test in tests {
        completed.push(run_one(test, output).await?);
    }
    Ok(completed)
}

async fn run_one(test: &LoadTest, output: &OutputConfig) -> Result<CompletedTest> {
    info!("Starting test '{}'", test.name());
    let report = test
        .run()
        .await
        .with_context(|| format!("Test '{}' could not be executed", test.name()))?;
    info!(
        "Test '{}' finished in {:.1}s: {}",
        report.test,
        report.duration_secs,
        if report.passed() { "passed" } else { "failed" }
    );

    let result_file = write_report(&report, output).await?;
    Ok(CompletedTest { report, result_file })
}

/// `<test>_<timestamp>.json`
pub fn result_file_name(test: &str, started_at: NaiveDateTime, timestamp_format: &str) -> String {
    format!("{}_{}.json", test, started_at.format(timestamp_format))
}

/// Serialize a report into the output directory
pub async fn write_report(report: &RunReport, output: &OutputConfig) -> Result<PathBuf> {
    create_output_dir(&output.directory).await?;

    let started_at = report.started_at.with_timezone(&Local).naive_local();
    let path = output
        .directory
        .join(result_file_name(&report.test, started_at, &output.timestamp_format));

    let json = report
        .to_json(output.pretty)
        .with_context(|| format!("Failed to serialize results of '{}'", report.test))?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write results to {}", path.display()))?;

    info!("Results written to {}", path.display());
    Ok(path)
}

async fn create_output_dir(directory: &Path) -> Result<()> {
    tokio::fs::create_dir_all(directory)
        .await
        .with_context(|| format!("Failed to create output directory {}", directory.display()))
}
