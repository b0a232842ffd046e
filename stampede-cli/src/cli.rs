//! CLI argument parsing definitions

use clap::{ArgAction, Parser};
use stampede_config::{LogLevel, ProfileName};
use stampede_scenarios::TestName;
use std::path::PathBuf;

/// `-h` selects the target host, so help is only available as `--help`
#[derive(Parser, Debug)]
#[command(
    name = "stampede",
    author,
    version,
    about = "Load tests for the products REST API",
    disable_help_flag = true
)]
pub struct Cli {
    /// Load profile: SMOKE, LIGHT, MEDIUM or HEAVY [env: PROFILE]
    #[arg(short = 'p', long, value_name = "PROFILE", value_parser = parse_profile)]
    pub profile: Option<ProfileName>,

    /// Target environment (DEV, STAGING, PROD, LOCAL) or a base URL [env: HOST]
    #[arg(short = 'h', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Test to run: all, get-endpoint, post-endpoint, crud or mixed
    #[arg(short = 't', long, value_name = "TEST", default_value = "all", value_parser = parse_test)]
    pub test: TestName,

    /// Directory for JSON result files
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Run the tests selected by `all` concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

fn parse_profile(value: &str) -> Result<ProfileName, String> {
    value.parse::<ProfileName>().map_err(|e| e.to_string())
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    value.parse::<LogLevel>()
}

fn parse_test(value: &str) -> Result<TestName, String> {
    value.parse::<TestName>()
}
