//! Tracing subscriber setup for the binary

use stampede_config::{LogFormat, LogLevel, LoggingConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Pick the filter directive: `--log-level`, then `-v`, then `RUST_LOG`,
/// then the configured level
pub fn filter_directive(
    config: &LoggingConfig,
    cli_level: Option<LogLevel>,
    verbose: bool,
    rust_log: Option<&str>,
) -> String {
    if let Some(level) = cli_level {
        return level.to_string();
    }
    if verbose {
        return "debug".to_string();
    }
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ => config.filter_directive(),
    }
}

/// Install the global subscriber; logs go to stderr so the summary owns stdout
pub fn init_tracing(config: &LoggingConfig, cli_level: Option<LogLevel>, verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(config, cli_level, verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if result.is_err() {
        debug!("Tracing subscriber already initialized");
    }
}
