//! Console summary of finished tests

use colored::Colorize;
use stampede_runtime::metrics::{HTTP_REQS, HTTP_REQ_DURATION, HTTP_REQ_FAILED};
use stampede_runtime::{MetricSummary, RunReport};
use std::fmt::Write;
use std::path::Path;

fn mark(passed: bool) -> String {
    if passed {
        "✓".bright_green().to_string()
    } else {
        "✗".bright_red().to_string()
    }
}

fn status(passed: bool) -> String {
    if passed {
        "PASSED".green().bold().to_string()
    } else {
        "FAILED".red().bold().to_string()
    }
}

/// Multi-line summary of one test run
pub fn render_summary(report: &RunReport, result_file: &Path) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {} {} ({:.1}s, {} iterations)",
        mark(report.passed()),
        report.test.bold(),
        status(report.passed()),
        report.duration_secs,
        report.total_iterations()
    );

    if let Some(MetricSummary::Counter(requests)) = report.metrics.get(HTTP_REQS) {
        let _ = writeln!(out, "  {:<18} {}", "http_reqs", requests.count);
    }

    if let Some(duration) = report.trend(HTTP_REQ_DURATION) {
        let _ = writeln!(
            out,
            "  {:<18} avg={:.2}ms p95={:.2}ms p99={:.2}ms max={:.2}ms",
            "http_req_duration", duration.avg, duration.p95, duration.p99, duration.max
        );
    }

    if let Some(failed) = report.rate(HTTP_REQ_FAILED) {
        let _ = writeln!(
            out,
            "  {:<18} {:.2}% ({} of {})",
            "http_req_failed",
            failed.rate * 100.0,
            failed.passes,
            failed.passes + failed.fails
        );
    }

    let (passes, fails) = report.check_totals();
    let _ = writeln!(out, "  {:<18} {} passed, {} failed", "checks", passes, fails);
    for check in report.checks.iter().filter(|check| check.fails > 0) {
        let _ = writeln!(
            out,
            "    {} {}: {} of {} failed",
            mark(false),
            check.name,
            check.fails,
            check.total()
        );
    }

    let failed_thresholds = report.failed_thresholds().count();
    let _ = writeln!(
        out,
        "  {:<18} {} passed, {} failed",
        "thresholds",
        report.thresholds.len() - failed_thresholds,
        failed_thresholds
    );
    for threshold in &report.thresholds {
        let observed = match threshold.observed {
            Some(value) => format!("{:.4}", value),
            None => "no data".dimmed().to_string(),
        };
        let _ = writeln!(
            out,
            "    {} {}: {} (observed {})",
            mark(threshold.passed),
            threshold.key,
            threshold.expression,
            observed
        );
    }

    for scenario in &report.scenarios {
        let _ = writeln!(
            out,
            "  {:<18} {} VUs, {} iterations",
            format!("[{}]", scenario.name),
            scenario.virtual_users,
            scenario.iterations
        );
    }

    let _ = writeln!(out, "  {:<18} {}", "results", result_file.display());
    out
}

/// Closing line across all tests
pub fn render_overall(reports: &[&RunReport]) -> String {
    let failed: Vec<&str> = reports
        .iter()
        .filter(|report| !report.passed())
        .map(|report| report.test.as_str())
        .collect();

    if failed.is_empty() {
        format!("{} All {} test(s) passed", mark(true), reports.len())
    } else {
        format!(
            "{} {} of {} test(s) failed: {}",
            mark(false),
            failed.len(),
            reports.len(),
            failed.join(", ")
        )
    }
}
