//! Output formatters for run results
//!
//! Provides table, JSON and summary output formats.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::models::{CollectionResult, RunResults, Status, TestResult};

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    JsonPretty,
    Summary,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn from_config(config: &crate::config::RunnerConfig) -> Self {
        Self {
            format: config.output_format,
            colorize: config.colorize,
        }
    }

    /// Format a full run snapshot
    pub fn format_results(&self, results: &RunResults) -> String {
        match self.format {
            OutputFormat::Table => self.format_results_table(results),
            OutputFormat::Json => serde_json::to_string(results).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(results).unwrap_or_default(),
            OutputFormat::Summary => self.format_results_summary(results),
        }
    }

    /// Format a single test result
    pub fn format_test_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_test_row(result),
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Summary => format!(
                "{} {} ({}ms)",
                result.status.symbol(),
                result.name,
                result.duration_ms()
            ),
        }
    }

    fn status_label(&self, status: Status) -> String {
        if !self.colorize {
            return format!("{} {}", status.symbol(), status);
        }

        let color = match status {
            Status::Passed => "32",
            Status::Failed => "31",
            Status::Cancelled => "33",
            Status::Pending | Status::Unsubmitted => "90",
        };
        format!("\x1b[{}m{} {}\x1b[0m", color, status.symbol(), status)
    }

    fn format_test_row(&self, result: &TestResult) -> String {
        let mut row = format!(
            "  {:3}. {:30} {} [{:>6}ms]",
            result.test_result_id,
            result.name,
            self.status_label(result.status),
            result.duration_ms()
        );
        for assertion in &result.assertions {
            let _ = write!(row, "\n         - {assertion}");
        }
        row
    }

    fn format_collection_header(&self, collection: &CollectionResult) -> String {
        format!(
            "{} {} [{}ms]{}",
            self.status_label(collection.status),
            collection.title,
            collection.test_time,
            if collection.concurrent_execution {
                " (concurrent)"
            } else {
                ""
            }
        )
    }

    fn format_results_table(&self, results: &RunResults) -> String {
        let mut output = String::new();

        for collection in &results.collection_results {
            output.push_str(&self.format_collection_header(collection));
            output.push('\n');
            for result in results.tests_in(collection) {
                output.push_str(&self.format_test_row(result));
                output.push('\n');
            }
        }

        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "Run {} - {} passed, {} failed, {} pending of {} [{}ms]",
            self.status_label(results.result.status),
            results.count(Status::Passed),
            results.count(Status::Failed),
            results.count(Status::Pending) + results.count(Status::Unsubmitted),
            results.total(),
            results.result.test_time
        ));

        output
    }

    fn format_results_summary(&self, results: &RunResults) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%) in {}ms",
            results.result.status,
            results.count(Status::Passed),
            results.total(),
            results.pass_rate(),
            results.result.test_time
        )
    }
}
