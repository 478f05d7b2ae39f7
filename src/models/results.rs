//! Result models for test runs
//!
//! Defines lifecycle status and the run / collection / test result records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use super::Assertions;

/// Lifecycle status shared by runs, collections and tests
///
/// `Pending` is the only initial value. `Cancelled` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Pending,
    Unsubmitted,
    Passed,
    Failed,
    Cancelled,
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Pending => "·",
            Status::Unsubmitted => "…",
            Status::Passed => "✓",
            Status::Failed => "✗",
            Status::Cancelled => "○",
        }
    }

    /// Whether the entity has been finalized
    pub fn is_settled(&self) -> bool {
        matches!(self, Status::Passed | Status::Failed | Status::Cancelled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "PENDING"),
            Status::Unsubmitted => write!(f, "UNSUBMITTED"),
            Status::Passed => write!(f, "PASSED"),
            Status::Failed => write!(f, "FAILED"),
            Status::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Outcome of a single test
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_result_id: usize,
    pub test_id: usize,
    pub name: String,
    pub status: Status,
    pub start_time: u64,
    pub end_time: u64,
    pub assertions: Assertions,
}

impl TestResult {
    pub fn pending(test_result_id: usize, test_id: usize, name: impl Into<String>) -> Self {
        Self {
            test_result_id,
            test_id,
            name: name.into(),
            status: Status::Pending,
            start_time: 0,
            end_time: 0,
            assertions: Vec::new(),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.name,
            self.duration_ms()
        )?;
        for assertion in &self.assertions {
            write!(f, "\n    - {assertion}")?;
        }
        Ok(())
    }
}

/// Outcome of one collection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionResult {
    pub collection_result_id: usize,
    pub title: String,
    /// Half-open range into the run's test results, fixed at build time
    pub indices: Range<usize>,
    pub concurrent_execution: bool,
    pub timeout_interval: Option<u64>,
    pub status: Status,
    pub start_time: u64,
    pub end_time: u64,
    pub test_time: u64,
}

/// Outcome of the whole run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: Status,
    pub start_time: u64,
    pub end_time: u64,
    pub test_time: u64,
}

/// Point-in-time snapshot of a run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    pub result: RunResult,
    pub collection_results: Vec<CollectionResult>,
    pub test_results: Vec<TestResult>,
}

impl RunResults {
    /// Test results belonging to a collection
    pub fn tests_in(&self, collection: &CollectionResult) -> &[TestResult] {
        self.test_results
            .get(collection.indices.clone())
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.test_results.len()
    }

    pub fn count(&self, status: Status) -> usize {
        self.test_results
            .iter()
            .filter(|r| r.status == status)
            .count()
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.count(Status::Passed) as f64 / self.total() as f64) * 100.0
        }
    }
}
