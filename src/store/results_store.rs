//! Results store
//!
//! Owns all run, collection and test state for the current run. State only
//! changes through [`ResultsStore::apply`], which is synchronous and never
//! fails: events naming an unknown id are dropped.

use tracing::trace;

use super::StoreEvent;
use crate::models::{
    Assertions, Collection, CollectionResult, RunResult, RunResults, Status, Test, TestResult,
};

#[derive(Debug, Default)]
pub struct ResultsStore {
    tests: Vec<Test>,
    test_results: Vec<TestResult>,
    collection_results: Vec<CollectionResult>,
    result: RunResult,
}

impl ResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one lifecycle event
    pub fn apply(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Initialize { suite } => self.build_run(&suite),
            StoreEvent::StartRun { start_time } => self.start_run(start_time),
            StoreEvent::EndRun { end_time } => self.end_run(end_time),
            StoreEvent::CancelRun { end_time } => self.cancel_run(end_time),
            StoreEvent::StartCollection {
                collection_result_id,
                start_time,
            } => self.start_collection(collection_result_id, start_time),
            StoreEvent::EndCollection {
                collection_result_id,
                end_time,
            } => self.end_collection(collection_result_id, end_time),
            StoreEvent::StartTest {
                test_result_id,
                start_time,
            } => self.start_test(test_result_id, start_time),
            StoreEvent::EndTest {
                test_result_id,
                end_time,
                assertions,
            } => self.end_test(test_result_id, end_time, assertions),
        }
    }

    /// Apply a recorded sequence of events in order
    pub fn replay(&mut self, events: impl IntoIterator<Item = StoreEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Discard every entity, returning the store to its pre-run state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> RunResults {
        RunResults {
            result: self.result.clone(),
            collection_results: self.collection_results.clone(),
            test_results: self.test_results.clone(),
        }
    }

    pub fn run_result(&self) -> &RunResult {
        &self.result
    }

    pub fn collection_result(&self, collection_result_id: usize) -> Option<&CollectionResult> {
        self.collection_results.get(collection_result_id)
    }

    pub fn test_result(&self, test_result_id: usize) -> Option<&TestResult> {
        self.test_results.get(test_result_id)
    }

    pub fn test(&self, test_id: usize) -> Option<&Test> {
        self.tests.get(test_id)
    }

    fn build_run(&mut self, suite: &[Collection]) {
        for collection in suite {
            let collection_result_id = self.collection_results.len();
            let indices = self.build_test_results(&collection.tests);

            self.collection_results.push(CollectionResult {
                collection_result_id,
                title: collection.title.clone(),
                indices,
                concurrent_execution: collection.concurrent_execution,
                timeout_interval: collection.timeout_interval,
                status: Status::Pending,
                start_time: 0,
                end_time: 0,
                test_time: 0,
            });
        }
    }

    fn build_test_results(&mut self, tests: &[Test]) -> std::ops::Range<usize> {
        let start = self.test_results.len();
        for test in tests {
            let test_id = self.tests.len();
            self.tests.push(test.clone());

            let test_result_id = self.test_results.len();
            self.test_results
                .push(TestResult::pending(test_result_id, test_id, &test.name));
        }

        start..self.test_results.len()
    }

    fn start_run(&mut self, start_time: u64) {
        self.result.status = Status::Unsubmitted;
        self.result.start_time = start_time;
    }

    fn end_run(&mut self, end_time: u64) {
        if self.result.status == Status::Cancelled {
            trace!("end_run ignored, run already cancelled");
            return;
        }

        self.result.end_time = end_time;

        let failed = self
            .collection_results
            .iter()
            .any(|c| c.status == Status::Failed);
        self.result.status = if failed { Status::Failed } else { Status::Passed };
        self.result.test_time = self.collection_results.iter().map(|c| c.test_time).sum();
    }

    fn cancel_run(&mut self, end_time: u64) {
        self.result.status = Status::Cancelled;
        self.result.end_time = end_time;
    }

    fn start_collection(&mut self, collection_result_id: usize, start_time: u64) {
        let Some(collection_result) = self.collection_results.get_mut(collection_result_id) else {
            trace!(collection_result_id, "start_collection dropped, unknown id");
            return;
        };

        collection_result.status = Status::Unsubmitted;
        collection_result.start_time = start_time;
    }

    fn end_collection(&mut self, collection_result_id: usize, end_time: u64) {
        let Some(collection_result) = self.collection_results.get_mut(collection_result_id) else {
            trace!(collection_result_id, "end_collection dropped, unknown id");
            return;
        };

        collection_result.end_time = end_time;
        if collection_result.status == Status::Cancelled {
            return;
        }

        // Aggregate over this collection's own slice of test results.
        let test_results = self
            .test_results
            .get(collection_result.indices.clone())
            .unwrap_or(&[]);

        let failed = test_results.iter().any(|r| r.status == Status::Failed);
        collection_result.status = if failed { Status::Failed } else { Status::Passed };
        collection_result.test_time = test_results.iter().map(TestResult::duration_ms).sum();
    }

    fn start_test(&mut self, test_result_id: usize, start_time: u64) {
        let Some(test_result) = self.test_results.get_mut(test_result_id) else {
            trace!(test_result_id, "start_test dropped, unknown id");
            return;
        };

        test_result.status = Status::Unsubmitted;
        test_result.start_time = start_time;
    }

    fn end_test(&mut self, test_result_id: usize, end_time: u64, assertions: Assertions) {
        let Some(test_result) = self.test_results.get_mut(test_result_id) else {
            trace!(test_result_id, "end_test dropped, unknown id");
            return;
        };

        test_result.status = if assertions.is_empty() {
            Status::Passed
        } else {
            Status::Failed
        };
        test_result.assertions = assertions;
        test_result.end_time = end_time;
    }
}
