//! Execution strategies
//!
//! Runs the tests of one collection either strictly in order or all at once.
//! Every test body races a timer; a lost race or a panic becomes an assertion
//! so the outcome is always plain data.

use futures::future::{join_all, FutureExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{Assertions, Collection, Test};
use crate::relay::Relay;
use crate::utils::now_ms;

/// How the tests of a collection are scheduled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// One test at a time, in array order
    Sequential,
    /// Every test started before any is awaited
    Concurrent,
}

impl ExecutionStrategy {
    pub fn for_collection(collection: &Collection) -> Self {
        if collection.concurrent_execution {
            ExecutionStrategy::Concurrent
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Run `tests`, whose results start at `first_test_result_id`
    pub async fn execute(
        self,
        relay: &dyn Relay,
        tests: &[Test],
        first_test_result_id: usize,
        timeout_interval: u64,
    ) {
        match self {
            ExecutionStrategy::Sequential => {
                run_tests_in_order(relay, tests, first_test_result_id, timeout_interval).await
            }
            ExecutionStrategy::Concurrent => {
                run_tests_all_at_once(relay, tests, first_test_result_id, timeout_interval).await
            }
        }
    }
}

/// Run each test to completion before starting the next
pub async fn run_tests_in_order(
    relay: &dyn Relay,
    tests: &[Test],
    first_test_result_id: usize,
    timeout_interval: u64,
) {
    for (offset, test) in tests.iter().enumerate() {
        let test_result_id = first_test_result_id + offset;

        relay.start_test(test_result_id, now_ms());
        let assertions = settle(test, test_result_id, timeout_interval).await;
        relay.end_test(test_result_id, now_ms(), assertions);
    }
}

/// Start every test, then wait until all of them have settled
pub async fn run_tests_all_at_once(
    relay: &dyn Relay,
    tests: &[Test],
    first_test_result_id: usize,
    timeout_interval: u64,
) {
    for offset in 0..tests.len() {
        relay.start_test(first_test_result_id + offset, now_ms());
    }

    let runs = tests.iter().enumerate().map(|(offset, test)| {
        let test_result_id = first_test_result_id + offset;
        async move {
            let assertions = settle(test, test_result_id, timeout_interval).await;
            relay.end_test(test_result_id, now_ms(), assertions);
        }
    });

    join_all(runs).await;
}

/// Assertion reported for a body that outlived its timeout
pub fn timeout_assertion(timeout_interval: u64) -> String {
    format!("timed out at: {timeout_interval}ms")
}

async fn settle(test: &Test, test_result_id: usize, timeout_interval: u64) -> Assertions {
    // Invoke inside the guarded future so a panic while building the body is caught too.
    let body = AssertUnwindSafe(async { test.invoke().await }).catch_unwind();

    match tokio::time::timeout(Duration::from_millis(timeout_interval), body).await {
        Ok(Ok(assertions)) => assertions,
        Ok(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            warn!(test_result_id, "Test '{}' panicked: {}", test.name, message);
            vec![format!("test panicked: {message}")]
        }
        Err(_) => {
            debug!(
                test_result_id,
                "Test '{}' timed out after {}ms", test.name, timeout_interval
            );
            vec![timeout_assertion(timeout_interval)]
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
