//! Test execution engine
//!
//! Provides the run orchestrator and the sequential and concurrent
//! execution strategies it chooses between per collection.

mod runner;
mod strategy;

pub use runner::{CancelHandle, RunState, TestRunner, DEFAULT_TIMEOUT_MS};
pub use strategy::{
    run_tests_all_at_once, run_tests_in_order, timeout_assertion, ExecutionStrategy,
};
