//! jackrabbit - a test execution engine
//!
//! Runs a hierarchical suite (a run of ordered collections, each of ordered
//! tests) and keeps a live, queryable snapshot of its results.
//!
//! ## Features
//!
//! - Results store driven only by discrete lifecycle events, replayable from a log
//! - Sequential or concurrent execution per collection, with per-test timeouts
//! - Cancellation of the outstanding run, polled at collection boundaries
//! - Table, JSON and summary output for snapshots
//!
//! Everything runs on one task: concurrent collections overlap their test
//! futures cooperatively, never across threads.
//!
//! ## Usage
//!
//! ```no_run
//! use jackrabbit::{Collection, Test, TestRunner};
//!
//! # async fn demo() {
//! let suite = vec![Collection::new("math")
//!     .with_test(Test::sync("adds", |_| {
//!         if 1 + 1 == 2 { Vec::new() } else { vec!["1 + 1 != 2".to_string()] }
//!     }))
//!     .concurrent(true)
//!     .with_timeout(1_000)];
//!
//! let runner = TestRunner::new();
//! if let Some(results) = runner.run(&suite).await {
//!     println!("{}", results.result.status);
//! }
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod relay;
pub mod store;
pub mod utils;

pub use config::{EnvConfig, RunnerConfig};
pub use error::ConfigError;
pub use executor::{CancelHandle, ExecutionStrategy, RunState, TestRunner};
pub use models::{
    Assertions, Collection, CollectionResult, RunResult, RunResults, Status, Test, TestParams,
    TestResult,
};
pub use output::{OutputFormat, ResultFormatter};
pub use relay::{Relay, StoreRelay};
pub use store::{ResultsStore, SharedStore, StoreEvent};
