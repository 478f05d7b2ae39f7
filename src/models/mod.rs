//! Data models for test runs
//!
//! Suite definitions on the input side, result records on the output side.

mod results;
mod suite;

pub use results::{CollectionResult, RunResult, RunResults, Status, TestResult};
pub use suite::{Assertions, Collection, Test, TestParams};
