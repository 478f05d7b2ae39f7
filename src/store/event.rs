//! Lifecycle events accepted by the results store

use crate::models::{Assertions, Collection};

/// A discrete lifecycle event
///
/// Ids are positions assigned by [`StoreEvent::Initialize`]; timestamps are
/// milliseconds since the Unix epoch.
#[derive(Clone, Debug)]
pub enum StoreEvent {
    /// Build the collection and test results for a run
    Initialize { suite: Vec<Collection> },
    StartRun {
        start_time: u64,
    },
    EndRun {
        end_time: u64,
    },
    CancelRun {
        end_time: u64,
    },
    StartCollection {
        collection_result_id: usize,
        start_time: u64,
    },
    EndCollection {
        collection_result_id: usize,
        end_time: u64,
    },
    StartTest {
        test_result_id: usize,
        start_time: u64,
    },
    EndTest {
        test_result_id: usize,
        end_time: u64,
        assertions: Assertions,
    },
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::Initialize { .. } => "initialize",
            StoreEvent::StartRun { .. } => "start_run",
            StoreEvent::EndRun { .. } => "end_run",
            StoreEvent::CancelRun { .. } => "cancel_run",
            StoreEvent::StartCollection { .. } => "start_collection",
            StoreEvent::EndCollection { .. } => "end_collection",
            StoreEvent::StartTest { .. } => "start_test",
            StoreEvent::EndTest { .. } => "end_test",
        }
    }
}
