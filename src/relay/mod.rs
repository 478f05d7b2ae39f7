//! Lifecycle relay
//!
//! The runner and strategies report progress through a [`Relay`]; the
//! default [`StoreRelay`] forwards every call into a shared results store in
//! the order received.

use tracing::trace;

use crate::models::{Assertions, Collection};
use crate::store::{SharedStore, StoreEvent};

/// Receiver of run lifecycle calls
///
/// Every method is synchronous and must not reorder or drop calls.
pub trait Relay {
    /// Build the results for `suite` and mark the run started
    fn start_run(&self, suite: &[Collection], start_time: u64);
    fn start_collection(&self, collection_result_id: usize, start_time: u64);
    fn start_test(&self, test_result_id: usize, start_time: u64);
    fn end_test(&self, test_result_id: usize, end_time: u64, assertions: Assertions);
    fn end_collection(&self, collection_result_id: usize, end_time: u64);
    fn end_run(&self, end_time: u64);
    fn cancel_run(&self, end_time: u64);
}

/// Relay that applies each call to a results store
#[derive(Clone, Debug)]
pub struct StoreRelay {
    store: SharedStore,
}

impl StoreRelay {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    fn dispatch(&self, event: StoreEvent) {
        trace!(kind = event.kind(), "relaying event");
        self.store.borrow_mut().apply(event);
    }
}

impl Relay for StoreRelay {
    fn start_run(&self, suite: &[Collection], start_time: u64) {
        // Each run starts from a fresh store; no history is kept.
        self.store.borrow_mut().reset();
        self.dispatch(StoreEvent::Initialize {
            suite: suite.to_vec(),
        });
        self.dispatch(StoreEvent::StartRun { start_time });
    }

    fn start_collection(&self, collection_result_id: usize, start_time: u64) {
        self.dispatch(StoreEvent::StartCollection {
            collection_result_id,
            start_time,
        });
    }

    fn start_test(&self, test_result_id: usize, start_time: u64) {
        self.dispatch(StoreEvent::StartTest {
            test_result_id,
            start_time,
        });
    }

    fn end_test(&self, test_result_id: usize, end_time: u64, assertions: Assertions) {
        self.dispatch(StoreEvent::EndTest {
            test_result_id,
            end_time,
            assertions,
        });
    }

    fn end_collection(&self, collection_result_id: usize, end_time: u64) {
        self.dispatch(StoreEvent::EndCollection {
            collection_result_id,
            end_time,
        });
    }

    fn end_run(&self, end_time: u64) {
        self.dispatch(StoreEvent::EndRun { end_time });
    }

    fn cancel_run(&self, end_time: u64) {
        self.dispatch(StoreEvent::CancelRun { end_time });
    }
}
