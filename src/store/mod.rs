//! Results store
//!
//! A synchronous reducer over lifecycle events, plus the shared handle the
//! relay and runner use to reach it.

mod event;
mod results_store;

use std::cell::RefCell;
use std::rc::Rc;

pub use event::StoreEvent;
pub use results_store::ResultsStore;

/// Store handle shared by the relay and the runner on one task
pub type SharedStore = Rc<RefCell<ResultsStore>>;

/// Create an empty shared store
pub fn shared_store() -> SharedStore {
    Rc::new(RefCell::new(ResultsStore::new()))
}
