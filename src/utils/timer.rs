//! Timer utilities
//!
//! Wall-clock timestamps for lifecycle events and elapsed-time measurement.

use chrono::Utc;
use std::time::{Duration, Instant};

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Simple timer for measuring elapsed time
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    /// Create and start a new timer
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Stop timer and return elapsed time
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!("{}: {}ms", self.label, elapsed.as_millis());
        elapsed
    }
}
