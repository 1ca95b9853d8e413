//! # Utilities
//! Small timing helpers shared across the workspace.
//!

use core::time::Duration;
use std::time::Instant;

use tracing::debug;

/// Display the duration as a string with units. Display is handled in the following order:
/// 1. `>= 10s` displays seconds only.
/// 1. `>= 1s` displays seconds with 1dp.
/// 1. `>= 1ms` displays milliseconds only.
/// 1. `>= 1µs` displays microseconds only.
/// 1. `< 1µs` displays nanoseconds only.
#[inline]
pub fn display_duration(duration: Duration) -> String {
    if duration.as_secs() >= 10 {
        format!("{}s", duration.as_secs())
    } else if duration.as_secs() >= 1 {
        format!("{:.1}s", duration.as_secs_f32())
    } else if duration.as_millis() >= 1 {
        format!("{}ms", duration.as_millis())
    } else if duration.as_micros() >= 1 {
        format!("{}µs", duration.as_micros())
    } else {
        format!("{}ns", duration.as_nanos())
    }
}

/// Timer for a labelled stage of a run.
///
/// Logs `[Timing] {label} took {duration}` at debug level when finished or dropped.
pub struct DebugTime {
    label: String,
    start: Instant,
    logged: bool,
}

impl DebugTime {
    /// Start a new debug timer with the given label.
    pub fn start<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
            logged: false,
        }
    }

    /// The label this timer was started with.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Time since the timer was started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer, log it, and return the elapsed time.
    pub fn finish(mut self) -> Duration {
        let elapsed = self.elapsed();
        self.log(elapsed);
        elapsed
    }

    fn log(&mut self, elapsed: Duration) {
        if self.logged {
            return;
        }
        self.logged = true;

        debug!("[Timing] {} took {}", self.label, display_duration(elapsed));
    }
}

impl Drop for DebugTime {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        self.log(elapsed);
    }
}
