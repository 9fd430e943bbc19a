use crate::config::{Config, HashingStrategy};
use log::trace;
use std::{thread, time::Duration};

/// Shortest pause applied after a low-priority request in friendly mode.
pub const MIN_DELAY_MS: u64 = 50;
/// Longest pause applied after a low-priority request in friendly mode.
pub const MAX_DELAY_MS: u64 = 250;

/// Pause for a buffer of `len` bytes: `len / 1024 / 8` milliseconds clamped to
/// `[MIN_DELAY_MS, MAX_DELAY_MS]`.
pub fn delay(len: usize) -> Duration {
    let kb = len as u64 / 1024;
    Duration::from_millis((kb / 8).clamp(MIN_DELAY_MS, MAX_DELAY_MS))
}

/// Friendly hashing policy. Spreads background hashing over time so it doesn't starve
/// interactive I/O.
#[derive(Debug, Clone)]
pub struct Throttle {
    config: Config,
}

impl Throttle {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Pause which should follow hashing of `len` bytes, if any.
    pub fn pause(&self, len: usize, low_priority: bool) -> Option<Duration> {
        if low_priority && self.config.strategy() == HashingStrategy::Friendly {
            Some(delay(len))
        } else {
            None
        }
    }

    /// Sleeps the current thread according to the policy.
    pub fn apply(&self, len: usize, low_priority: bool) {
        if let Some(pause) = self.pause(len, low_priority) {
            trace!("friendly hashing: sleep {}ms after {len} bytes", pause.as_millis());
            thread::sleep(pause);
        }
    }
}
