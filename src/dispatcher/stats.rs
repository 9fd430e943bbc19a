use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Requests accepted by `submit()` and friends.
    pub admitted: usize,
    /// Hash computations running at this moment.
    pub running: usize,
    /// Highest value of `running` observed so far.
    pub peak: usize,
    /// Requests resolved with a digest.
    pub completed: usize,
    /// Cancelled requests which were skipped without hashing.
    pub skipped: usize,
    /// Requests whose hashing has failed; such requests are never resolved.
    pub failed: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "admitted: {}; running: {} (peak: {}); completed: {}; skipped: {}; failed: {}",
            self.admitted, self.running, self.peak, self.completed, self.skipped, self.failed
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    admitted: AtomicUsize,
    running: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    pub fn admitted(&self) {
        self.admitted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks the start of a hash computation; the returned guard marks its end.
    pub fn running(&self) -> Running<'_> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Running { counters: self }
    }

    pub fn snapshot(&self) -> Stats {
        Stats {
            admitted: self.admitted.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
            peak: self.peak.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

pub(crate) struct Running<'a> {
    counters: &'a Counters,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.counters.running.fetch_sub(1, Ordering::SeqCst);
    }
}
