use super::Digest;
use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

/// Observable lifecycle of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Queued,
    Running,
    Completed,
    Cancelled,
}

enum Phase {
    Queued,
    Running,
    Completed(Digest),
    Cancelled,
}

struct State {
    phase: Phase,
    /// Set by the first transition which should be reported to the listener.
    notified: bool,
}

/// Terminal state as seen by a waiter.
pub enum Resolved {
    Completed(Digest),
    Cancelled,
}

/// One-shot completion of a request.
///
/// The first of `complete()` / `cancel()` resolves the promise and wakes up every waiter.
/// Cancellation is terminal: a later `cancel()` also discards a committed digest, while a
/// `complete()` after cancellation is ignored. Only one transition is ever reported as
/// "notify listener".
pub struct Promise {
    state: Mutex<State>,
    signal: Condvar,
}

impl Promise {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                phase: Phase::Queued,
                notified: false,
            }),
            signal: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> Status {
        match self.lock().phase {
            Phase::Queued => Status::Queued,
            Phase::Running => Status::Running,
            Phase::Completed(_) => Status::Completed,
            Phase::Cancelled => Status::Cancelled,
        }
    }

    /// Moves a queued promise into running state. Returns `false` if it has been cancelled.
    pub fn start(&self) -> bool {
        let mut state = self.lock();
        if matches!(state.phase, Phase::Queued) {
            state.phase = Phase::Running;
        }
        matches!(state.phase, Phase::Running)
    }

    /// Commits a digest. Returns `true` if the listener should be notified.
    pub fn complete(&self, digest: Digest) -> bool {
        let mut state = self.lock();
        if matches!(state.phase, Phase::Cancelled | Phase::Completed(_)) {
            return false;
        }
        state.phase = Phase::Completed(digest);
        let notify = !state.notified;
        state.notified = true;
        drop(state);
        self.signal.notify_all();
        notify
    }

    /// Cancels the promise. Returns `true` if the listener should be notified.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        if matches!(state.phase, Phase::Cancelled) {
            return false;
        }
        state.phase = Phase::Cancelled;
        let notify = !state.notified;
        state.notified = true;
        drop(state);
        self.signal.notify_all();
        notify
    }

    fn resolved(state: &State) -> Option<Resolved> {
        match &state.phase {
            Phase::Completed(digest) => Some(Resolved::Completed(digest.clone())),
            Phase::Cancelled => Some(Resolved::Cancelled),
            Phase::Queued | Phase::Running => None,
        }
    }

    /// Current terminal state without waiting.
    pub fn peek(&self) -> Option<Resolved> {
        Self::resolved(&self.lock())
    }

    /// Blocks until the promise is resolved.
    pub fn wait(&self) -> Resolved {
        let mut state = self.lock();
        loop {
            if let Some(resolved) = Self::resolved(&state) {
                return resolved;
            }
            state = self
                .signal
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until the promise is resolved or `timeout` expires.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Resolved> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if let Some(resolved) = Self::resolved(&state) {
                return Some(resolved);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            state = self
                .signal
                .wait_timeout(state, deadline - now)
                .map(|(state, _)| state)
                .unwrap_or_else(|err| err.into_inner().0);
        }
    }
}
