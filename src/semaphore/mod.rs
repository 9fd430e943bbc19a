mod monitor;

pub use monitor::{Monitor, MonitorGuard};
use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

#[derive(Debug)]
struct State {
    permits: usize,
    forever: bool,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    signal: Condvar,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        // No foreign code runs while the state is locked, so the counters are consistent even
        // if some holder has panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counting semaphore with a terminal "released forever" state.
///
/// `Semaphore` is cheap to clone; all clones share the same permits. Once `release_forever()` has
/// been called, every blocked and every future `acquire()` returns immediately without consuming
/// capacity, and the semaphore never goes back to normal accounting.
#[derive(Debug, Clone)]
pub struct Semaphore {
    inner: Arc<Inner>,
}

impl Semaphore {
    /// Creates a new semaphore with the given number of free permits.
    pub fn new(permits: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    permits,
                    forever: false,
                }),
                signal: Condvar::new(),
            }),
        }
    }

    /// Blocks the current thread until a permit is available and takes it.
    pub fn acquire(&self) {
        let state = self.inner.lock();
        let mut state = self
            .inner
            .signal
            .wait_while(state, |s| !s.forever && s.permits == 0)
            .unwrap_or_else(PoisonError::into_inner);
        if !state.forever {
            state.permits -= 1;
        }
    }

    /// Tries to take a permit, waiting not longer than `timeout`.
    ///
    /// # Returns
    ///
    /// - `true` if a permit was taken (or the semaphore is released forever).
    /// - `false` if the timeout expired first.
    pub fn try_acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.lock();
        loop {
            if state.forever {
                return true;
            }
            if state.permits > 0 {
                state.permits -= 1;
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .inner
                .signal
                .wait_timeout(state, deadline - now)
                .map(|(state, _)| state)
                .unwrap_or_else(|err| err.into_inner().0);
        }
    }

    /// Returns one permit. Has no effect once the semaphore is released forever.
    pub fn release(&self) {
        let mut state = self.inner.lock();
        if state.forever {
            return;
        }
        state.permits += 1;
        drop(state);
        self.inner.signal.notify_one();
    }

    /// Switches the semaphore into its terminal state and wakes up every waiter.
    pub fn release_forever(&self) {
        let mut state = self.inner.lock();
        state.forever = true;
        drop(state);
        self.inner.signal.notify_all();
    }

    pub fn is_released_forever(&self) -> bool {
        self.inner.lock().forever
    }

    /// Number of free permits at this moment.
    pub fn available(&self) -> usize {
        self.inner.lock().permits
    }

    /// Same as `acquire()`, but the permit is given back as soon as the returned `Permit` is
    /// dropped.
    pub fn acquire_permit(&self) -> Permit {
        self.acquire();
        Permit {
            semaphore: self.clone(),
        }
    }

    /// Same as `try_acquire()`, but returns a `Permit` bound to the taken slot.
    pub fn try_acquire_permit(&self, timeout: Duration) -> Option<Permit> {
        if self.try_acquire(timeout) {
            Some(Permit {
                semaphore: self.clone(),
            })
        } else {
            None
        }
    }
}

/// Scoped ownership of one semaphore slot. Dropping it calls `release()`.
#[derive(Debug)]
pub struct Permit {
    semaphore: Semaphore,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
