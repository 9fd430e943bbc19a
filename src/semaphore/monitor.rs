use std::{
    ops::{Deref, DerefMut},
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

/// Mutual-exclusion cell with blocking and timed entry.
///
/// The protected value is moved out of the cell while a `MonitorGuard` is alive and moved back when
/// the guard is dropped.
#[derive(Debug)]
pub struct Monitor<T> {
    slot: Mutex<Option<T>>,
    signal: Condvar,
}

impl<T> Monitor<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Mutex::new(Some(value)),
            signal: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the monitor is free and enters it.
    pub fn enter(&self) -> MonitorGuard<'_, T> {
        let slot = self.lock();
        let mut slot = self
            .signal
            .wait_while(slot, |s| s.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        MonitorGuard {
            monitor: self,
            value: slot.take(),
        }
    }

    /// Enters the monitor if it becomes free within `timeout`.
    pub fn try_enter(&self, timeout: Duration) -> Option<MonitorGuard<'_, T>> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.take() {
                return Some(MonitorGuard {
                    monitor: self,
                    value: Some(value),
                });
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            slot = self
                .signal
                .wait_timeout(slot, deadline - now)
                .map(|(slot, _)| slot)
                .unwrap_or_else(|err| err.into_inner().0);
        }
    }
}

/// Access to the value of a `Monitor`. The monitor is left on drop.
pub struct MonitorGuard<'a, T> {
    monitor: &'a Monitor<T>,
    value: Option<T>,
}

impl<T> Deref for MonitorGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.value.as_ref() {
            Some(value) => value,
            None => unreachable!("Value is held by guard until drop"),
        }
    }
}

impl<T> DerefMut for MonitorGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.value.as_mut() {
            Some(value) => value,
            None => unreachable!("Value is held by guard until drop"),
        }
    }
}

impl<T> Drop for MonitorGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            *self.monitor.lock() = Some(value);
            self.monitor.signal.notify_one();
        }
    }
}
