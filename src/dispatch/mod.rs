mod error;
mod worker;

pub use error::E;
use log::debug;
use std::thread::ThreadId;
pub(crate) use worker::reason;
use worker::{Task, Work, Worker};

/// Default number of worker threads. Actual parallelism of hashing is limited by the admission
/// semaphore of `Dispatcher`, so threads of this pool are mostly idle.
pub const DEFAULT_WORKERS: usize = 64;

/// Fixed-size pool of worker threads fed by one shared queue.
///
/// The number of threads never changes after construction. Panics inside submitted work are caught
/// and logged by the worker; the thread keeps serving the queue.
///
/// Dropping `Dispatch` is the same as calling `shutdown()`: already submitted work is completed
/// first, then all threads are joined.
pub struct Dispatch {
    tx_task: crossbeam_channel::Sender<Task>,
    workers: Vec<Worker>,
}

impl Dispatch {
    /// Starts `count` workers.
    ///
    /// # Errors
    ///
    /// `E::InvalidWorkersNumber` if `count` is zero.
    pub fn new(count: usize) -> Result<Self, E> {
        if count == 0 {
            return Err(E::InvalidWorkersNumber);
        }
        let (tx_task, rx_task) = crossbeam_channel::unbounded();
        let workers = (0..count)
            .map(|id| Worker::run(id as u16, rx_task.clone()))
            .collect::<Result<Vec<Worker>, E>>()?;
        debug!("Created dispatch pool with {count} workers");
        Ok(Self { tx_task, workers })
    }

    /// Puts `work` into the queue. One of idle workers takes it as soon as possible.
    ///
    /// # Errors
    ///
    /// `E::Closed` if the pool has been shut down.
    pub fn submit<F: FnOnce() + Send + 'static>(&self, work: F) -> Result<(), E> {
        if self.workers.is_empty() {
            return Err(E::Closed);
        }
        let work: Work = Box::new(work);
        self.tx_task.send(Task::Run(work)).map_err(|_| E::Closed)
    }

    /// Number of worker threads still serving the queue.
    pub fn workers(&self) -> usize {
        self.workers.iter().filter(|w| w.is_available()).count()
    }

    /// Identifiers of the worker threads.
    pub fn threads(&self) -> Vec<ThreadId> {
        self.workers.iter().filter_map(Worker::thread_id).collect()
    }

    /// Completes the work which is already in the queue, stops and joins all workers.
    ///
    /// Must not be called from submitted work: a worker can't join itself.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        for _ in self.workers.iter() {
            let _ = self.tx_task.send(Task::Shutdown);
        }
        for worker in self.workers.iter_mut() {
            worker.wait();
        }
        self.workers.clear();
        debug!("Dispatch pool has been shutdown");
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        self.shutdown();
    }
}
