mod error;
pub(crate) mod options;
mod stats;
mod task;

use crate::{
    config::Config,
    dispatch::Dispatch,
    hasher::HasherSet,
    pool::Pool,
    request::{Buffer, Job, Listener, Mode, Request},
    semaphore::{Monitor, Permit, Semaphore},
    throttle::Throttle,
    tree,
};
pub use error::E;
use log::{debug, error};
pub use options::Options;
use stats::Counters;
pub use stats::Stats;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle, ThreadId},
    time::{Duration, Instant},
};
use task::Task;

/// Admitted request waiting for the scheduler. Keeps the admission permit taken by the producer.
struct Entry {
    request: Request,
    permit: Permit,
}

type Queue = Monitor<VecDeque<Entry>>;

/// State shared between `Dispatcher` and its scheduler thread.
struct Shared {
    config: Config,
    queue: Queue,
    /// Released once per enqueued request and once on shutdown.
    available: Semaphore,
    stopped: AtomicBool,
    counters: Arc<Counters>,
}

/// `Dispatcher` accepts hashing requests from any number of producer threads and executes them
/// with bounded concurrency.
///
/// Two layers limit the work:
/// - The admission semaphore (by default the number of cores + 1 permits). A producer takes a
///   permit in `submit()`, blocking while all permits are in use; the permit is given back right
///   after the request has been hashed (and throttled in friendly mode). So no more than `permits`
///   hash computations run at the same time.
/// - The dispatch pool: a fixed number of worker threads (64 by default) executing the work.
///
/// One scheduler thread takes admitted requests from a FIFO queue, borrows a hasher set from the
/// pool and hands the work over to the dispatch pool. Requests are dequeued in submission order,
/// but they can complete in any order.
///
/// A request whose hashing failed is never resolved: the failure is logged and counted in
/// `Stats::failed`, the hashers and the permit are reclaimed. Use `Request::result_timeout()` to
/// guard against it.
///
/// # Example
///
/// ```
/// use hashpool::{Job, Options};
///
/// let dispatcher = Options::new().dispatcher().unwrap();
/// let request = dispatcher.submit(Job::flat(b"abc".to_vec())).unwrap();
/// let digest = request.result().unwrap();
/// assert_eq!(digest.as_bytes().len(), 20);
/// ```
pub struct Dispatcher {
    shared: Arc<Shared>,
    admission: Semaphore,
    permits: usize,
    workers: usize,
    ids: AtomicU64,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    /// Scheduler and worker threads. Listeners run on the workers.
    threads: Vec<ThreadId>,
}

impl Dispatcher {
    /// Creates a new instance of `Dispatcher` and starts its threads.
    ///
    /// # Parameters
    ///
    /// - `opt`: An instance of `Options` containing the configuration for `Dispatcher`.
    ///
    /// # Errors
    ///
    /// - `E::InvalidPermitsNumber` if zero permits have been requested.
    /// - `E::OptimalThreadsNumber` if the number of cores cannot be detected and permits weren't
    ///   given explicitly.
    /// - `E::Dispatch`/`E::Spawn` if threads cannot be started.
    pub fn new(opt: Options) -> Result<Self, E> {
        let permits = match opt.permits {
            Some(0) => return Err(E::InvalidPermitsNumber),
            Some(permits) => permits,
            None => {
                thread::available_parallelism()
                    .ok()
                    .map(|n| n.get())
                    .ok_or(E::OptimalThreadsNumber)?
                    + 1
            }
        };
        let workers = opt.workers.unwrap_or(crate::dispatch::DEFAULT_WORKERS);
        let config = opt.config.unwrap_or_default();
        opt.settings.apply(&config);
        let settings = config.settings();
        let pool = Pool::new(move || HasherSet::new(settings.algorithm, settings.backend));
        let dispatch = Dispatch::new(workers)?;
        let mut threads = dispatch.threads();
        let shared = Arc::new(Shared {
            config: config.clone(),
            queue: Monitor::new(VecDeque::new()),
            available: Semaphore::new(0),
            stopped: AtomicBool::new(false),
            counters: Arc::new(Counters::default()),
        });
        let inner = shared.clone();
        let throttle = Throttle::new(config);
        let scheduler = thread::Builder::new()
            .name("hashpool-scheduler".to_owned())
            .spawn(move || schedule(inner, dispatch, pool, throttle))
            .map_err(E::Spawn)?;
        threads.push(scheduler.thread().id());
        debug!("Created dispatcher with {permits} admission permits and {workers} workers");
        Ok(Self {
            shared,
            admission: Semaphore::new(permits),
            permits,
            workers,
            ids: AtomicU64::new(0),
            scheduler: Mutex::new(Some(scheduler)),
            threads,
        })
    }

    /// Submits a flat hashing request. Blocks while all admission permits are in use.
    ///
    /// # Parameters
    ///
    /// - `buffer`: Bytes to hash.
    /// - `listener`: Optional callback invoked once the request is completed or cancelled.
    /// - `low_priority`: Whether the request is throttled in friendly mode.
    pub fn add_request<B: Into<Buffer>>(
        &self,
        buffer: B,
        listener: Option<Listener>,
        low_priority: bool,
    ) -> Result<Request, E> {
        self.submit(
            Job::flat(buffer)
                .low_priority(low_priority)
                .with_listener(listener),
        )
    }

    /// Submits a Merkle tree request for one piece of a file. Blocks while all admission permits
    /// are in use.
    pub fn add_tree_request<B: Into<Buffer>>(
        &self,
        buffer: B,
        piece_size: u64,
        file_size: u64,
        listener: Option<Listener>,
        low_priority: bool,
    ) -> Result<Request, E> {
        self.submit(
            Job::tree(buffer, piece_size, file_size)
                .low_priority(low_priority)
                .with_listener(listener),
        )
    }

    /// Submits a job. Blocks while all admission permits are in use.
    ///
    /// # Errors
    ///
    /// - `E::Shutdown` if the dispatcher has been shutdown (also while waiting for a permit).
    /// - `E::Tree` if the tree geometry of the job is invalid.
    pub fn submit(&self, job: Job) -> Result<Request, E> {
        self.check(&job)?;
        let permit = self.admission.acquire_permit();
        self.enqueue(job, permit)
    }

    /// Same as `submit()`, but waits for an admission permit not longer than `timeout`.
    ///
    /// # Errors
    ///
    /// `E::AdmissionTimeout` if no permit became free in time. The job isn't queued in this case.
    pub fn try_submit(&self, job: Job, timeout: Duration) -> Result<Request, E> {
        self.check(&job)?;
        let permit = self
            .admission
            .try_acquire_permit(timeout)
            .ok_or(E::AdmissionTimeout(timeout))?;
        self.enqueue(job, permit)
    }

    /// Returns counters of the dispatcher.
    pub fn stats(&self) -> Stats {
        self.shared.counters.snapshot()
    }

    /// Number of admission permits, i.e. the maximum of concurrently running hash computations.
    pub fn permits(&self) -> usize {
        self.permits
    }

    /// Number of threads in the dispatch pool.
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Stops the dispatcher:
    /// - producers blocked on admission and all further submissions get `E::Shutdown`;
    /// - requests still waiting in the queue are cancelled;
    /// - requests already handed to workers are completed;
    /// - all threads are joined.
    ///
    /// Calling it more than once has no effect. Also called on drop.
    ///
    /// Called from a listener (i.e. from a thread of the dispatcher itself), it stops the
    /// dispatcher the same way but returns without joining: the threads finish on their own once
    /// the listener returns.
    pub fn shutdown(&self) {
        let handle = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        let now = Instant::now();
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.admission.release_forever();
        self.shared.available.release();
        if self.threads.contains(&thread::current().id()) {
            debug!("dispatcher is shutdown from its own thread; threads are detached");
            return;
        }
        if handle.join().is_err() {
            error!("Scheduler thread has been finished with panic");
        }
        debug!(
            "dispatcher has been shutdown in {}µs / {}ms / {}s; {}",
            now.elapsed().as_micros(),
            now.elapsed().as_millis(),
            now.elapsed().as_secs(),
            self.stats()
        );
    }

    fn check(&self, job: &Job) -> Result<(), E> {
        if self.shared.stopped.load(Ordering::SeqCst) {
            return Err(E::Shutdown);
        }
        if let Mode::Tree {
            piece_size,
            file_size,
        } = job.mode
        {
            let leaves = tree::leaf_count(piece_size, file_size)?;
            if job.buffer.len().div_ceil(tree::BLOCK_SIZE) > leaves {
                return Err(tree::E::BufferTooLarge(job.buffer.len(), leaves).into());
            }
        }
        Ok(())
    }

    fn enqueue(&self, job: Job, permit: Permit) -> Result<Request, E> {
        let request = Request::new(self.ids.fetch_add(1, Ordering::SeqCst), job);
        {
            let mut queue = self.shared.queue.enter();
            // Checked under the queue lock: the scheduler drains the queue under the same lock
            // after the flag is set.
            if self.shared.stopped.load(Ordering::SeqCst) {
                return Err(E::Shutdown);
            }
            queue.push_back(Entry {
                request: request.clone(),
                permit,
            });
        }
        self.shared.counters.admitted();
        self.shared.available.release();
        Ok(request)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Scheduler loop. Runs until the dispatcher is stopped.
fn schedule(
    shared: Arc<Shared>,
    mut dispatch: Dispatch,
    pool: Pool<HasherSet>,
    throttle: Throttle,
) {
    loop {
        shared.available.acquire();
        if shared.stopped.load(Ordering::SeqCst) {
            break;
        }
        let Some(Entry { request, permit }) = shared.queue.enter().pop_front() else {
            continue;
        };
        let task = Task {
            request,
            permit,
            hashers: pool.borrow(),
            throttle: throttle.clone(),
            config: shared.config.clone(),
            counters: shared.counters.clone(),
        };
        if let Err(err) = dispatch.submit(move || task.run()) {
            error!("Fail to hand request over to dispatch pool: {err}. Scheduler will be closed");
            shared.stopped.store(true, Ordering::SeqCst);
            break;
        }
    }
    let pending: Vec<Entry> = shared.queue.enter().drain(..).collect();
    if !pending.is_empty() {
        debug!("cancelling {} queued requests on shutdown", pending.len());
    }
    for Entry { request, permit } in pending {
        drop(permit);
        request.cancel();
        shared.counters.skipped();
    }
    dispatch.shutdown();
    debug!("Scheduler has been shutdown");
}

