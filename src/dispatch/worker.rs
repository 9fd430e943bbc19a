use super::E;
use crossbeam_channel::Receiver;
use log::{debug, error};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle, ThreadId},
};

pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Messages for communication between `Dispatch` and workers.
pub enum Task {
    /// Unit of work to execute.
    Run(Work),
    /// Breaking the listening loop of the `Worker`. Once `Shutdown` has been received, the
    /// `Worker` cannot be reused.
    Shutdown,
}

/// Message of a panic payload.
pub(crate) fn reason(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown"
    }
}

/// `Worker` owns one thread listening to the shared queue of `Dispatch`.
pub struct Worker {
    available: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn run(id: u16, rx_task: Receiver<Task>) -> Result<Self, E> {
        let available: Arc<AtomicBool> = Arc::new(AtomicBool::new(true));
        let available_inner = available.clone();
        let handle = thread::Builder::new()
            .name(format!("hashpool-worker-{id}"))
            .spawn(move || {
                while let Ok(task) = rx_task.recv() {
                    let work = match task {
                        Task::Run(work) => work,
                        Task::Shutdown => break,
                    };
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
                        error!(
                            "Worker #{id}: work item panicked: {}",
                            reason(payload.as_ref())
                        );
                    }
                }
                available_inner.store(false, Ordering::SeqCst);
                debug!("Dispatch worker #{id} has been shutdown");
            })?;
        Ok(Self {
            available,
            handle: Some(handle),
        })
    }

    pub fn thread_id(&self) -> Option<ThreadId> {
        self.handle.as_ref().map(|handle| handle.thread().id())
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
