mod error;
mod promise;

use crate::tree::Tree;
pub use error::E;
use promise::{Promise, Resolved};
pub use promise::Status;
use std::{fmt, ops::Range, sync::Arc, time::Duration};

/// Read-only view of caller's bytes.
///
/// The bytes are shared, not copied: the caller keeps its own `Arc` and the crate never mutates
/// them.
#[derive(Clone)]
pub struct Buffer {
    data: Arc<[u8]>,
    range: Range<usize>,
}

impl Buffer {
    pub fn new<T: Into<Arc<[u8]>>>(data: T) -> Self {
        let data = data.into();
        let range = 0..data.len();
        Self { data, range }
    }

    /// View of `range` of `data`. Returns `None` if the range is out of bounds.
    pub fn slice(data: Arc<[u8]>, range: Range<usize>) -> Option<Self> {
        if range.start > range.end || range.end > data.len() {
            return None;
        }
        Some(Self { data, range })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({}..{})", self.range.start, self.range.end)
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<Arc<[u8]>> for Buffer {
    fn from(data: Arc<[u8]>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Buffer {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

/// What kind of digest is computed for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One digest over the whole buffer.
    Flat,
    /// Merkle tree over 16 KiB blocks of a piece of a file.
    Tree { piece_size: u64, file_size: u64 },
}

/// Result of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Digest {
    Flat(Vec<u8>),
    Tree(Tree),
}

impl Digest {
    /// The flat digest or the root of the tree.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Flat(digest) => digest.as_slice(),
            Self::Tree(tree) => &tree.root()[..],
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Self::Flat(_) => None,
            Self::Tree(tree) => Some(tree),
        }
    }
}

/// Completion callback. Invoked exactly once: either when the digest is committed or when the
/// request is cancelled.
pub type Listener = Box<dyn Fn(&Request) + Send + Sync>;

/// Description of a hashing job, passed to `Dispatcher::submit()`.
pub struct Job {
    pub(crate) buffer: Buffer,
    pub(crate) mode: Mode,
    pub(crate) low_priority: bool,
    pub(crate) listener: Option<Listener>,
}

impl Job {
    pub fn flat<B: Into<Buffer>>(buffer: B) -> Self {
        Self {
            buffer: buffer.into(),
            mode: Mode::Flat,
            low_priority: false,
            listener: None,
        }
    }

    pub fn tree<B: Into<Buffer>>(buffer: B, piece_size: u64, file_size: u64) -> Self {
        Self {
            buffer: buffer.into(),
            mode: Mode::Tree {
                piece_size,
                file_size,
            },
            low_priority: false,
            listener: None,
        }
    }

    /// Low-priority requests are throttled in friendly mode.
    pub fn low_priority(mut self, low_priority: bool) -> Self {
        self.low_priority = low_priority;
        self
    }

    pub fn listener<F: Fn(&Request) + Send + Sync + 'static>(mut self, listener: F) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub(crate) fn with_listener(mut self, listener: Option<Listener>) -> Self {
        self.listener = listener;
        self
    }
}

struct Inner {
    id: u64,
    buffer: Buffer,
    mode: Mode,
    low_priority: bool,
    listener: Option<Listener>,
    promise: Promise,
}

/// Handle of a submitted hashing job.
///
/// Cloning: an instance of `Request` can be cloned; clones refer to the same job. `Request` is safe
/// to be shared between threads: any number of threads may wait for the result.
#[derive(Clone)]
pub struct Request {
    inner: Arc<Inner>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.inner.id)
            .field("buffer", &self.inner.buffer)
            .field("mode", &self.inner.mode)
            .field("low_priority", &self.inner.low_priority)
            .field("status", &self.status())
            .finish()
    }
}

impl Request {
    pub(crate) fn new(id: u64, job: Job) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                buffer: job.buffer,
                mode: job.mode,
                low_priority: job.low_priority,
                listener: job.listener,
                promise: Promise::new(),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn buffer(&self) -> &Buffer {
        &self.inner.buffer
    }

    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    pub fn is_low_priority(&self) -> bool {
        self.inner.low_priority
    }

    pub fn status(&self) -> Status {
        self.inner.promise.status()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == Status::Cancelled
    }

    /// Cancels the request. If it hasn't been executed yet, it will be skipped without hashing.
    /// Afterwards `result()` returns `None` forever, even if a digest was already computed. The
    /// listener is invoked here unless it has already been invoked on completion.
    pub fn cancel(&self) {
        if self.inner.promise.cancel() {
            self.notify();
        }
    }

    /// Blocks until the request is resolved.
    ///
    /// # Returns
    ///
    /// - `Some(Digest)` if the digest has been computed.
    /// - `None` if the request has been cancelled.
    ///
    /// A request whose hashing has failed is never resolved; use `result_timeout()` if that has to
    /// be guarded against.
    ///
    /// Cancellation wins over completion. If `cancel()` is called after the digest has been
    /// committed (e.g. from the listener), readers which returned before the cancellation got the
    /// digest, while every later call returns `None`. Calls made after `cancel()` returned always
    /// agree with each other.
    pub fn result(&self) -> Option<Digest> {
        match self.inner.promise.wait() {
            Resolved::Completed(digest) => Some(digest),
            Resolved::Cancelled => None,
        }
    }

    /// Same as `result()`, but waits not longer than `timeout`.
    ///
    /// # Errors
    ///
    /// `E::Timeout` if the request wasn't resolved in time.
    pub fn result_timeout(&self, timeout: Duration) -> Result<Option<Digest>, E> {
        match self.inner.promise.wait_timeout(timeout) {
            Some(Resolved::Completed(digest)) => Ok(Some(digest)),
            Some(Resolved::Cancelled) => Ok(None),
            None => Err(E::Timeout(self.inner.id, timeout)),
        }
    }

    /// Returns the digest if it's already available, without waiting.
    pub fn try_result(&self) -> Option<Digest> {
        match self.inner.promise.peek() {
            Some(Resolved::Completed(digest)) => Some(digest),
            _ => None,
        }
    }

    /// Marks the request as running. Returns `false` if the request has been cancelled and must
    /// be skipped.
    pub(crate) fn start(&self) -> bool {
        self.inner.promise.start()
    }

    /// Commits the digest unless the request has been cancelled meanwhile. Returns `true` if the
    /// digest has been accepted.
    pub(crate) fn complete(&self, digest: Digest) -> bool {
        if self.inner.promise.complete(digest) {
            self.notify();
            true
        } else {
            false
        }
    }

    fn notify(&self) {
        if let Some(listener) = self.inner.listener.as_ref() {
            listener(self);
        }
    }
}
