use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

struct Inner<T> {
    free: Mutex<Vec<T>>,
    factory: Factory<T>,
}

impl<T> Inner<T> {
    fn free(&self) -> MutexGuard<'_, Vec<T>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Free list of reusable objects (hasher contexts in this crate).
///
/// `borrow()` pops an idle object or creates a new one with the factory when the list is empty.
/// The object goes back to the list as soon as the `Borrowed` guard is dropped, including drops
/// during panic unwinding. The pool grows up to the peak number of simultaneously borrowed objects
/// and never shrinks.
///
/// Cloning: an instance of `Pool` can be cloned; clones share the same free list.
pub struct Pool<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Pool<T> {
    /// Number of idle objects in the free list.
    pub fn idle(&self) -> usize {
        self.inner.free().len()
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pool {{ idle: {} }}", self.idle())
    }
}

impl<T: Send + 'static> Pool<T> {
    /// Creates an empty pool.
    ///
    /// # Parameters
    ///
    /// - `factory`: A closure creating a new object when the free list is empty.
    pub fn new<F: Fn() -> T + Send + Sync + 'static>(factory: F) -> Self {
        Self {
            inner: Arc::new(Inner {
                free: Mutex::new(Vec::new()),
                factory: Box::new(factory),
            }),
        }
    }

    /// Takes an object from the pool. The returned guard is `Send`, so it can be moved into a
    /// worker thread.
    pub fn borrow(&self) -> Borrowed<T> {
        let item = self.inner.free().pop();
        let item = item.unwrap_or_else(|| (self.inner.factory)());
        Borrowed {
            item: Some(item),
            pool: self.inner.clone(),
        }
    }
}

/// Exclusive ownership of a pooled object. Returns the object into the pool on drop.
pub struct Borrowed<T> {
    item: Option<T>,
    pool: Arc<Inner<T>>,
}

impl<T> Deref for Borrowed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.item.as_ref() {
            Some(item) => item,
            None => unreachable!("Item is held by guard until drop"),
        }
    }
}

impl<T> DerefMut for Borrowed<T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.item.as_mut() {
            Some(item) => item,
            None => unreachable!("Item is held by guard until drop"),
        }
    }
}

impl<T> Drop for Borrowed<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.free().push(item);
        }
    }
}
