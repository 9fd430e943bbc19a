mod error;

pub mod ed2k;
pub mod md;
pub mod sha1;
pub mod sha256;

pub use error::E;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A trait that defines the behavior of a hasher, which is used to compute digests of buffers.
/// Implementers of this trait must also implement `Send`, because instances are kept in a pool
/// and moved between worker threads.
///
/// `Dispatcher` uses a pooled instance of a hasher for each request as follows:
/// - Reset the instance (with method `reset()`).
/// - Add the content of the buffer (with method `absorb(..)`).
/// - Finalize hash calculation (with method `finish()`).
/// - Read the digest (with method `hash()`).
/// - Return the instance into the pool.
pub trait Hasher: Send {
    /// Absorbs data into the hasher. Might be called multiple times per digest.
    ///
    /// # Parameters
    ///
    /// - `data`: A reference to a slice of bytes to be absorbed by the hasher.
    ///
    /// # Returns
    ///
    /// - `Result<(), E>`: On success, returns `Ok(())`. On failure, returns an error of type `E`.
    fn absorb(&mut self, data: &[u8]) -> Result<(), E>;

    /// Finalizes the hashing process. This method should be called after all data has been
    /// absorbed and only once until the next `reset()`.
    ///
    /// # Returns
    ///
    /// - `Result<(), E>`: On success, returns `Ok(())`. On failure, returns an error of type `E`.
    fn finish(&mut self) -> Result<(), E>;

    /// Retrieves the computed digest. This method should be called after `finish`.
    ///
    /// # Returns
    ///
    /// - `Result<&[u8], E>`: On success, returns a reference to the computed digest.
    fn hash(&self) -> Result<&[u8], E>;

    /// Brings the hasher back to its initial state, so the instance can be reused.
    fn reset(&mut self);
}

/// Family of the flat digest computed by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Algorithm {
    /// Plain SHA-1 over the whole buffer.
    #[default]
    Sha1,
    /// eDonkey2000 hash: MD4 chained over 9 728 000 bytes chunks.
    Ed2k,
}

/// Implementation used for digest contexts. Selected once, when a dispatcher is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Backend {
    /// Concrete RustCrypto types.
    #[default]
    Flat,
    /// Type-erased digests behind `DynDigest`.
    MessageDigest,
}

/// Creates a flat hasher for the given algorithm and backend.
pub fn flat(algorithm: Algorithm, backend: Backend) -> Box<dyn Hasher> {
    match (algorithm, backend) {
        (Algorithm::Sha1, Backend::Flat) => Box::new(sha1::Sha1::new()),
        (Algorithm::Sha1, Backend::MessageDigest) => Box::new(md::MessageDigest::sha1()),
        (Algorithm::Ed2k, backend) => Box::new(ed2k::Ed2k::new(backend)),
    }
}

/// Set of digest contexts borrowed from the pool by one worker at a time: a flat hasher and a
/// tree node hasher.
pub struct HasherSet {
    pub flat: Box<dyn Hasher>,
    pub tree: sha256::Sha256,
}

impl HasherSet {
    pub fn new(algorithm: Algorithm, backend: Backend) -> Self {
        Self {
            flat: flat(algorithm, backend),
            tree: sha256::Sha256::new(),
        }
    }

    /// Computes a flat digest of `data` with the pooled flat hasher.
    pub fn digest(&mut self, data: &[u8]) -> Result<Vec<u8>, E> {
        self.flat.reset();
        self.flat.absorb(data)?;
        self.flat.finish()?;
        Ok(self.flat.hash()?.to_vec())
    }
}
