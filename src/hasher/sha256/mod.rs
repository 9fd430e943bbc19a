use super::{Hasher, E};
use sha2::{Digest, Sha256 as Origin};

/// Length of SHA-256 digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Hasher based on `sha2` crate. Used for Merkle tree leaves and nodes.
pub struct Sha256 {
    hasher: Origin,
    hash: Option<[u8; DIGEST_SIZE]>,
}

impl Default for Sha256 {
    fn default() -> Self {
        Sha256 {
            hasher: Origin::new(),
            hash: None,
        }
    }
}

impl Sha256 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest of a single block. Discards a digest being accumulated with `absorb()`.
    pub fn leaf(&mut self, data: &[u8]) -> [u8; DIGEST_SIZE] {
        self.hash = None;
        Digest::reset(&mut self.hasher);
        self.hasher.update(data);
        self.hasher.finalize_reset().into()
    }

    /// Digest of `left || right`. Discards a digest being accumulated with `absorb()`.
    pub fn node(
        &mut self,
        left: &[u8; DIGEST_SIZE],
        right: &[u8; DIGEST_SIZE],
    ) -> [u8; DIGEST_SIZE] {
        self.hash = None;
        Digest::reset(&mut self.hasher);
        self.hasher.update(left);
        self.hasher.update(right);
        self.hasher.finalize_reset().into()
    }
}

impl Hasher for Sha256 {
    fn absorb(&mut self, data: &[u8]) -> Result<(), E> {
        if self.hash.is_some() {
            return Err(E::AlreadyFinished);
        }
        self.hasher.update(data);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), E> {
        if self.hash.is_some() {
            return Err(E::AlreadyFinished);
        }
        self.hash = Some(self.hasher.finalize_reset().into());
        Ok(())
    }

    fn hash(&self) -> Result<&[u8], E> {
        Ok(self.hash.as_ref().ok_or(E::NotFinished)?)
    }

    fn reset(&mut self) {
        Digest::reset(&mut self.hasher);
        self.hash = None;
    }
}
