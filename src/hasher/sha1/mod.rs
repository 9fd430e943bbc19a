use super::{Hasher, E};
use ::sha1::{Digest, Sha1 as Origin};

/// Hasher based on `sha1` crate.
pub struct Sha1 {
    hasher: Origin,
    hash: Option<Vec<u8>>,
}

impl Default for Sha1 {
    fn default() -> Self {
        Sha1 {
            hasher: Origin::new(),
            hash: None,
        }
    }
}

impl Sha1 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Hasher for Sha1 {
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
        self.hash = Some(self.hasher.finalize_reset().to_vec());
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
