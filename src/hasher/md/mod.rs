use super::{Hasher, E};
use sha2::digest::DynDigest;

/// Hasher backed by a type-erased digest context. Used when `Backend::MessageDigest` has been
/// selected; the concrete algorithm is picked by the constructor.
pub struct MessageDigest {
    hasher: Box<dyn DynDigest + Send>,
    hash: Option<Vec<u8>>,
}

impl MessageDigest {
    fn with(hasher: Box<dyn DynDigest + Send>) -> Self {
        Self { hasher, hash: None }
    }

    pub fn sha1() -> Self {
        Self::with(Box::new(::sha1::Sha1::default()))
    }

    pub fn md4() -> Self {
        Self::with(Box::new(md4::Md4::default()))
    }

    pub fn sha256() -> Self {
        Self::with(Box::new(sha2::Sha256::default()))
    }

    /// Size of produced digest in bytes.
    pub fn output_size(&self) -> usize {
        self.hasher.output_size()
    }
}

impl Hasher for MessageDigest {
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
        self.hash = Some(self.hasher.finalize_reset().into_vec());
        Ok(())
    }

    fn hash(&self) -> Result<&[u8], E> {
        Ok(self.hash.as_ref().ok_or(E::NotFinished)?)
    }

    fn reset(&mut self) {
        self.hasher.reset();
        self.hash = None;
    }
}
