use super::{md::MessageDigest, Backend, Hasher, E};
use ::md4::{Digest, Md4 as Origin};

/// Size of one eDonkey2000 chunk.
pub const CHUNK_SIZE: usize = 9_728_000;

/// Plain MD4 context used by `Backend::Flat`.
struct Md4 {
    hasher: Origin,
    hash: Option<Vec<u8>>,
}

impl Md4 {
    fn new() -> Self {
        Self {
            hasher: Origin::new(),
            hash: None,
        }
    }
}

impl Hasher for Md4 {
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

fn md4(backend: Backend) -> Box<dyn Hasher> {
    match backend {
        Backend::Flat => Box::new(Md4::new()),
        Backend::MessageDigest => Box::new(MessageDigest::md4()),
    }
}

/// eDonkey2000 hasher.
///
/// Data is split into `CHUNK_SIZE` chunks and each chunk is hashed with MD4. If the data fits
/// into one chunk, its MD4 is the result; otherwise the result is MD4 of the concatenated chunk
/// digests. Data of exactly N full chunks is not followed by an extra empty chunk.
pub struct Ed2k {
    chunk: Box<dyn Hasher>,
    root: Box<dyn Hasher>,
    digests: Vec<u8>,
    filled: usize,
    hash: Option<Vec<u8>>,
}

impl Ed2k {
    pub fn new(backend: Backend) -> Self {
        Self {
            chunk: md4(backend),
            root: md4(backend),
            digests: Vec::new(),
            filled: 0,
            hash: None,
        }
    }

    fn flush(&mut self) -> Result<(), E> {
        self.chunk.finish()?;
        self.digests.extend_from_slice(self.chunk.hash()?);
        self.chunk.reset();
        self.filled = 0;
        Ok(())
    }
}

impl Hasher for Ed2k {
    fn absorb(&mut self, mut data: &[u8]) -> Result<(), E> {
        if self.hash.is_some() {
            return Err(E::AlreadyFinished);
        }
        while !data.is_empty() {
            // A full chunk is flushed only when more data follows it
            if self.filled == CHUNK_SIZE {
                self.flush()?;
            }
            let take = (CHUNK_SIZE - self.filled).min(data.len());
            self.chunk.absorb(&data[..take])?;
            self.filled += take;
            data = &data[take..];
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), E> {
        if self.hash.is_some() {
            return Err(E::AlreadyFinished);
        }
        if self.digests.is_empty() {
            self.chunk.finish()?;
            self.hash = Some(self.chunk.hash()?.to_vec());
        } else {
            self.flush()?;
            self.root.reset();
            self.root.absorb(&self.digests)?;
            self.root.finish()?;
            self.hash = Some(self.root.hash()?.to_vec());
        }
        Ok(())
    }

    fn hash(&self) -> Result<&[u8], E> {
        Ok(self.hash.as_ref().ok_or(E::NotFinished)?)
    }

    fn reset(&mut self) {
        self.chunk.reset();
        self.root.reset();
        self.digests.clear();
        self.filled = 0;
        self.hash = None;
    }
}
