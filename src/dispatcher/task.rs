use super::{stats::Counters, E};
use crate::{
    config::Config,
    dispatch::reason,
    hasher::HasherSet,
    pool::Borrowed,
    request::{Digest, Mode, Request},
    semaphore::Permit,
    throttle::Throttle,
    tree::Tree,
};
use log::{debug, warn};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Instant,
};

/// Computes the digest of the request with pooled hashers.
pub(crate) fn compute(
    hashers: &mut HasherSet,
    request: &Request,
    always_pass: bool,
) -> Result<Digest, E> {
    let data = request.buffer().as_slice();
    Ok(match request.mode() {
        Mode::Flat if always_pass => Digest::Flat(Vec::new()),
        Mode::Tree { .. } if always_pass => Digest::Tree(Tree::zero()),
        Mode::Flat => Digest::Flat(hashers.digest(data)?),
        Mode::Tree {
            piece_size,
            file_size,
        } => Digest::Tree(Tree::build(
            &mut hashers.tree,
            data,
            piece_size,
            file_size,
        )?),
    })
}

/// Work item submitted by the scheduler to the dispatch pool.
///
/// Owns everything the execution needs; the hashers and the admission permit are given back by
/// drop on every exit path, panics included.
pub(crate) struct Task {
    pub request: Request,
    pub permit: Permit,
    pub hashers: Borrowed<HasherSet>,
    pub throttle: Throttle,
    pub config: Config,
    pub counters: Arc<Counters>,
}

impl Task {
    pub fn run(self) {
        let Task {
            request,
            permit,
            mut hashers,
            throttle,
            config,
            counters,
        } = self;
        if !request.start() {
            counters.skipped();
            debug!("request #{} was cancelled before hashing", request.id());
            return;
        }
        let now = Instant::now();
        let digest = {
            let _running = counters.running();
            panic::catch_unwind(AssertUnwindSafe(|| {
                compute(&mut hashers, &request, config.always_pass())
            }))
            .unwrap_or_else(|payload| Err(E::Panicked(reason(payload.as_ref()).to_owned())))
        };
        drop(hashers);
        throttle.apply(request.buffer().len(), request.is_low_priority());
        drop(permit);
        match digest {
            Ok(digest) => {
                if request.complete(digest) {
                    counters.completed();
                    debug!(
                        "request #{} ({} bytes) hashed in {}µs / {}ms / {}s",
                        request.id(),
                        request.buffer().len(),
                        now.elapsed().as_micros(),
                        now.elapsed().as_millis(),
                        now.elapsed().as_secs()
                    );
                } else {
                    counters.skipped();
                    debug!(
                        "request #{} was cancelled during hashing; digest is discarded",
                        request.id()
                    );
                }
            }
            Err(err) => {
                // The request stays unresolved; callers guard it with their own timeouts
                counters.failed();
                warn!("request #{}: hashing failed: {err}", request.id());
            }
        }
    }
}
