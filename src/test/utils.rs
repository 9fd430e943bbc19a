use crate::{Listener, Request};
use rand::RngCore;
use std::{
    fmt::Write,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// Upper bound for any blocking wait in tests.
pub const PATIENCE: Duration = Duration::from_secs(30);

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

pub fn random_buffer(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

/// Listener which counts its invocations.
pub fn counting_listener() -> (Arc<AtomicUsize>, Listener) {
    let calls = Arc::new(AtomicUsize::new(0));
    let inner = calls.clone();
    (
        calls,
        Box::new(move |_: &Request| {
            inner.fetch_add(1, Ordering::SeqCst);
        }),
    )
}
