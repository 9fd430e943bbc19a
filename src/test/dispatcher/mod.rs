mod cancellation;
mod concurrency;
mod throttling;

use crate::{
    dispatcher,
    test::utils::{hex, random_buffer, PATIENCE},
    tree::{self, Node, BLOCK_SIZE, ZERO},
    Algorithm, Backend, Digest, Job, Options, E,
};
use sha2::{Digest as _, Sha256};
use std::sync::Arc;

fn sha256(parts: &[&[u8]]) -> Node {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn resolved(request: &crate::Request) -> Result<Digest, E> {
    Ok(request
        .result_timeout(PATIENCE)?
        .expect("request is completed"))
}

#[test]
fn sha1_of_zeros() -> Result<(), E> {
    let dispatcher = Options::new().dispatcher()?;
    let request = dispatcher.add_request(vec![0u8; 1024 * 1024], None, false)?;
    let digest = resolved(&request)?;
    assert_eq!(
        hex(digest.as_bytes()),
        "3b71f43ff30f4b15b5cd85dd9e95ebc7e84eb5a3"
    );
    assert!(digest.as_tree().is_none());
    Ok(())
}

#[test]
fn deterministic() -> Result<(), E> {
    let data: Arc<[u8]> = random_buffer(3 * 1024 * 1024 + 17).into();
    for backend in [Backend::Flat, Backend::MessageDigest] {
        let dispatcher = Options::new().backend(backend).dispatcher()?;
        let a = dispatcher.add_request(data.clone(), None, false)?;
        let b = dispatcher.add_request(data.clone(), None, false)?;
        let a = resolved(&a)?;
        let b = resolved(&b)?;
        assert_eq!(a, b);
        assert_eq!(a.as_bytes().len(), 20);
    }
    Ok(())
}

#[test]
fn ed2k_algorithm() -> Result<(), E> {
    for backend in [Backend::Flat, Backend::MessageDigest] {
        let dispatcher = Options::new()
            .algorithm(Algorithm::Ed2k)
            .backend(backend)
            .dispatcher()?;
        let request = dispatcher.add_request(b"abc".as_slice(), None, false)?;
        assert_eq!(
            hex(resolved(&request)?.as_bytes()),
            "a448017aaf21d8525fc10ae87aa6729d"
        );
    }
    Ok(())
}

#[test]
fn listener_sees_digest() -> Result<(), E> {
    let dispatcher = Options::new().dispatcher()?;
    let (tx, rx) = crossbeam_channel::bounded(1);
    let request = dispatcher.submit(Job::flat(b"abc".as_slice()).listener(move |request| {
        let _ = tx.send(request.try_result().map(|digest| hex(digest.as_bytes())));
    }))?;
    assert_eq!(
        rx.recv_timeout(PATIENCE).ok().flatten().as_deref(),
        Some("a9993e364706816aba3e25717850c26c9cd0d89d")
    );
    assert_eq!(request.status(), crate::Status::Completed);
    Ok(())
}

#[test]
fn tree_root_matches_manual_reduction() -> Result<(), E> {
    let piece_size = 4 * BLOCK_SIZE as u64;
    let data = random_buffer(4 * BLOCK_SIZE);
    let dispatcher = Options::new().dispatcher()?;
    let request = dispatcher.add_tree_request(data.clone(), piece_size, 1 << 30, None, false)?;
    let digest = resolved(&request)?;
    let tree = digest.as_tree().expect("tree digest");
    let leaves = data
        .chunks(BLOCK_SIZE)
        .map(|block| sha256(&[block]))
        .collect::<Vec<Node>>();
    let left = sha256(&[&leaves[0], &leaves[1]]);
    let right = sha256(&[&leaves[2], &leaves[3]]);
    let root = sha256(&[&left, &right]);
    assert_eq!(tree.leaves(), leaves.as_slice());
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.root(), &root);
    assert_eq!(digest.as_bytes(), &root[..]);
    Ok(())
}

#[test]
fn small_file_is_padded() -> Result<(), E> {
    let file_size = 40_000u64;
    let data = random_buffer(file_size as usize);
    let dispatcher = Options::new().dispatcher()?;
    let request =
        dispatcher.add_tree_request(data.clone(), 256 * 1024, file_size, None, false)?;
    let digest = resolved(&request)?;
    let tree = digest.as_tree().expect("tree digest");
    // next_power_of_two(40 000) = 65 536 = 4 blocks
    assert_eq!(tree.leaves().len(), 4);
    assert_eq!(tree.leaves()[2], sha256(&[&data[2 * BLOCK_SIZE..]]));
    assert_eq!(tree.leaves()[3], ZERO);
    Ok(())
}

#[test]
fn invalid_geometry_is_rejected() -> Result<(), E> {
    let dispatcher = Options::new().dispatcher()?;
    assert!(matches!(
        dispatcher.add_tree_request(vec![0u8; 100], 10_000, 10_000, None, false),
        Err(dispatcher::E::Tree(tree::E::InvalidPieceSize(10_000)))
    ));
    assert!(matches!(
        dispatcher.add_tree_request(
            vec![0u8; 3 * BLOCK_SIZE],
            2 * BLOCK_SIZE as u64,
            1 << 20,
            None,
            false
        ),
        Err(dispatcher::E::Tree(tree::E::BufferTooLarge(_, 2)))
    ));
    assert!(matches!(
        dispatcher.add_tree_request(Vec::new(), 1 << 62, 1 << 62, None, false),
        Err(dispatcher::E::Tree(tree::E::PieceTooLarge(_, tree::MAX_PIECE_SIZE)))
    ));
    assert_eq!(dispatcher.stats().admitted, 0);
    Ok(())
}

#[test]
fn always_pass() -> Result<(), E> {
    let dispatcher = Options::new().always_pass(true).dispatcher()?;
    let flat = dispatcher.add_request(random_buffer(1000), None, false)?;
    let tree = dispatcher.add_tree_request(random_buffer(1000), 1 << 20, 1 << 20, None, false)?;
    assert!(resolved(&flat)?.as_bytes().is_empty());
    assert_eq!(resolved(&tree)?.as_bytes(), &ZERO[..]);
    dispatcher.config().set_always_pass(false);
    let flat = dispatcher.add_request(b"abc".as_slice(), None, false)?;
    assert_eq!(resolved(&flat)?.as_bytes().len(), 20);
    Ok(())
}
