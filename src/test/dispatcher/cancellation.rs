use crate::{
    test::utils::{counting_listener, random_buffer, PATIENCE},
    Job, Options, Status, E,
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

#[test]
fn before_hashing() -> Result<(), E> {
    let dispatcher = Options::new().workers(1).dispatcher()?;
    let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
    let (go_tx, go_rx) = crossbeam_channel::bounded::<()>(0);
    // Occupies the only worker until released
    let first = dispatcher.submit(Job::flat(random_buffer(1024)).listener(move |_| {
        let _ = entered_tx.send(());
        let _ = go_rx.recv_timeout(PATIENCE);
    }))?;
    assert!(entered_rx.recv_timeout(PATIENCE).is_ok());
    let (calls, listener) = counting_listener();
    let second = dispatcher.add_request(random_buffer(1024), Some(listener), false)?;
    second.cancel();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.status(), Status::Cancelled);
    assert!(second.result_timeout(PATIENCE)?.is_none());
    assert!(go_tx.send_timeout((), PATIENCE).is_ok());
    assert!(first.result_timeout(PATIENCE)?.is_some());
    dispatcher.shutdown();
    let stats = dispatcher.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn during_listener() -> Result<(), E> {
    let dispatcher = Options::new().dispatcher()?;
    let calls = Arc::new(AtomicUsize::new(0));
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let inner = calls.clone();
    let request = dispatcher.submit(Job::flat(random_buffer(64 * 1024)).listener(move |request| {
        inner.fetch_add(1, Ordering::SeqCst);
        request.cancel();
        let _ = done_tx.send(());
    }))?;
    assert!(done_rx.recv_timeout(PATIENCE).is_ok());
    assert!(request.result_timeout(PATIENCE)?.is_none());
    assert!(request.try_result().is_none());
    assert_eq!(request.status(), Status::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn repeated_cancel() -> Result<(), E> {
    let dispatcher = Options::new().workers(1).dispatcher()?;
    let (calls, listener) = counting_listener();
    let request = dispatcher.add_request(random_buffer(1024), Some(listener), false)?;
    request.cancel();
    request.cancel();
    let _ = request.result_timeout(PATIENCE)?;
    dispatcher.shutdown();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(request.result().is_none());
    Ok(())
}

#[test]
fn waiters_on_many_threads() -> Result<(), E> {
    let dispatcher = Options::new().dispatcher()?;
    let request = dispatcher.add_request(random_buffer(4 * 1024 * 1024), None, false)?;
    let digests = thread::scope(|scope| {
        let handles = (0..8)
            .map(|_| {
                let request = request.clone();
                scope.spawn(move || request.result_timeout(PATIENCE))
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("waiter doesn't panic"))
            .collect::<Result<Vec<_>, _>>()
    })?;
    let expected = request.result();
    assert!(expected.is_some());
    assert!(digests.iter().all(|digest| digest == &expected));
    Ok(())
}
