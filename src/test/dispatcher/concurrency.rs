use crate::{
    dispatcher,
    test::utils::{random_buffer, PATIENCE},
    Job, Options, E,
};
use std::{sync::Arc, thread, time::Duration};

#[test]
fn running_never_exceeds_permits() -> Result<(), E> {
    let dispatcher = Options::new().permits(2).workers(16).dispatcher()?;
    let data: Arc<[u8]> = random_buffer(256 * 1024).into();
    let requests = thread::scope(|scope| {
        let producers = (0..4)
            .map(|_| {
                let dispatcher = &dispatcher;
                let data = data.clone();
                scope.spawn(move || {
                    (0..10)
                        .map(|_| dispatcher.add_request(data.clone(), None, false))
                        .collect::<Result<Vec<_>, _>>()
                })
            })
            .collect::<Vec<_>>();
        producers
            .into_iter()
            .map(|handle| handle.join().expect("producer doesn't panic"))
            .collect::<Result<Vec<_>, _>>()
    })?;
    let requests = requests.into_iter().flatten().collect::<Vec<_>>();
    assert_eq!(requests.len(), 40);
    let mut digests = requests
        .iter()
        .map(|request| request.result_timeout(PATIENCE))
        .collect::<Result<Vec<_>, _>>()?;
    digests.dedup();
    assert_eq!(digests.len(), 1);
    assert!(digests[0].is_some());
    // Counters are updated right after the listener, so wait for workers first
    dispatcher.shutdown();
    let stats = dispatcher.stats();
    assert_eq!(stats.admitted, 40);
    assert_eq!(stats.completed, 40);
    assert_eq!(stats.running, 0);
    assert!(stats.peak >= 1);
    assert!(stats.peak <= 2, "peak of running computations: {}", stats.peak);
    Ok(())
}

#[test]
fn admission_timeout() -> Result<(), E> {
    let dispatcher = Options::new().permits(1).friendly(true).dispatcher()?;
    // Holds the only permit during the friendly pause (250ms for 2 MiB)
    let first = dispatcher.add_request(random_buffer(2 * 1024 * 1024), None, true)?;
    let timeout = Duration::from_millis(10);
    assert!(matches!(
        dispatcher.try_submit(Job::flat(random_buffer(1024)), timeout),
        Err(dispatcher::E::AdmissionTimeout(t)) if t == timeout
    ));
    assert!(first.result_timeout(PATIENCE)?.is_some());
    let second = dispatcher.try_submit(Job::flat(random_buffer(1024)), PATIENCE)?;
    assert!(second.result_timeout(PATIENCE)?.is_some());
    assert_eq!(dispatcher.stats().admitted, 2);
    Ok(())
}

#[test]
fn fewer_workers_than_permits() -> Result<(), E> {
    let dispatcher = Options::new().permits(8).workers(1).dispatcher()?;
    assert_eq!(dispatcher.permits(), 8);
    assert_eq!(dispatcher.workers(), 1);
    let requests = (0..20)
        .map(|_| dispatcher.add_request(random_buffer(32 * 1024), None, false))
        .collect::<Result<Vec<_>, _>>()?;
    for request in requests.iter() {
        assert!(request.result_timeout(PATIENCE)?.is_some());
    }
    assert_eq!(dispatcher.stats().peak, 1);
    Ok(())
}

#[test]
fn invalid_options() {
    assert!(matches!(
        Options::new().permits(0).dispatcher(),
        Err(dispatcher::E::InvalidPermitsNumber)
    ));
    assert!(matches!(
        Options::new().workers(0).dispatcher(),
        Err(dispatcher::E::Dispatch(crate::dispatch::E::InvalidWorkersNumber))
    ));
}
