use crate::{
    test::utils::{random_buffer, PATIENCE},
    throttle::MIN_DELAY_MS,
    Config, HashingStrategy, Options, E,
};
use std::time::{Duration, Instant};

const REQUESTS: u64 = 12;
const PERMITS: u64 = 3;

fn run_low_priority(dispatcher: &crate::Dispatcher) -> Result<Duration, E> {
    let now = Instant::now();
    let requests = (0..REQUESTS)
        .map(|_| dispatcher.add_request(random_buffer(1024), None, true))
        .collect::<Result<Vec<_>, _>>()?;
    for request in requests.iter() {
        assert!(request.result_timeout(PATIENCE)?.is_some());
    }
    Ok(now.elapsed())
}

#[test]
fn friendly_spreads_low_priority_work() -> Result<(), E> {
    let dispatcher = Options::new()
        .permits(PERMITS as usize)
        .friendly(true)
        .dispatcher()?;
    let elapsed = run_low_priority(&dispatcher)?;
    // Each permit serves REQUESTS / PERMITS requests one after another
    let expected = Duration::from_millis(REQUESTS * MIN_DELAY_MS / PERMITS);
    assert!(elapsed >= expected, "{elapsed:?} < {expected:?}");
    Ok(())
}

#[test]
fn strategy_switch_at_runtime() -> Result<(), E> {
    let config = Config::default();
    let dispatcher = Options::new()
        .permits(PERMITS as usize)
        .config(config.clone())
        .dispatcher()?;
    assert_eq!(dispatcher.config().strategy(), HashingStrategy::Normal);
    config.set_strategy(HashingStrategy::Friendly);
    assert_eq!(dispatcher.config().strategy(), HashingStrategy::Friendly);
    let elapsed = run_low_priority(&dispatcher)?;
    let expected = Duration::from_millis(REQUESTS * MIN_DELAY_MS / PERMITS);
    assert!(elapsed >= expected, "{elapsed:?} < {expected:?}");
    Ok(())
}

#[test]
fn normal_priority_is_not_throttled() -> Result<(), E> {
    let dispatcher = Options::new().permits(1).friendly(true).dispatcher()?;
    let request = dispatcher.add_request(random_buffer(2 * 1024 * 1024), None, false)?;
    // As low priority it would hold the only permit for 250ms
    let next = dispatcher.try_submit(
        crate::Job::flat(random_buffer(1024)),
        Duration::from_millis(240),
    )?;
    assert!(request.result_timeout(PATIENCE)?.is_some());
    assert!(next.result_timeout(PATIENCE)?.is_some());
    Ok(())
}
