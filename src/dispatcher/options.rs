use super::{Dispatcher, E};
use crate::{
    config::{Config, HashingStrategy},
    hasher::{Algorithm, Backend},
};
use std::mem;

/// Values which override the settings of `Config` when a dispatcher is created.
#[derive(Default, Debug, Clone)]
pub(crate) struct Overrides {
    strategy: Option<HashingStrategy>,
    backend: Option<Backend>,
    algorithm: Option<Algorithm>,
    always_pass: Option<bool>,
}

impl Overrides {
    pub fn apply(&self, config: &Config) {
        config.update(|settings| {
            if let Some(strategy) = self.strategy {
                settings.strategy = strategy;
            }
            if let Some(backend) = self.backend {
                settings.backend = backend;
            }
            if let Some(algorithm) = self.algorithm {
                settings.algorithm = algorithm;
            }
            if let Some(always_pass) = self.always_pass {
                settings.always_pass = always_pass;
            }
        });
    }
}

/// Builder of `Dispatcher`.
///
/// # Example
///
/// ```
/// use hashpool::{HashingStrategy, Options};
///
/// let dispatcher = Options::new()
///     .permits(2)
///     .workers(4)
///     .strategy(HashingStrategy::Friendly)
///     .dispatcher()
///     .unwrap();
/// assert_eq!(dispatcher.permits(), 2);
/// ```
#[derive(Default, Debug)]
pub struct Options {
    pub(crate) permits: Option<usize>,
    pub(crate) workers: Option<usize>,
    pub(crate) config: Option<Config>,
    pub(crate) settings: Overrides,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of admission permits (concurrently running hash computations). By default the
    /// number of cores + 1.
    pub fn permits(&mut self, permits: usize) -> &mut Self {
        self.permits = Some(permits);
        self
    }

    /// Number of threads in the dispatch pool. By default 64.
    pub fn workers(&mut self, workers: usize) -> &mut Self {
        self.workers = Some(workers);
        self
    }

    /// Shares an existing configuration with the dispatcher. Changes made through any clone of
    /// `config` are seen by the dispatcher.
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = Some(config);
        self
    }

    pub fn strategy(&mut self, strategy: HashingStrategy) -> &mut Self {
        self.settings.strategy = Some(strategy);
        self
    }

    /// Shortcut for `strategy(HashingStrategy::Friendly)` / `strategy(HashingStrategy::Normal)`.
    pub fn friendly(&mut self, friendly: bool) -> &mut Self {
        self.strategy(if friendly {
            HashingStrategy::Friendly
        } else {
            HashingStrategy::Normal
        })
    }

    pub fn backend(&mut self, backend: Backend) -> &mut Self {
        self.settings.backend = Some(backend);
        self
    }

    pub fn algorithm(&mut self, algorithm: Algorithm) -> &mut Self {
        self.settings.algorithm = Some(algorithm);
        self
    }

    pub fn always_pass(&mut self, always_pass: bool) -> &mut Self {
        self.settings.always_pass = Some(always_pass);
        self
    }

    /// Creates a `Dispatcher`. The builder is reset to defaults afterwards.
    pub fn dispatcher(&mut self) -> Result<Dispatcher, E> {
        Dispatcher::new(Options {
            permits: self.permits.take(),
            workers: self.workers.take(),
            config: self.config.take(),
            settings: mem::take(&mut self.settings),
        })
    }
}
