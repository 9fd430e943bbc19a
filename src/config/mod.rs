mod error;

use crate::hasher::{Algorithm, Backend};
pub use error::E;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

/// How hashing work competes with the rest of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HashingStrategy {
    /// Requests are hashed as fast as possible.
    #[default]
    Normal,
    /// Low-priority requests are followed by a pause proportional to their size.
    Friendly,
}

impl fmt::Display for HashingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Normal => "normal",
                Self::Friendly => "friendly",
            },
        )
    }
}

impl FromStr for HashingStrategy {
    type Err = E;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "disabled" | "0" => Ok(Self::Normal),
            "friendly" | "enabled" | "1" => Ok(Self::Friendly),
            _ => Err(E::UnknownStrategy(s.to_owned())),
        }
    }
}

/// Snapshot of configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    /// Hashing strategy; read on each completed request.
    pub strategy: HashingStrategy,
    /// Digest context implementation; read once when a dispatcher is created.
    pub backend: Backend,
    /// Flat digest family; read once when a dispatcher is created.
    pub algorithm: Algorithm,
    /// Diagnostic mode: every request resolves to an empty result without hashing. Makes any
    /// verification built on top of the dispatcher "always pass".
    pub always_pass: bool,
}

type Listener = Arc<dyn Fn(&Settings) + Send + Sync>;

struct Inner {
    settings: RwLock<Settings>,
    listeners: Mutex<Vec<Listener>>,
}

/// Process-wide configuration shared between a dispatcher and the rest of the application.
///
/// Cloning: an instance of `Config` can be cloned; clones are bound to the same settings and
/// listeners. `Config` is safe to be shared between threads.
#[derive(Clone)]
pub struct Config {
    inner: Arc<Inner>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("settings", &self.settings())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Config {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings: RwLock::new(settings),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns a copy of current settings.
    pub fn settings(&self) -> Settings {
        self.inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn strategy(&self) -> HashingStrategy {
        self.inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .strategy
    }

    pub fn always_pass(&self) -> bool {
        self.inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .always_pass
    }

    pub fn set_strategy(&self, strategy: HashingStrategy) {
        self.update(|settings| settings.strategy = strategy);
    }

    pub fn set_always_pass(&self, always_pass: bool) {
        self.update(|settings| settings.always_pass = always_pass);
    }

    /// Applies `change` to settings. Listeners are notified only if something has been changed.
    pub fn update<F: FnOnce(&mut Settings)>(&self, change: F) {
        let updated = {
            let mut settings = self
                .inner
                .settings
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let before = settings.clone();
            change(&mut *settings);
            if *settings == before {
                return;
            }
            settings.clone()
        };
        debug!("configuration has been changed: {updated:?}");
        // Listeners may change the configuration again or register other listeners
        let listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners.iter() {
            listener(&updated);
        }
    }

    /// Registers a listener called with new settings after each change.
    pub fn on_change<F: Fn(&Settings) + Send + Sync + 'static>(&self, listener: F) {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }
}
