#![doc = include_str!("../README.md")]

pub mod config;
pub mod dispatch;
pub mod dispatcher;
mod error;
pub mod hasher;
pub mod pool;
pub mod request;
pub mod semaphore;
#[cfg(test)]
pub(crate) mod test;
pub mod throttle;
pub mod tree;

pub use config::{Config, HashingStrategy, Settings};
pub use dispatcher::{Dispatcher, Options, Stats};
pub use error::E;
pub use hasher::{Algorithm, Backend, Hasher};
pub use request::{Buffer, Digest, Job, Listener, Mode, Request, Status};
pub use tree::Tree;
