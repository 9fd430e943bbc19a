use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E {
    #[error("Dispatch pool is closed")]
    Closed,
    #[error("Dispatch pool requires at least one worker")]
    InvalidWorkersNumber,
    #[error("Fail to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}
