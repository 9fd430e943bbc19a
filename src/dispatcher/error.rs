use crate::{dispatch, hasher, tree};
use std::{io, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E {
    #[error("No admission permit within {0:?}")]
    AdmissionTimeout(Duration),
    #[error("Dispatcher has been shutdown")]
    Shutdown,
    #[error("Number of admission permits should be at least 1")]
    InvalidPermitsNumber,
    #[error("Fail to get optimal threads number")]
    OptimalThreadsNumber,
    #[error("Fail to spawn scheduler thread: {0}")]
    Spawn(io::Error),
    #[error("Hashing panicked: {0}")]
    Panicked(String),
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] dispatch::E),
    #[error("Hasher error: {0}")]
    Hasher(#[from] hasher::E),
    #[error("Tree error: {0}")]
    Tree(#[from] tree::E),
}
