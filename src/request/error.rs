use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E {
    #[error("Request #{0} hasn't been resolved within {1:?}")]
    Timeout(u64, Duration),
}
