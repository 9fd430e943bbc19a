use thiserror::Error;

#[derive(Error, Debug)]
pub enum E {
    #[error("Unknown hashing strategy: {0}")]
    UnknownStrategy(String),
}
