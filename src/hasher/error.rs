use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum E {
    #[error("Hashing not finished")]
    NotFinished,
    #[error("Hashing already finished; hasher should be reset")]
    AlreadyFinished,
}
