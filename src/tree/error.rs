use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum E {
    #[error("Piece size {0} should be a power of two and not less than block size")]
    InvalidPieceSize(u64),
    #[error("Piece size {0} exceeds the limit of {1} bytes")]
    PieceTooLarge(u64, u64),
    #[error("Buffer of {0} bytes doesn't fit into a tree of {1} leaves")]
    BufferTooLarge(usize, usize),
    #[error("Leaf {0} is out of range; tree has {1} leaves")]
    LeafOutOfRange(usize, usize),
}
