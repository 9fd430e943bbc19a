mod error;

use crate::hasher::sha256::{Sha256, DIGEST_SIZE};
pub use error::E;

/// Size of a block covered by one leaf.
pub const BLOCK_SIZE: usize = 16 * 1024;

/// Digest of a tree leaf or node.
pub type Node = [u8; DIGEST_SIZE];

/// Largest accepted piece size (65 536 leaves).
pub const MAX_PIECE_SIZE: u64 = 1 << 30;

/// Digest used for leaves which are not backed by data.
pub const ZERO: Node = [0u8; DIGEST_SIZE];

/// Number of leaves a piece tree must have.
///
/// - If the file is smaller than one piece: `max(1, next_power_of_two(file_size) / BLOCK_SIZE)`.
/// - Otherwise: `piece_size / BLOCK_SIZE`.
///
/// # Errors
///
/// - `E::InvalidPieceSize` if `piece_size` isn't a power of two multiple of `BLOCK_SIZE`.
/// - `E::PieceTooLarge` if `piece_size` is above `MAX_PIECE_SIZE`.
pub fn leaf_count(piece_size: u64, file_size: u64) -> Result<usize, E> {
    let block = BLOCK_SIZE as u64;
    if piece_size < block || !piece_size.is_power_of_two() {
        return Err(E::InvalidPieceSize(piece_size));
    }
    if piece_size > MAX_PIECE_SIZE {
        return Err(E::PieceTooLarge(piece_size, MAX_PIECE_SIZE));
    }
    let leaves = if file_size < piece_size {
        (file_size.next_power_of_two() / block).max(1)
    } else {
        piece_size / block
    };
    Ok(leaves as usize)
}

/// Merkle tree built over `BLOCK_SIZE` blocks of a buffer.
///
/// `levels()[0]` holds the leaves, the last level holds the root alone. Every level except the
/// root has an even number of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    levels: Vec<Vec<Node>>,
}

impl Tree {
    /// Builds a tree of `data` for a piece of a file with given geometry.
    ///
    /// Missing leaves (the buffer is shorter than `leaf_count * BLOCK_SIZE`) are padded with
    /// `ZERO` digests. The last block may be shorter than `BLOCK_SIZE`; it's hashed as is.
    ///
    /// # Errors
    ///
    /// - `E::InvalidPieceSize` if the piece size is invalid.
    /// - `E::BufferTooLarge` if the buffer has more blocks than the tree has leaves.
    pub fn build(
        hasher: &mut Sha256,
        data: &[u8],
        piece_size: u64,
        file_size: u64,
    ) -> Result<Self, E> {
        let count = leaf_count(piece_size, file_size)?;
        let blocks = data.len().div_ceil(BLOCK_SIZE);
        if blocks > count {
            return Err(E::BufferTooLarge(data.len(), count));
        }
        let mut leaves: Vec<Node> = Vec::with_capacity(count);
        for block in data.chunks(BLOCK_SIZE) {
            leaves.push(hasher.leaf(block));
        }
        leaves.resize(count, ZERO);
        Ok(Self::from_leaves(hasher, leaves))
    }

    /// Reduces given leaves up to the root. The number of leaves must be a power of two.
    pub(crate) fn from_leaves(hasher: &mut Sha256, leaves: Vec<Node>) -> Self {
        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let parent = level
                .chunks_exact(2)
                .map(|pair| hasher.node(&pair[0], &pair[1]))
                .collect::<Vec<Node>>();
            levels.push(parent);
        }
        Self { levels }
    }

    /// Tree with a single zero root. Returned in diagnostic always-pass mode.
    pub fn zero() -> Self {
        Self {
            levels: vec![vec![ZERO]],
        }
    }

    pub fn root(&self) -> &Node {
        match self.levels.last().and_then(|level| level.first()) {
            Some(root) => root,
            None => unreachable!("Tree always has a root"),
        }
    }

    pub fn leaves(&self) -> &[Node] {
        &self.levels[0]
    }

    pub fn levels(&self) -> &[Vec<Node>] {
        &self.levels
    }

    /// Height of tree; equal to `log2(leaves count)`.
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    /// Returns the uncle hashes needed to prove that leaf `index` belongs to this tree, ordered
    /// from the leaf level up to the level right below the root.
    pub fn proof(&self, index: usize) -> Result<Vec<Node>, E> {
        if index >= self.leaves().len() {
            return Err(E::LeafOutOfRange(index, self.leaves().len()));
        }
        let mut position = index;
        let mut uncles = Vec::with_capacity(self.height());
        for level in &self.levels[..self.height()] {
            uncles.push(level[position ^ 1]);
            position >>= 1;
        }
        Ok(uncles)
    }
}

/// Checks that `leaf` at position `index` leads to `root` through `proof`.
pub fn verify(hasher: &mut Sha256, root: &Node, leaf: &Node, index: usize, proof: &[Node]) -> bool {
    if proof.len() >= usize::BITS as usize || index >> proof.len() != 0 {
        return false;
    }
    let mut position = index;
    let mut current = *leaf;
    for uncle in proof {
        current = if position & 1 == 0 {
            hasher.node(&current, uncle)
        } else {
            hasher.node(uncle, &current)
        };
        position >>= 1;
    }
    &current == root
}
