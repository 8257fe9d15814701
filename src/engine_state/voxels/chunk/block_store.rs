//! # Block Store
//!
//! Dense per-chunk block storage.
//!
//! ## Memory Layout
//!
//! - `solid_array`: one bit per cell, set iff the cell holds a solid block. This
//!   bitset is the only source of truth for solidity.
//! - `blocks`: one [`Block`] per cell, indexed by the same linear offset. Entries
//!   for air cells are reset to `Block::default()` and are never read.
//!
//! Both arrays use the `x + y·N + z·N²` offset from [`linear_index`].
//!
//! ### Performance Characteristics
//! - **Solidity check**: O(1) bit test
//! - **Block lookup**: O(1) array index
//! - **Iteration**: skips air a word at a time through the bitset

use bitvec::prelude::BitVec;

use crate::engine_state::voxels::{
    block::Block,
    coords::{from_linear_index, linear_index, BlockCoord, CHUNK_VOLUME},
};

use super::chunk_iteration::ChunkBlockIterator;

/// The blocks of one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockStore {
    pub(super) solid_array: BitVec,
    pub(super) blocks: Vec<Block>,
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl BlockStore {
    /// A store with every cell set to air.
    pub fn empty() -> Self {
        Self {
            solid_array: BitVec::repeat(false, CHUNK_VOLUME),
            blocks: vec![Block::default(); CHUNK_VOLUME],
        }
    }

    /// A store with every cell solid.
    pub fn solid() -> Self {
        Self {
            solid_array: BitVec::repeat(true, CHUNK_VOLUME),
            blocks: vec![Block::default(); CHUNK_VOLUME],
        }
    }

    /// Builds a store by asking `is_solid` about every local coordinate.
    pub fn from_fn<F: FnMut(BlockCoord) -> bool>(mut is_solid: F) -> Self {
        let mut store = Self::empty();
        for index in 0..CHUNK_VOLUME {
            if is_solid(from_linear_index(index)) {
                store.solid_array.set(index, true);
            }
        }
        store
    }

    /// `true` if `block` is inside the chunk and solid. Out-of-range coordinates are air.
    pub fn is_solid(&self, block: BlockCoord) -> bool {
        linear_index(block).is_some_and(|index| self.solid_array[index])
    }

    /// The attributes of a solid block, or `None` for air and out-of-range coordinates.
    pub fn get(&self, block: BlockCoord) -> Option<&Block> {
        let index = linear_index(block)?;
        if self.solid_array[index] {
            Some(&self.blocks[index])
        } else {
            None
        }
    }

    /// Mutable access to the attributes of a solid block.
    pub fn get_mut(&mut self, block: BlockCoord) -> Option<&mut Block> {
        let index = linear_index(block)?;
        if self.solid_array[index] {
            Some(&mut self.blocks[index])
        } else {
            None
        }
    }

    /// Makes `block` solid with fresh attributes. Returns `false` if it was already
    /// solid or lies outside the chunk.
    pub fn insert(&mut self, block: BlockCoord) -> bool {
        match linear_index(block) {
            Some(index) if !self.solid_array[index] => {
                self.solid_array.set(index, true);
                self.blocks[index] = Block::default();
                true
            }
            _ => false,
        }
    }

    /// Turns `block` into air. Returns `false` if there was nothing to remove.
    pub fn remove(&mut self, block: BlockCoord) -> bool {
        match linear_index(block) {
            Some(index) if self.solid_array[index] => {
                self.solid_array.set(index, false);
                self.blocks[index] = Block::default();
                true
            }
            _ => false,
        }
    }

    /// Number of solid blocks.
    pub fn len(&self) -> usize {
        self.solid_array.count_ones()
    }

    /// `true` when the chunk holds no solid block.
    pub fn is_empty(&self) -> bool {
        self.solid_array.not_any()
    }

    /// `true` when both stores have the same solid cells, ignoring attributes.
    pub fn same_solidity(&self, other: &BlockStore) -> bool {
        self.solid_array == other.solid_array
    }

    /// Iterates over every solid block with its local coordinate.
    pub fn iter(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }
}
