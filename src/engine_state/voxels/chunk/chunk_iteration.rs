//! # Chunk Iteration Module
//!
//! This module provides an iterator over the solid blocks of a [`BlockStore`].
//! It walks the solidity bitset and jumps straight to the next set bit, so long
//! runs of air cost one word scan instead of one step per cell.

use crate::engine_state::voxels::{
    block::Block,
    coords::{from_linear_index, BlockCoord},
};

use super::block_store::BlockStore;

/// An iterator over all solid blocks in a chunk, in linear-offset order.
pub struct ChunkBlockIterator<'a> {
    /// The store being iterated over
    store: &'a BlockStore,
    /// Next linear offset to examine
    next_offset: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates an iterator positioned before the first solid block of `store`.
    pub fn new(store: &'a BlockStore) -> Self {
        ChunkBlockIterator {
            store,
            next_offset: 0,
        }
    }
}

impl<'a> Iterator for ChunkBlockIterator<'a> {
    type Item = (BlockCoord, &'a Block);

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.store.solid_array.get(self.next_offset..)?;
        let offset = self.next_offset + remaining.first_one()?;
        self.next_offset = offset + 1;
        Some((from_linear_index(offset), &self.store.blocks[offset]))
    }
}
