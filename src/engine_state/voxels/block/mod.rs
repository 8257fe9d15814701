//! # Block Module
//!
//! A block is a unit cube that is either solid or air. Solidity lives in the
//! owning chunk's bitset; this module holds the attributes a solid block carries.

pub mod block_side;

use block_side::BlockSide;

/// The attributes of a single solid block.
///
/// Air cells keep a default `Block` in the dense store; its values are
/// meaningless until the cell becomes solid.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Block {
    /// `true` iff at least one face was exposed the last time the chunk was meshed.
    pub visible: bool,
    /// Ambient-occlusion factor per face direction, indexed by [`BlockSide`].
    /// Range `[0, 1]`, `0` until sampled.
    pub occlusion: [f32; 6],
}

impl Block {
    /// Occlusion value stored for `side`.
    pub fn occlusion_for(&self, side: BlockSide) -> f32 {
        self.occlusion[side.index()]
    }
}
