//! # Spatial Types
//!
//! Integer addresses for chunks and blocks, and the conversions between
//! chunk-local, world-block and world-space coordinates.

use cgmath::Point3;

/// The edge length of a chunk in blocks.
pub const CHUNK_BASE: i32 = 16;
/// The number of blocks in one chunk layer (`CHUNK_BASE²`).
pub const CHUNK_PLANE_SIZE: usize = (CHUNK_BASE * CHUNK_BASE) as usize;
/// The number of blocks in a chunk (`CHUNK_BASE³`).
pub const CHUNK_VOLUME: usize = CHUNK_PLANE_SIZE * CHUNK_BASE as usize;

/// Address of a chunk in the chunk grid. The chunk's world-space origin is
/// `coord * CHUNK_BASE`.
pub type ChunkCoord = Point3<i32>;

/// Address of a block. Inside a chunk every component lies in `0..CHUNK_BASE`;
/// the same type is used for world-block addresses.
pub type BlockCoord = Point3<i32>;

/// Returns `true` when every component of `block` lies in `0..CHUNK_BASE`.
pub fn in_chunk_bounds(block: BlockCoord) -> bool {
    (0..CHUNK_BASE).contains(&block.x)
        && (0..CHUNK_BASE).contains(&block.y)
        && (0..CHUNK_BASE).contains(&block.z)
}

/// Linear offset of a local block, `x + y·N + z·N²`.
///
/// Returns `None` for coordinates outside the chunk.
pub fn linear_index(block: BlockCoord) -> Option<usize> {
    if !in_chunk_bounds(block) {
        return None;
    }
    let (x, y, z) = (block.x as usize, block.y as usize, block.z as usize);
    Some(x + y * CHUNK_BASE as usize + z * CHUNK_PLANE_SIZE)
}

/// Inverse of [`linear_index`].
pub fn from_linear_index(index: usize) -> BlockCoord {
    let base = CHUNK_BASE as usize;
    Point3::new(
        (index % base) as i32,
        ((index / base) % base) as i32,
        (index / CHUNK_PLANE_SIZE) as i32,
    )
}

/// Splits a world-block coordinate into the chunk that owns it and the local
/// coordinate inside that chunk. Uses floor division, so negative chunk
/// coordinates resolve correctly.
pub fn split_world_block(world_block: BlockCoord) -> (ChunkCoord, BlockCoord) {
    let chunk = Point3::new(
        world_block.x.div_euclid(CHUNK_BASE),
        world_block.y.div_euclid(CHUNK_BASE),
        world_block.z.div_euclid(CHUNK_BASE),
    );
    let local = Point3::new(
        world_block.x.rem_euclid(CHUNK_BASE),
        world_block.y.rem_euclid(CHUNK_BASE),
        world_block.z.rem_euclid(CHUNK_BASE),
    );
    (chunk, local)
}

/// World-block coordinate of a local block in `chunk`.
pub fn to_world_block(chunk: ChunkCoord, local: BlockCoord) -> BlockCoord {
    Point3::new(
        chunk.x * CHUNK_BASE + local.x,
        chunk.y * CHUNK_BASE + local.y,
        chunk.z * CHUNK_BASE + local.z,
    )
}

/// World-space position of a chunk's minimum corner.
pub fn chunk_origin(chunk: ChunkCoord) -> Point3<f32> {
    Point3::new(
        (chunk.x * CHUNK_BASE) as f32,
        (chunk.y * CHUNK_BASE) as f32,
        (chunk.z * CHUNK_BASE) as f32,
    )
}

/// The world-block cell containing a world-space point.
pub fn world_block_at(point: Point3<f32>) -> BlockCoord {
    Point3::new(
        point.x.floor() as i32,
        point.y.floor() as i32,
        point.z.floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_index_walks_x_then_y_then_z() {
        assert_eq!(linear_index(Point3::new(0, 0, 0)), Some(0));
        assert_eq!(linear_index(Point3::new(1, 0, 0)), Some(1));
        assert_eq!(linear_index(Point3::new(0, 1, 0)), Some(16));
        assert_eq!(linear_index(Point3::new(0, 0, 1)), Some(256));
        assert_eq!(linear_index(Point3::new(15, 15, 15)), Some(CHUNK_VOLUME - 1));
        assert_eq!(linear_index(Point3::new(16, 0, 0)), None);
        assert_eq!(linear_index(Point3::new(0, -1, 0)), None);
    }

    #[test]
    fn linear_index_inverts() {
        for index in [0, 17, 255, 256, 1000, CHUNK_VOLUME - 1] {
            assert_eq!(linear_index(from_linear_index(index)), Some(index));
        }
    }

    #[test]
    fn split_handles_negative_coordinates() {
        let (chunk, local) = split_world_block(Point3::new(-1, 16, 33));
        assert_eq!(chunk, Point3::new(-1, 1, 2));
        assert_eq!(local, Point3::new(15, 0, 1));
        assert_eq!(to_world_block(chunk, local), Point3::new(-1, 16, 33));
    }

    #[test]
    fn world_block_uses_floor() {
        assert_eq!(world_block_at(Point3::new(-0.5, 0.5, 15.99)), Point3::new(-1, 0, 15));
    }
}
