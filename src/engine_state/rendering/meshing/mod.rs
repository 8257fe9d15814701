//! Mesh generation for voxel chunks.
//!
//! This module turns a chunk's block store into per-direction quad geometry by
//! face culling: a face is emitted only when the cell on the other side is not
//! solid, looking into the neighbouring chunk when that cell lies outside the
//! chunk. Faces between two solid blocks never reach the GPU.
//!
//! # Architecture
//! - `MeshBuilder`: walks one chunk and its six neighbours and emits a [`Mesh`]
//! - `ChunkMeshOutput`: the mesh, the block store with refreshed visibility and
//!   occlusion, and diagnostic counts
//! - `mesh/`: the mesh data structures
//!
//! # Performance Considerations
//! - Pure CPU work with no graphics calls, so it runs on background workers
//! - Solidity checks are single bit tests
//! - Occlusion sampling dominates the cost and only runs for exposed faces

use log::debug;

mod mesh;

pub use mesh::*;

use crate::engine_state::voxels::{
    block::block_side::BlockSide,
    chunk::block_store::BlockStore,
    coords::{in_chunk_bounds, BlockCoord, ChunkCoord, CHUNK_BASE},
    occlusion::OcclusionSampler,
    world::WorldSnapshot,
};

/// Labels of the vertex buffers for each block side, in `BlockSide` order.
pub const VERTEX_BUFFER_LABELS: [&str; 6] = [
    "Vertex Buffer Front",
    "Vertex Buffer Back",
    "Vertex Buffer Left",
    "Vertex Buffer Right",
    "Vertex Buffer Top",
    "Vertex Buffer Bottom",
];

/// Labels of the index buffers for each block side, in `BlockSide` order.
pub const INDEX_BUFFER_LABELS: [&str; 6] = [
    "Index Buffer Front",
    "Index Buffer Back",
    "Index Buffer Left",
    "Index Buffer Right",
    "Index Buffer Top",
    "Index Buffer Bottom",
];

/// Labels of the occlusion buffers for each block side, in `BlockSide` order.
pub const OCCLUSION_BUFFER_LABELS: [&str; 6] = [
    "Occlusion Buffer Front",
    "Occlusion Buffer Back",
    "Occlusion Buffer Left",
    "Occlusion Buffer Right",
    "Occlusion Buffer Top",
    "Occlusion Buffer Bottom",
];

/// Diagnostic counts of one mesh build.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Solid blocks in the chunk
    pub solid_blocks: usize,
    /// Quads emitted
    pub faces: usize,
    /// Triangles a mesh without culling would need (`solid_blocks * 12`)
    pub worst_case_triangles: usize,
}

impl MeshStats {
    /// Triangles emitted.
    pub fn triangles(&self) -> usize {
        self.faces * 2
    }

    /// Triangles culling saved against the worst case.
    pub fn saved_triangles(&self) -> usize {
        self.worst_case_triangles.saturating_sub(self.triangles())
    }
}

/// Everything a mesh build produces.
#[derive(Debug, Clone)]
pub struct ChunkMeshOutput {
    /// Chunk the mesh belongs to
    pub position: ChunkCoord,
    /// Six-sided geometry in chunk-local coordinates
    pub mesh: Mesh,
    /// Copy of the input store with `visible` and `occlusion` refreshed
    pub blocks: BlockStore,
    /// Diagnostic counts
    pub stats: MeshStats,
}

/// Builds the face-culled mesh of one chunk.
pub struct MeshBuilder<'a> {
    position: ChunkCoord,
    blocks: &'a BlockStore,
    neighbors: [Option<&'a BlockStore>; 6],
}

impl<'a> MeshBuilder<'a> {
    /// Creates a builder for a chunk and its neighbours (in `BlockSide` order,
    /// `None` meaning open air).
    pub fn new(
        position: ChunkCoord,
        blocks: &'a BlockStore,
        neighbors: [Option<&'a BlockStore>; 6],
    ) -> Self {
        Self {
            position,
            blocks,
            neighbors,
        }
    }

    /// Creates a builder reading the chunk and its neighbours out of a snapshot.
    /// Returns `None` if the snapshot does not contain `position`.
    pub fn from_snapshot(snapshot: &'a WorldSnapshot, position: ChunkCoord) -> Option<Self> {
        Some(Self::new(
            position,
            snapshot.store(position)?,
            snapshot.neighbor_stores(position),
        ))
    }

    /// `true` if the face of `block` on `side` borders a non-solid cell.
    pub fn is_exposed(&self, block: BlockCoord, side: BlockSide) -> bool {
        let adjacent = block + side.offset();
        if in_chunk_bounds(adjacent) {
            return !self.blocks.is_solid(adjacent);
        }

        match self.neighbors[side.index()] {
            None => true,
            Some(neighbor) => {
                let wrapped = BlockCoord::new(
                    adjacent.x.rem_euclid(CHUNK_BASE),
                    adjacent.y.rem_euclid(CHUNK_BASE),
                    adjacent.z.rem_euclid(CHUNK_BASE),
                );
                !neighbor.is_solid(wrapped)
            }
        }
    }

    /// Builds the mesh with the occlusion values already stored on the blocks.
    pub fn build(&self) -> ChunkMeshOutput {
        self.build_inner(None)
    }

    /// Builds the mesh, sampling fresh occlusion for every exposed face first.
    pub fn build_with_occlusion(
        &self,
        sampler: &OcclusionSampler,
        snapshot: &WorldSnapshot,
    ) -> ChunkMeshOutput {
        self.build_inner(Some((sampler, snapshot)))
    }

    fn build_inner(
        &self,
        occlusion: Option<(&OcclusionSampler, &WorldSnapshot)>,
    ) -> ChunkMeshOutput {
        let mut mesh = Mesh::new();
        let mut blocks = self.blocks.clone();
        let mut stats = MeshStats {
            solid_blocks: self.blocks.len(),
            faces: 0,
            worst_case_triangles: self.blocks.len() * 12,
        };

        for (position, _) in self.blocks.iter() {
            let Some(block) = blocks.get_mut(position) else {
                continue;
            };
            block.visible = false;

            for side in BlockSide::all() {
                if !self.is_exposed(position, side) {
                    continue;
                }
                block.visible = true;

                if let Some((sampler, snapshot)) = occlusion {
                    block.occlusion[side.index()] =
                        sampler.sample_face(snapshot, self.position, position, side);
                }

                mesh.push_face(&Face::new(position, side), block.occlusion_for(side));
                stats.faces += 1;
            }
        }

        let vertices: usize = mesh.vertex_lens().iter().sum();
        let indices: usize = mesh.index_lens().iter().sum();
        debug!(
            "Chunk {:?}: {} vertices, {} indices, {} faces vs {} worst-case triangles, saved {}",
            self.position,
            vertices,
            indices,
            stats.faces,
            stats.worst_case_triangles,
            stats.saved_triangles()
        );

        ChunkMeshOutput {
            position: self.position,
            mesh,
            blocks,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        chunk::chunk_creation::{BlockPredicate, ChunkShape},
        world::World,
    };
    use cgmath::Point3;

    fn lone_chunk(store: &BlockStore) -> MeshBuilder<'_> {
        MeshBuilder::new(Point3::new(0, 0, 0), store, [None; 6])
    }

    #[test]
    fn solid_cube_emits_only_its_shell() {
        let store = BlockStore::solid();
        let output = lone_chunk(&store).build();

        assert_eq!(output.mesh.face_count(), 1536);
        assert_eq!(output.mesh.triangle_count(), 3072);
        for side in BlockSide::all() {
            let mesh_side = output.mesh.side(side);
            assert_eq!(mesh_side.face_count(), 256);
            assert_eq!(mesh_side.vertices.len(), 1024);
            assert_eq!(mesh_side.indices.len(), 1536);
            assert_eq!(mesh_side.occlusion.len(), 1024);
        }
        assert_eq!(output.stats.saved_triangles(), 4096 * 12 - 3072);
    }

    #[test]
    fn adjacent_solid_chunks_hide_the_shared_boundary() {
        let world = World::generate_with(
            [Point3::new(0, 0, 0), Point3::new(1, 0, 0)],
            &ChunkShape::Cube,
        );
        let snapshot = world.snapshot();

        let left = MeshBuilder::from_snapshot(&snapshot, Point3::new(0, 0, 0)).unwrap().build();
        let right = MeshBuilder::from_snapshot(&snapshot, Point3::new(1, 0, 0)).unwrap().build();

        assert!(left.mesh.side(BlockSide::RIGHT).is_empty());
        assert!(right.mesh.side(BlockSide::LEFT).is_empty());
        assert_eq!(left.mesh.side(BlockSide::LEFT).face_count(), 256);
        assert_eq!(right.mesh.side(BlockSide::RIGHT).face_count(), 256);
        assert_eq!(left.mesh.face_count(), 1280);
    }

    #[test]
    fn isolated_blocks_reach_the_worst_case() {
        let store = BlockStore::from_fn(|b| b.x % 2 == 0 && b.y % 2 == 0 && b.z % 2 == 0);
        let output = lone_chunk(&store).build();
        assert_eq!(output.mesh.triangle_count(), store.len() * 12);
        assert_eq!(output.stats.saved_triangles(), 0);
    }

    #[test]
    fn faces_between_solid_blocks_are_never_emitted() {
        let world = World::generate_with(
            [Point3::new(0, 0, 0), Point3::new(0, 1, 0), Point3::new(0, 0, 1)],
            &ChunkShape::Sphere,
        );
        let snapshot = world.snapshot();
        for chunk in world.chunks() {
            let builder = MeshBuilder::from_snapshot(&snapshot, chunk.position).unwrap();
            let output = builder.build();
            assert!(output.mesh.triangle_count() <= output.stats.solid_blocks * 12);

            for side in BlockSide::all() {
                for quad in output.mesh.side(side).vertices.chunks(4) {
                    // The block owning the face is the cell the quad's centre sits on,
                    // pushed half a block inwards.
                    let centre = quad.iter().fold([0.0f32; 3], |acc, v| {
                        [
                            acc[0] + v.position[0] / 4.0,
                            acc[1] + v.position[1] / 4.0,
                            acc[2] + v.position[2] / 4.0,
                        ]
                    });
                    let n = side.normal();
                    let owner = BlockCoord::new(
                        (centre[0] - n.x * 0.5).floor() as i32,
                        (centre[1] - n.y * 0.5).floor() as i32,
                        (centre[2] - n.z * 0.5).floor() as i32,
                    );
                    let beyond = crate::engine_state::voxels::coords::to_world_block(
                        chunk.position,
                        owner + side.offset(),
                    );
                    assert!(chunk.blocks().is_solid(owner));
                    assert!(!world.is_solid_world_block(beyond));
                }
            }
        }
    }

    #[test]
    fn meshing_is_idempotent() {
        let world = World::generate_with(
            [Point3::new(0, 0, 0), Point3::new(1, 0, 0)],
            &ChunkShape::Pyramid,
        );
        let snapshot = world.snapshot();
        let sampler = OcclusionSampler::default();
        let builder = MeshBuilder::from_snapshot(&snapshot, Point3::new(0, 0, 0)).unwrap();

        let first = builder.build_with_occlusion(&sampler, &snapshot);
        let second = builder.build_with_occlusion(&sampler, &snapshot);
        assert_eq!(first.mesh.vertex_lens(), second.mesh.vertex_lens());
        assert_eq!(first.mesh.index_lens(), second.mesh.index_lens());
        assert_eq!(first.mesh, second.mesh);
        assert_eq!(first.blocks, second.blocks);
    }

    #[test]
    fn visibility_marks_only_exposed_blocks() {
        let store = BlockStore::solid();
        let output = lone_chunk(&store).build();
        assert!(output.blocks.get(Point3::new(0, 0, 0)).unwrap().visible);
        assert!(output.blocks.get(Point3::new(15, 7, 7)).unwrap().visible);
        assert!(!output.blocks.get(Point3::new(7, 7, 7)).unwrap().visible);
        assert_eq!(output.blocks.iter().filter(|(_, b)| b.visible).count(), 4096 - 14 * 14 * 14);
    }

    #[test]
    fn sampled_occlusion_is_baked_into_vertices() {
        let store = ChunkShape::Pyramid.generate(Point3::new(0, 0, 0));
        let world = World::generate_with([Point3::new(0, 0, 0)], &ChunkShape::Pyramid);
        let snapshot = world.snapshot();
        let output = MeshBuilder::new(Point3::new(0, 0, 0), &store, [None; 6])
            .build_with_occlusion(&OcclusionSampler::default(), &snapshot);

        let top = output.mesh.side(BlockSide::TOP);
        assert!(!top.is_empty());
        assert!(top.occlusion.iter().all(|v| (0.0..=1.0).contains(v)));
        // The apex looks straight up into open sky.
        let apex = output.blocks.get(Point3::new(7, 7, 7)).unwrap();
        assert!((apex.occlusion_for(BlockSide::TOP) - 1.0).abs() < 1e-6);
    }
}
