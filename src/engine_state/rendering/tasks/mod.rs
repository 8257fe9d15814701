//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: meshes a chunk off the main thread

pub mod chunk_mesh_generation_task;
