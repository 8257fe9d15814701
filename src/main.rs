//! # Voxel Chunks Entry Point
//!
//! Runs the headless engine driver in the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug VOXEL_CHUNKS_CONFIG=config.json cargo run --release
//! ```

fn main() {
    voxel_chunks::run();
}
