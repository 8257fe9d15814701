#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Chunks
//!
//! The chunk side of a voxel engine: chunk storage, face-culled meshing with
//! baked ray-sampled occlusion, a bounded background rebuild pipeline, frustum
//! culling and ray picking with block deletion.
//!
//! ## Key Modules
//!
//! * `config` - Engine settings loaded from JSON
//! * `engine_state` - The world context and every system acting on it
//!
//! ## Architecture
//!
//! * Block data lives in 16³ chunks with a dense solidity bitset
//! * Meshes are built on worker threads from immutable world snapshots
//! * At most `K` chunks rebuild at once; results upload on the main thread through
//!   a `MeshSink`, the only boundary to a graphics API
//! * Chunks whose bounds leave the view frustum are dropped from the render set
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = voxel_chunks::EngineState::new(voxel_chunks::EngineConfig::default())?;
//! loop {
//!     engine.update();
//!     let batches = engine.render_batches();
//!     // hand `batches` to the renderer
//! }
//! ```

use std::time::Duration;

use log::{error, info, warn};
use web_time::Instant;

pub mod config;
pub mod engine_state;

pub use config::{ConfigError, EngineConfig};
pub use engine_state::{
    buffer_state::{BufferState, MeshSink},
    picking::PickOutcome,
    ChunkRenderBatch, EngineState,
};

/// How long the headless driver waits for rebuilds to settle.
const IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the engine headless: generates the configured world, meshes it, picks the
/// block under the centre of the screen, then reports what was uploaded.
///
/// The config comes from the file named by `VOXEL_CHUNKS_CONFIG`, falling back to
/// the defaults.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}; using default config", err);
            EngineConfig::default()
        }
    };

    let start = Instant::now();
    let mut engine = match EngineState::new(config) {
        Ok(engine) => engine,
        Err(err) => {
            error!("Cannot start engine: {}", err);
            return;
        }
    };
    info!("World generated in {:?}", start.elapsed());

    if !engine.wait_for_idle(IDLE_TIMEOUT) {
        warn!("Initial meshing did not finish within {:?}", IDLE_TIMEOUT);
    }
    info!(
        "Initial meshing done in {:?}: {} chunks visible, {} batches",
        start.elapsed(),
        engine.render_set().len(),
        engine.render_batches().len()
    );

    let viewport = engine.camera_state.viewport();
    let outcome = engine.pick(viewport.width as f32 / 2.0, viewport.height as f32 / 2.0);
    info!("Pick at screen centre: {:?}", outcome);

    if !engine.wait_for_idle(IDLE_TIMEOUT) {
        warn!("Rebuilds after the pick did not finish within {:?}", IDLE_TIMEOUT);
    }

    let sink = engine.sink();
    info!(
        "Buffers: {} live, {} bytes allocated, {} bytes used, {} writes",
        sink.len(),
        sink.get_total_allocated_memory(),
        sink.get_total_used_memory(),
        sink.get_total_writes()
    );
}
