//! Engine configuration.
//!
//! Every field has a default, so a config file only needs to name what it changes:
//!
//! ```text
//! { "world_size": 2, "generation": "perlin", "occlusion": { "num_rays": 32 } }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine_state::{
    rebuild_scheduler::DEFAULT_MAX_CONCURRENT_REBUILDS,
    voxels::{
        chunk::chunk_creation::GenerationMethod,
        occlusion::{DEFAULT_NUM_RAYS, DEFAULT_RAY_STEP},
    },
};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "VOXEL_CHUNKS_CONFIG";

/// Errors loading or validating an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid config JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Occlusion sampling settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcclusionConfig {
    /// Sample occlusion during rebuilds
    pub enabled: bool,
    /// Rays cast over the full sphere per face
    pub num_rays: usize,
    /// March step along each ray
    pub step: f32,
}

impl Default for OcclusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_rays: DEFAULT_NUM_RAYS,
            step: DEFAULT_RAY_STEP,
        }
    }
}

/// Ray picking march settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Step of the chunk-level march
    pub chunk_step: f32,
    /// Length of the chunk-level march
    pub chunk_max_depth: f32,
    /// Step of the block-level march
    pub block_step: f32,
    /// Length of the block-level march past its start
    pub block_max_depth: f32,
    /// Flag the chunk holding a picked block for debug shading
    pub highlight_chunks: bool,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            chunk_step: 0.5,
            chunk_max_depth: 256.0,
            block_step: 0.05,
            block_max_depth: 32.0,
            highlight_chunks: false,
        }
    }
}

/// Initial camera and viewport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// World-space position
    pub position: [f32; 3],
    /// Yaw in degrees; zero looks along +X
    pub yaw_degrees: f32,
    /// Pitch in degrees
    pub pitch_degrees: f32,
    /// Vertical field of view in degrees
    pub fovy_degrees: f32,
    /// Near plane distance
    pub znear: f32,
    /// Far plane distance
    pub zfar: f32,
    /// Width and height in pixels
    pub viewport: [u32; 2],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [-48.0, 32.0, -48.0],
            yaw_degrees: 45.0,
            pitch_degrees: -20.0,
            fovy_degrees: 53.13,
            znear: 1.0,
            zfar: 1000.0,
            viewport: [640, 480],
        }
    }
}

/// Top-level engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunks per axis; the world spans chunk coordinates `0..world_size`
    pub world_size: i32,
    /// How chunks are filled
    pub generation: GenerationMethod,
    /// Seed for random shapes and noise
    pub seed: u64,
    /// Bound on concurrent mesh rebuilds, also the worker count
    pub max_concurrent_rebuilds: usize,
    /// Occlusion sampling
    pub occlusion: OcclusionConfig,
    /// Ray picking
    pub picking: PickingConfig,
    /// Camera
    pub camera: CameraConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            world_size: 4,
            generation: GenerationMethod::Random,
            seed: 0,
            max_concurrent_rebuilds: DEFAULT_MAX_CONCURRENT_REBUILDS,
            occlusion: OcclusionConfig::default(),
            picking: PickingConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.world_size < 1 {
            return invalid(format!("world_size must be at least 1, got {}", self.world_size));
        }
        if self.max_concurrent_rebuilds < 1 {
            return invalid("max_concurrent_rebuilds must be at least 1".to_string());
        }
        if self.occlusion.num_rays < 2 {
            return invalid(format!(
                "occlusion.num_rays must be at least 2, got {}",
                self.occlusion.num_rays
            ));
        }
        let positive = [
            ("occlusion.step", self.occlusion.step),
            ("picking.chunk_step", self.picking.chunk_step),
            ("picking.chunk_max_depth", self.picking.chunk_max_depth),
            ("picking.block_step", self.picking.block_step),
            ("picking.block_max_depth", self.picking.block_max_depth),
            ("camera.znear", self.camera.znear),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return invalid(format!("{name} must be positive, got {value}"));
            }
        }
        if !(self.camera.fovy_degrees > 0.0 && self.camera.fovy_degrees < 180.0) {
            return invalid(format!(
                "camera.fovy_degrees must be between 0 and 180, got {}",
                self.camera.fovy_degrees
            ));
        }
        if !(self.camera.zfar > self.camera.znear) {
            return invalid(format!(
                "camera.zfar ({}) must be greater than camera.znear ({})",
                self.camera.zfar, self.camera.znear
            ));
        }
        if self.camera.viewport.contains(&0) {
            return invalid(format!(
                "camera.viewport must be non-empty, got {:?}",
                self.camera.viewport
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrent_rebuilds, 2);
        assert_eq!(config.occlusion.num_rays, 16);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "world_size": 2,
            "generation": "wire_cube",
            "picking": { "block_step": 0.1 }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.world_size, 2);
        assert_eq!(config.generation, GenerationMethod::WireCube);
        assert_eq!(config.picking.block_step, 0.1);
        assert_eq!(config.picking.chunk_step, 0.5);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for json in [
            r#"{ "world_size": 0 }"#,
            r#"{ "max_concurrent_rebuilds": 0 }"#,
            r#"{ "occlusion": { "num_rays": 1 } }"#,
            r#"{ "picking": { "chunk_step": 0.0 } }"#,
            r#"{ "camera": { "znear": 10.0, "zfar": 5.0 } }"#,
            r#"{ "camera": { "viewport": [0, 480] } }"#,
            r#"{ "camera": { "fovy_degrees": 180.0 } }"#,
        ] {
            assert!(
                matches!(EngineConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "{json} should be invalid"
            );
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(EngineConfig::from_json("{ world_size: "), Err(ConfigError::Parse(_))));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "generation": "teapot" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::load("/nonexistent/voxel-chunks.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/voxel-chunks.json"));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = EngineConfig {
            seed: 7,
            generation: GenerationMethod::Perlin,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
