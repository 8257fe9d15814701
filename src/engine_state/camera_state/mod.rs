//! # Camera State Management
//!
//! Holds the camera pose, the projection and the derived matrices, and turns
//! screen pixels back into world space for picking.
//!
//! ## Core Components
//! - `Camera`: position and orientation in 3D space
//! - `Projection`: perspective projection settings
//! - `CameraState`: both of the above plus the viewport and cached view,
//!   projection and projection×view matrices
//!
//! Unprojection fails with a [`CameraError`] when the matrices cannot be inverted.
//! Callers treat that as "no selection", never as a crash.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector4};
use thiserror::Error;

use crate::config::CameraConfig;

use super::picking::Ray;

pub mod camera;

use camera::{Camera, Projection};

/// Failures of screen-space unprojection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The projection×view matrix has no inverse.
    #[error("projection-view matrix is not invertible")]
    NonInvertibleMatrix,
    /// The unprojected near and far points coincide or lie at infinity.
    #[error("unprojected ray has no direction")]
    DegenerateRay,
    /// The viewport has zero width or height.
    #[error("viewport {width}x{height} is empty")]
    EmptyViewport {
        /// Viewport width in pixels
        width: u32,
        /// Viewport height in pixels
        height: u32,
    },
}

/// Size of the render target in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Camera pose, projection and the matrices derived from them.
#[derive(Clone, Debug)]
pub struct CameraState {
    camera: Camera,
    projection: Projection,
    viewport: Viewport,
    view: Matrix4<f32>,
    proj: Matrix4<f32>,
    pv: Matrix4<f32>,
}

impl CameraState {
    /// Creates a camera state and computes its matrices.
    pub fn new(camera: Camera, projection: Projection, viewport: Viewport) -> Self {
        let mut state = Self {
            camera,
            projection,
            viewport,
            view: Matrix4::identity(),
            proj: Matrix4::identity(),
            pv: Matrix4::identity(),
        };
        state.update_matrices();
        state
    }

    /// Builds the camera described by `config`.
    pub fn from_config(config: &CameraConfig) -> Self {
        let [width, height] = config.viewport;
        let [x, y, z] = config.position;
        Self::new(
            Camera::new(Point3::new(x, y, z), Deg(config.yaw_degrees), Deg(config.pitch_degrees)),
            Projection::new(width, height, Deg(config.fovy_degrees), config.znear, config.zfar),
            Viewport { width, height },
        )
    }

    fn update_matrices(&mut self) {
        self.view = self.camera.calc_matrix();
        self.proj = self.projection.calc_matrix();
        self.pv = self.proj * self.view;
    }

    /// The current camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// View matrix.
    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    /// Projection matrix.
    pub fn projection(&self) -> Matrix4<f32> {
        self.proj
    }

    /// Combined projection×view matrix.
    pub fn pv(&self) -> Matrix4<f32> {
        self.pv
    }

    /// Moves and turns the camera.
    pub fn set_pose(&mut self, position: Point3<f32>, yaw: Deg<f32>, pitch: Deg<f32>) {
        self.camera.set_pose(position, yaw, pitch);
        self.update_matrices();
    }

    /// Resizes the viewport and the projection's aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport { width, height };
        self.projection.resize(width, height);
        self.update_matrices();
    }

    /// Maps a pixel at `depth` (0 = near plane, 1 = far plane) to world space.
    pub fn unproject(
        &self,
        pixel_x: f32,
        pixel_y: f32,
        depth: f32,
    ) -> Result<Point3<f32>, CameraError> {
        unproject(&self.pv, self.viewport, pixel_x, pixel_y, depth)
    }

    /// The world-space ray through a pixel, starting at the camera.
    pub fn picking_ray(&self, pixel_x: f32, pixel_y: f32) -> Result<Ray, CameraError> {
        let near = self.unproject(pixel_x, pixel_y, 0.0)?;
        let far = self.unproject(pixel_x, pixel_y, 1.0)?;
        let direction = far - near;
        if !direction.magnitude2().is_normal() {
            return Err(CameraError::DegenerateRay);
        }
        Ok(Ray::new(self.camera.position, direction.normalize()))
    }
}

/// Maps a pixel at `depth` in `0..=1` back through `pv` into world space.
///
/// Pixel `(0, 0)` is the top-left corner of the viewport.
pub fn unproject(
    pv: &Matrix4<f32>,
    viewport: Viewport,
    pixel_x: f32,
    pixel_y: f32,
    depth: f32,
) -> Result<Point3<f32>, CameraError> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(CameraError::EmptyViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    let inverse = pv.invert().ok_or(CameraError::NonInvertibleMatrix)?;

    let ndc = Vector4::new(
        2.0 * pixel_x / viewport.width as f32 - 1.0,
        1.0 - 2.0 * pixel_y / viewport.height as f32,
        2.0 * depth - 1.0,
        1.0,
    );
    let world = inverse * ndc;
    if world.w.abs() <= f32::EPSILON || !world.w.is_finite() {
        return Err(CameraError::DegenerateRay);
    }
    Ok(Point3::new(world.x / world.w, world.y / world.w, world.z / world.w))
}
