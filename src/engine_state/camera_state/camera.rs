//! # Camera Implementation
//!
//! - `Camera`: position and yaw/pitch orientation, producing the view matrix
//! - `Projection`: perspective settings, producing the projection matrix
//!
//! Matrices follow OpenGL clip conventions (depth in `-1..=1`), which is what
//! frustum plane extraction and unprojection expect.

use cgmath::*;
use std::f32::consts::FRAC_PI_2;

/// Safe limit for pitch to prevent gimbal lock
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// A first-person camera in 3D space.
///
/// # Fields
/// - `position`: the camera's position in world space
/// - `yaw`: horizontal rotation (around Y axis); zero looks along +X
/// - `pitch`: vertical rotation, clamped just short of straight up or down
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// The camera's position in world space
    pub position: Point3<f32>,
    /// Horizontal rotation (around Y axis) in radians
    pub yaw: Rad<f32>,
    /// Vertical rotation (around X axis) in radians
    pub pitch: Rad<f32>,
}

impl Camera {
    /// Creates a new camera with the specified position and orientation.
    ///
    /// # Example
    /// ```ignore
    /// use cgmath::{Point3, Deg};
    /// let camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    /// ```
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: clamp_pitch(pitch.into()),
        }
    }

    /// Normalized direction the camera is facing.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    /// Moves and turns the camera. Pitch is clamped.
    pub fn set_pose<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        &mut self,
        position: Point3<f32>,
        yaw: Y,
        pitch: P,
    ) {
        self.position = position;
        self.yaw = yaw.into();
        self.pitch = clamp_pitch(pitch.into());
    }

    /// Calculates the view matrix for this camera.
    ///
    /// The view matrix transforms world coordinates to view (camera) space.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }
}

fn clamp_pitch(pitch: Rad<f32>) -> Rad<f32> {
    if pitch < -Rad(SAFE_FRAC_PI_2) {
        -Rad(SAFE_FRAC_PI_2)
    } else if pitch > Rad(SAFE_FRAC_PI_2) {
        Rad(SAFE_FRAC_PI_2)
    } else {
        pitch
    }
}

/// A camera's projection matrix and related parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    /// Aspect ratio (width / height)
    aspect: f32,
    /// Vertical field of view in radians
    fovy: Rad<f32>,
    /// Near clipping plane distance
    znear: f32,
    /// Far clipping plane distance
    zfar: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels
    /// * `height` - Viewport height in pixels
    /// * `fovy` - Vertical field of view (can be any type convertible to `Rad<f32>`)
    /// * `znear` - Near clipping plane distance
    /// * `zfar` - Far clipping plane distance
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let fovy: Rad<f32> = fovy.into();
        Self {
            aspect: aspect_ratio(width, height).unwrap_or(1.0),
            fovy,
            znear,
            zfar,
        }
    }

    /// Updates the projection's aspect ratio for viewport resizing.
    ///
    /// An empty viewport (e.g. a minimized window) keeps the previous ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(aspect) = aspect_ratio(width, height) {
            self.aspect = aspect;
        }
    }

    /// Calculates the perspective projection matrix.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect_ratio(width: u32, height: u32) -> Option<f32> {
    (width > 0 && height > 0).then(|| width as f32 / height as f32)
}
