//! # Frustum Culling
//!
//! Extracts the six clip planes of a combined projection-view matrix and
//! classifies axis-aligned cubes against them.
//!
//! Planes come straight from row combinations of the matrix and are not
//! normalised. Only the sign of a plane test is ever used, so the magnitudes do
//! not need to be comparable.

use cgmath::{Matrix, Matrix4, Point3, Vector4};

/// A half-space `a·x + b·y + c·z + d >= 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// X coefficient
    pub a: f32,
    /// Y coefficient
    pub b: f32,
    /// Z coefficient
    pub c: f32,
    /// Constant term
    pub d: f32,
}

impl Plane {
    fn from_vector(v: Vector4<f32>) -> Self {
        Self {
            a: v.x,
            b: v.y,
            c: v.z,
            d: v.w,
        }
    }

    /// Signed (unnormalised) distance of `p` from the plane.
    pub fn evaluate(&self, p: Point3<f32>) -> f32 {
        self.a * p.x + self.b * p.y + self.c * p.z + self.d
    }

    /// `true` if `p` is on the inside half-space.
    pub fn contains(&self, p: Point3<f32>) -> bool {
        self.evaluate(p) >= 0.0
    }
}

/// Result of classifying a volume against the frustum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Containment {
    /// Every corner is inside every plane.
    Inside,
    /// Straddles at least one plane.
    Partial,
    /// Entirely behind at least one plane.
    Outside,
}

/// Index of each plane in [`Frustum::planes`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrustumPlane {
    /// `row3 + row0`
    Left = 0,
    /// `row3 - row0`
    Right = 1,
    /// `row3 + row1`
    Bottom = 2,
    /// `row3 - row1`
    Top = 3,
    /// `row3 + row2`
    Near = 4,
    /// `row3 - row2`
    Far = 5,
}

/// The six clip planes of a view volume.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    /// Planes in [`FrustumPlane`] order
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the planes of a projection×view matrix (OpenGL clip conventions,
    /// column vectors).
    pub fn from_matrix(pv: &Matrix4<f32>) -> Self {
        let row0 = pv.row(0);
        let row1 = pv.row(1);
        let row2 = pv.row(2);
        let row3 = pv.row(3);

        Self {
            planes: [
                Plane::from_vector(row3 + row0),
                Plane::from_vector(row3 - row0),
                Plane::from_vector(row3 + row1),
                Plane::from_vector(row3 - row1),
                Plane::from_vector(row3 + row2),
                Plane::from_vector(row3 - row2),
            ],
        }
    }

    /// Extracts the planes of a row-major 4×4 matrix given as 16 consecutive values.
    pub fn from_row_major(values: &[f32; 16]) -> Self {
        #[rustfmt::skip]
        let pv = Matrix4::new(
            values[0], values[4], values[8], values[12],
            values[1], values[5], values[9], values[13],
            values[2], values[6], values[10], values[14],
            values[3], values[7], values[11], values[15],
        );
        Self::from_matrix(&pv)
    }

    /// The plane at `which`.
    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// `true` if `p` is inside all six planes.
    pub fn contains_point(&self, p: Point3<f32>) -> bool {
        self.planes.iter().all(|plane| plane.contains(p))
    }

    /// Classifies the cube with minimum corner `origin` and edge length `size`.
    ///
    /// A plane with no corner inside proves the cube `Outside` and ends the test.
    /// Otherwise any plane with a corner outside makes the result `Partial`.
    pub fn classify_aabb(&self, origin: Point3<f32>, size: f32) -> Containment {
        let corners = cube_corners(origin, size);
        let mut result = Containment::Inside;

        for plane in &self.planes {
            let inside = corners.iter().filter(|corner| plane.contains(**corner)).count();
            if inside == 0 {
                return Containment::Outside;
            }
            if inside < corners.len() {
                result = Containment::Partial;
            }
        }

        result
    }
}

/// The eight corners of a cube.
pub fn cube_corners(origin: Point3<f32>, size: f32) -> [Point3<f32>; 8] {
    let (x, y, z) = (origin.x, origin.y, origin.z);
    [
        Point3::new(x, y, z),
        Point3::new(x + size, y, z),
        Point3::new(x + size, y, z + size),
        Point3::new(x, y, z + size),
        Point3::new(x, y + size, z + size),
        Point3::new(x + size, y + size, z + size),
        Point3::new(x + size, y + size, z),
        Point3::new(x, y + size, z),
    ]
}
