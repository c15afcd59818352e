//! A position on one face plane, in heightmap texels.

use crate::CubeFace;

/// Face-local 2D coordinates. `x` and `y` are texels in `[0, W]` for points
/// on the face; points beyond an edge are valid on the extended plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacePoint {
    pub face: CubeFace,
    pub x: f64,
    pub y: f64,
}

impl FacePoint {
    #[must_use]
    pub fn new(face: CubeFace, x: f64, y: f64) -> Self {
        Self { face, x, y }
    }

    /// Squared distance on the plane. Only meaningful for points on the same face.
    #[must_use]
    pub fn distance_squared(&self, other: &FacePoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}
