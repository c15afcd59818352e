//! Fixed frames placing each flat face plane on its cube face.

use glam::{DMat3, DVec3};

use crate::CubeFace;

/// Orientation of one face plane.
///
/// Face-local space has `x` and `z` spanning the plane and `y` pointing up,
/// away from the planet center. The anchor maps local vectors to world
/// vectors and back. Anchors are built once and never change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceAnchor {
    face: CubeFace,
    to_world: DMat3,
    to_local: DMat3,
}

impl FaceAnchor {
    #[must_use]
    pub fn new(face: CubeFace) -> Self {
        let to_world = DMat3::from_cols(face.tangent(), face.normal(), face.bitangent());
        Self {
            face,
            to_world,
            // Orthonormal columns, so the transpose is the inverse.
            to_local: to_world.transpose(),
        }
    }

    /// The six anchors in face index order.
    #[must_use]
    pub fn all() -> [FaceAnchor; 6] {
        CubeFace::ALL.map(FaceAnchor::new)
    }

    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// World-space direction of the local `y` axis.
    #[must_use]
    pub fn up_axis(&self) -> DVec3 {
        self.face.normal()
    }

    #[must_use]
    pub fn is_back(&self) -> bool {
        self.face.is_back()
    }

    #[must_use]
    pub fn local_to_world(&self, local: DVec3) -> DVec3 {
        self.to_world * local
    }

    #[must_use]
    pub fn world_to_local(&self, world: DVec3) -> DVec3 {
        self.to_local * world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_local_up_maps_to_face_normal() {
        for anchor in FaceAnchor::all() {
            let up = anchor.local_to_world(DVec3::Y);
            assert!(
                (up - anchor.up_axis()).length() < EPSILON,
                "{:?}: local up maps to {up:?}",
                anchor.face()
            );
        }
    }

    #[test]
    fn test_world_to_local_inverts_local_to_world() {
        let v = DVec3::new(0.3, -1.7, 2.5);
        for anchor in FaceAnchor::all() {
            let back = anchor.world_to_local(anchor.local_to_world(v));
            assert!((back - v).length() < EPSILON, "{:?}", anchor.face());
        }
    }

    #[test]
    fn test_local_axes_follow_face_basis() {
        let anchor = FaceAnchor::new(CubeFace::PosZ);
        assert!((anchor.local_to_world(DVec3::X) - CubeFace::PosZ.tangent()).length() < EPSILON);
        assert!((anchor.local_to_world(DVec3::Z) - CubeFace::PosZ.bitangent()).length() < EPSILON);
    }
}
