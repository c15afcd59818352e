//! The six cube faces, their index order and basis vectors.

use glam::DVec3;

/// One face of the cube that is projected onto the sphere.
///
/// The discriminant is the face index used by heightmap mappings and tile
/// descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// +X face
    PosX = 0,
    /// −X face
    NegX = 1,
    /// +Y face
    PosY = 2,
    /// −Y face
    NegY = 3,
    /// +Z face
    PosZ = 4,
    /// −Z face
    NegZ = 5,
}

impl CubeFace {
    /// All faces in index order. Face selection breaks ties in this order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Face index in `0..6`.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Faces looking down a negative axis. Their tile meshes are drawn with
    /// reversed culling.
    #[must_use]
    pub fn is_back(self) -> bool {
        matches!(self, CubeFace::NegX | CubeFace::NegY | CubeFace::NegZ)
    }

    /// Outward unit normal. This is the "up" axis of the face plane.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::X,
            CubeFace::NegX => DVec3::NEG_X,
            CubeFace::PosY => DVec3::Y,
            CubeFace::NegY => DVec3::NEG_Y,
            CubeFace::PosZ => DVec3::Z,
            CubeFace::NegZ => DVec3::NEG_Z,
        }
    }

    /// World direction of increasing face `x`.
    #[must_use]
    pub fn tangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::NEG_Z,
            CubeFace::NegX => DVec3::Z,
            CubeFace::PosY => DVec3::X,
            CubeFace::NegY => DVec3::X,
            CubeFace::PosZ => DVec3::X,
            CubeFace::NegZ => DVec3::NEG_X,
        }
    }

    /// World direction of increasing face `y`.
    #[must_use]
    pub fn bitangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::Y,
            CubeFace::NegX => DVec3::Y,
            CubeFace::PosY => DVec3::NEG_Z,
            CubeFace::NegY => DVec3::Z,
            CubeFace::PosZ => DVec3::Y,
            CubeFace::NegZ => DVec3::Y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_index_follows_all_order() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
        }
    }

    #[test]
    fn test_back_faces_are_negative_axes() {
        for face in CubeFace::ALL {
            let n = face.normal();
            assert_eq!(
                face.is_back(),
                n.x + n.y + n.z < 0.0,
                "wrong back flag for {face:?}"
            );
        }
    }

    #[test]
    fn test_basis_is_orthonormal() {
        for face in CubeFace::ALL {
            let (n, t, b) = (face.normal(), face.tangent(), face.bitangent());
            for v in [n, t, b] {
                assert!((v.length() - 1.0).abs() < EPSILON, "{face:?}: {v:?}");
            }
            assert!(n.dot(t).abs() < EPSILON, "{face:?}: n.t");
            assert!(n.dot(b).abs() < EPSILON, "{face:?}: n.b");
            assert!(t.dot(b).abs() < EPSILON, "{face:?}: t.b");
            assert!(
                (t.cross(b) - n).length() < EPSILON,
                "tangent x bitangent must be the normal for {face:?}"
            );
        }
    }
}
