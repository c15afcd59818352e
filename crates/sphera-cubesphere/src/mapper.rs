//! Mapping between face-plane texel coordinates and world space.

use glam::DVec3;

use crate::{CubeFace, FaceAnchor, FacePoint};

/// Bidirectional mapping between the six face planes and the sphere.
///
/// Each face plane is `face_texels` texels wide and spans `2 * radius` world
/// units, centered on the point `radius` along the face normal. A plane
/// point is projected onto the sphere by normalizing its offset from the
/// planet center and scaling by `radius + height`.
#[derive(Clone, Debug)]
pub struct CubeSphereMapper {
    radius: f64,
    face_texels: f64,
    texel_scale: f64,
    anchors: [FaceAnchor; 6],
}

impl CubeSphereMapper {
    /// `radius` and `face_texels` must be positive.
    #[must_use]
    pub fn new(radius: f64, face_texels: u32) -> Self {
        debug_assert!(radius > 0.0, "radius must be positive: {radius}");
        debug_assert!(face_texels > 0, "face plane needs at least one texel");
        let face_texels = f64::from(face_texels);
        Self {
            radius,
            face_texels,
            texel_scale: 2.0 * radius / face_texels,
            anchors: FaceAnchor::all(),
        }
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Width of a face plane in texels.
    #[must_use]
    pub fn face_texels(&self) -> f64 {
        self.face_texels
    }

    /// World units per texel on the face plane.
    #[must_use]
    pub fn texel_scale(&self) -> f64 {
        self.texel_scale
    }

    #[must_use]
    pub fn anchor(&self, face: CubeFace) -> &FaceAnchor {
        &self.anchors[face.index()]
    }

    /// Face-local offset of plane point `(x, z)` from the planet center.
    fn plane_offset(&self, x: f64, z: f64) -> DVec3 {
        let half = self.face_texels * 0.5;
        DVec3::new(
            (x - half) * self.texel_scale,
            self.radius,
            (z - half) * self.texel_scale,
        )
    }

    /// World position of the flat (unprojected) plane point `(x, z)`.
    #[must_use]
    pub fn plane_point(&self, face: CubeFace, x: f64, z: f64) -> DVec3 {
        self.anchor(face).local_to_world(self.plane_offset(x, z))
    }

    /// Unit sphere direction through plane point `(x, z)`.
    #[must_use]
    pub fn sphere_normal(&self, face: CubeFace, x: f64, z: f64) -> DVec3 {
        self.plane_point(face, x, z).normalize()
    }

    /// Project plane point `(x, z)` with `height` above the base sphere.
    #[must_use]
    pub fn to_sphere_point(&self, face: CubeFace, x: f64, height: f64, z: f64) -> DVec3 {
        self.sphere_normal(face, x, z) * (self.radius + height)
    }

    /// Face whose up axis has the largest dot product with `v`.
    ///
    /// Ties resolve to the face that comes first in [`CubeFace::ALL`]. Any
    /// non-zero vector works; it need not be normalized.
    #[must_use]
    pub fn find_face_for_unit_vector(&self, v: DVec3) -> CubeFace {
        let mut best = self.anchors[0].face();
        let mut best_dot = f64::NEG_INFINITY;
        for anchor in &self.anchors {
            let d = anchor.up_axis().dot(v);
            if d > best_dot {
                best_dot = d;
                best = anchor.face();
            }
        }
        best
    }

    /// Face-plane coordinates of the point under `world`.
    ///
    /// The zero vector has no direction; it maps to the center of the
    /// first face.
    #[must_use]
    pub fn face_point(&self, world: DVec3) -> FacePoint {
        let Some(dir) = world.try_normalize() else {
            let half = self.face_texels * 0.5;
            return FacePoint::new(self.anchors[0].face(), half, half);
        };
        let face = self.find_face_for_unit_vector(dir);
        let (x, y) = self.plane_coords(face, dir);
        FacePoint::new(face, x, y)
    }

    /// Plane coordinates of `dir` on a given face, which may lie beyond the
    /// face edges. `dir` must point into the face's hemisphere.
    #[must_use]
    pub fn plane_coords(&self, face: CubeFace, dir: DVec3) -> (f64, f64) {
        let local = self.anchor(face).world_to_local(dir);
        let on_plane = local * (self.radius / local.y);
        let half = self.face_texels * 0.5;
        (
            on_plane.x / self.texel_scale + half,
            on_plane.z / self.texel_scale + half,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn mapper() -> CubeSphereMapper {
        CubeSphereMapper::new(1024.0, 2048)
    }

    #[test]
    fn test_texel_scale() {
        assert_eq!(mapper().texel_scale(), 1.0);
        assert_eq!(CubeSphereMapper::new(100.0, 4).texel_scale(), 50.0);
    }

    #[test]
    fn test_face_center_maps_to_face_normal() {
        let m = mapper();
        for face in CubeFace::ALL {
            let p = m.to_sphere_point(face, 1024.0, 0.0, 1024.0);
            assert!(
                (p - face.normal() * 1024.0).length() < EPSILON,
                "{face:?}: center maps to {p:?}"
            );
        }
    }

    #[test]
    fn test_height_scales_radially() {
        let m = mapper();
        let base = m.to_sphere_point(CubeFace::NegZ, 300.0, 0.0, 1700.0);
        let raised = m.to_sphere_point(CubeFace::NegZ, 300.0, 25.0, 1700.0);
        assert!((base.length() - 1024.0).abs() < EPSILON);
        assert!((raised.length() - 1049.0).abs() < EPSILON);
        assert!(base.normalize().dot(raised.normalize()) > 1.0 - EPSILON);
    }

    #[test]
    fn test_plane_axes_follow_tangent_and_bitangent() {
        let m = mapper();
        for face in CubeFace::ALL {
            let center = m.plane_point(face, 1024.0, 1024.0);
            let dx = m.plane_point(face, 1025.0, 1024.0) - center;
            let dy = m.plane_point(face, 1024.0, 1025.0) - center;
            assert!((dx - face.tangent()).length() < EPSILON, "{face:?} x axis");
            assert!((dy - face.bitangent()).length() < EPSILON, "{face:?} y axis");
        }
    }

    #[test]
    fn test_find_face_picks_dominant_axis() {
        let m = mapper();
        for face in CubeFace::ALL {
            let v = face.normal() * 2.0 + DVec3::new(0.3, -0.2, 0.1);
            assert_eq!(m.find_face_for_unit_vector(v.normalize()), face);
        }
    }

    #[test]
    fn test_find_face_tie_goes_to_first_face() {
        let m = mapper();
        let v = DVec3::new(1.0, 1.0, 0.0).normalize();
        assert_eq!(m.find_face_for_unit_vector(v), CubeFace::PosX);
        let v = DVec3::new(0.0, 1.0, 1.0).normalize();
        assert_eq!(m.find_face_for_unit_vector(v), CubeFace::PosY);
        let v = DVec3::ONE.normalize();
        assert_eq!(m.find_face_for_unit_vector(v), CubeFace::PosX);
    }

    #[test]
    fn test_face_point_round_trip() {
        let m = mapper();
        let samples = [(1.5, 2046.5), (1024.0, 1024.0), (17.25, 930.0), (2000.0, 3.0)];
        for face in CubeFace::ALL {
            for &(x, y) in &samples {
                for height in [0.0, 140.0] {
                    let world = m.to_sphere_point(face, x, height, y);
                    let fp = m.face_point(world);
                    assert_eq!(fp.face, face, "({x}, {y}) left {face:?}");
                    assert!(
                        (fp.x - x).abs() < EPSILON && (fp.y - y).abs() < EPSILON,
                        "{face:?}: ({x}, {y}) came back as ({}, {})",
                        fp.x,
                        fp.y
                    );
                }
            }
        }
    }

    #[test]
    fn test_round_trip_with_non_unit_scale() {
        let m = CubeSphereMapper::new(16.0, 32);
        let world = m.to_sphere_point(CubeFace::NegX, 5.5, 3.0, 29.0);
        let fp = m.face_point(world);
        assert_eq!(fp.face, CubeFace::NegX);
        assert!((fp.x - 5.5).abs() < EPSILON);
        assert!((fp.y - 29.0).abs() < EPSILON);
    }

    #[test]
    fn test_point_beyond_edge_lands_on_neighbor_face() {
        let m = CubeSphereMapper::new(16.0, 32);
        // Just past the +x edge of PosY, which borders the PosX face.
        let world = m.to_sphere_point(CubeFace::PosY, 35.0, 0.0, 16.0);
        let fp = m.face_point(world);
        assert_eq!(fp.face, CubeFace::PosX);
        assert!(fp.x >= 0.0 && fp.x < 32.0 && fp.y >= 0.0 && fp.y < 32.0, "{fp:?}");
    }

    #[test]
    fn test_zero_vector_maps_to_first_face_center() {
        let m = mapper();
        let fp = m.face_point(DVec3::ZERO);
        assert_eq!(fp, FacePoint::new(CubeFace::PosX, 1024.0, 1024.0));
    }
}
