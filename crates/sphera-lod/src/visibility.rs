//! Sphere-aware visibility of quadtree nodes.
//!
//! Ordinary frustum culling does not know that the far side of the planet
//! is hidden behind the planet itself. This classifier looks at the four
//! corners of a node: a corner counts as hidden when its normal faces away
//! from the camera, or when the sight line from the camera to its upper
//! point dips below the base sphere.

use glam::DVec3;
use sphera_cubesphere::find_closest_point;

/// Sight-line parameters this close to either end are not tested; the
/// closest approach is then at the camera or at the corner itself.
const SEGMENT_END_MARGIN: f64 = 0.01;

/// How much of a node can be seen from the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// No corner is hidden.
    All,
    /// Some corners are hidden.
    Partial,
    /// Every corner is hidden.
    None,
}

/// Classifies nodes by which of their corners face the camera and lie
/// above its horizon.
///
/// Complements the renderer's own frustum culling; it never looks at the
/// view direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HorizonClassifier {
    /// Radius of the occluding sphere.
    radius: f64,
    /// Minimum dot product of a corner normal and the camera direction.
    facing_threshold: f64,
}

impl HorizonClassifier {
    /// `facing_threshold` is the minimum dot product between a corner normal
    /// and the camera direction for the corner to face the camera.
    #[must_use]
    pub fn new(radius: f64, facing_threshold: f64) -> Self {
        Self {
            radius,
            facing_threshold,
        }
    }

    /// Classify a node from its corner normals and upper corner points.
    ///
    /// A camera at the planet center has no direction and yields
    /// [`Visibility::Partial`].
    #[must_use]
    pub fn classify(&self, normals: &[DVec3; 4], upper: &[DVec3; 4], camera: DVec3) -> Visibility {
        let Some(camera_dir) = camera.try_normalize() else {
            return Visibility::Partial;
        };
        let hidden = normals
            .iter()
            .zip(upper)
            .filter(|&(&normal, &corner)| self.corner_hidden(normal, corner, camera, camera_dir))
            .count();
        match hidden {
            0 => Visibility::All,
            4 => Visibility::None,
            _ => Visibility::Partial,
        }
    }

    fn corner_hidden(&self, normal: DVec3, corner: DVec3, camera: DVec3, camera_dir: DVec3) -> bool {
        if normal.dot(camera_dir) < self.facing_threshold {
            return true;
        }
        match find_closest_point(camera, corner, DVec3::ZERO) {
            Some(u) if u > SEGMENT_END_MARGIN && u < 1.0 - SEGMENT_END_MARGIN => {
                camera.lerp(corner, u).length() <= self.radius
            }
            _ => false,
        }
    }
}
