//! World-space bounding boxes of quadtree nodes.

use glam::DVec3;

/// An axis-aligned box relative to the planet center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldAabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl WorldAabb {
    /// Smallest box enclosing all points. An empty iterator yields an
    /// inverted box that contains nothing.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        points.into_iter().fold(
            Self {
                min: DVec3::splat(f64::INFINITY),
                max: DVec3::splat(f64::NEG_INFINITY),
            },
            |bb, p| Self {
                min: bb.min.min(p),
                max: bb.max.max(p),
            },
        )
    }

    /// Half-open containment: `min <= p < max` on every axis, so a point on a
    /// face shared by two boxes belongs to exactly one of them.
    #[must_use]
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmplt(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_encloses_all() {
        let pts = [
            DVec3::new(1.0, -2.0, 3.0),
            DVec3::new(-4.0, 5.0, 0.5),
            DVec3::new(0.0, 0.0, -1.0),
        ];
        let bb = WorldAabb::from_points(pts);
        assert_eq!(bb.min, DVec3::new(-4.0, -2.0, -1.0));
        assert_eq!(bb.max, DVec3::new(1.0, 5.0, 3.0));
    }

    #[test]
    fn test_contains_is_half_open() {
        let bb = WorldAabb::from_points([DVec3::ZERO, DVec3::ONE]);
        assert!(bb.contains(DVec3::ZERO));
        assert!(bb.contains(DVec3::splat(0.5)));
        assert!(!bb.contains(DVec3::new(1.0, 0.5, 0.5)));
        assert!(!bb.contains(DVec3::new(0.5, -0.1, 0.5)));
    }

    #[test]
    fn test_empty_box_contains_nothing() {
        let bb = WorldAabb::from_points(std::iter::empty());
        assert!(!bb.contains(DVec3::ZERO));
    }
}
