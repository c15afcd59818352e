//! Tree density maps and placement of detail trees around the camera.

use std::hash::{Hash, Hasher};

use glam::{DMat3, DVec3};
use rustc_hash::FxHasher;
use sphera_cubesphere::{CubeFace, FacePoint};
use tracing::trace;

use crate::{HeightmapSampler, TerrainError};

/// Single-channel presence grid. A texel equal to [`TreeDensityMap::TREE`]
/// holds a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeDensityMap {
    width: u32,
    data: Vec<u8>,
}

impl TreeDensityMap {
    pub const TREE: u8 = 0;

    pub fn new(width: u32, data: Vec<u8>) -> Result<Self, TerrainError> {
        if !width.is_power_of_two() {
            return Err(TerrainError::NotPowerOfTwo(width));
        }
        let expected = width as usize * width as usize;
        if data.len() != expected {
            return Err(TerrainError::DimensionMismatch {
                width,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, data })
    }

    /// Build from RGBA8 pixels, reading the alpha channel.
    pub fn from_rgba(width: u32, rgba: &[u8]) -> Result<Self, TerrainError> {
        let expected = width as usize * width as usize * 4;
        if rgba.len() != expected {
            return Err(TerrainError::DimensionMismatch {
                width,
                expected,
                actual: rgba.len(),
            });
        }
        Self::new(width, rgba.chunks_exact(4).map(|px| px[3]).collect())
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn has_tree(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.width
            && self.data[(y * self.width + x) as usize] == Self::TREE
    }

    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == Self::TREE).count()
    }
}

/// A tree anchored on the terrain surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedTree {
    pub position: DVec3,
    /// Columns are right, up and forward. `None` where no tangent frame exists.
    pub orientation: Option<DMat3>,
}

/// Finds trees near a world position.
///
/// Tree maps are indexed like heightmaps, so a face reads the tree map with
/// the same index as its heightmap.
#[derive(Clone, Debug)]
pub struct TreePlacer {
    sampler: HeightmapSampler,
    maps: Vec<TreeDensityMap>,
}

impl TreePlacer {
    pub fn new(sampler: HeightmapSampler, maps: Vec<TreeDensityMap>) -> Result<Self, TerrainError> {
        let heightmaps = sampler.heightmaps();
        if maps.len() != heightmaps.len() {
            return Err(TerrainError::MapCountMismatch {
                expected: heightmaps.len(),
                actual: maps.len(),
            });
        }
        let width = heightmaps.width();
        for map in &maps {
            if map.width() > width || width % map.width() != 0 {
                return Err(TerrainError::WidthMismatch {
                    expected: width,
                    actual: map.width(),
                });
            }
        }
        Ok(Self { sampler, maps })
    }

    #[must_use]
    pub fn sampler(&self) -> &HeightmapSampler {
        &self.sampler
    }

    /// Tree map read by `face`.
    #[must_use]
    pub fn map_for(&self, face: CubeFace) -> &TreeDensityMap {
        &self.maps[self.sampler.heightmaps().heightmap_id(face).0]
    }

    /// Trees within `radius` world units of the point under `world`, measured
    /// on the face plane. Only the face under `world` is searched.
    #[must_use]
    pub fn trees_in_radius(&self, world: DVec3, radius: f64) -> Vec<DVec3> {
        let mapper = self.sampler.mapper();
        let center = mapper.face_point(world);
        let map = self.map_for(center.face);
        let width = f64::from(map.width());
        // Heightmap texels per tree map texel.
        let size_ratio = mapper.face_texels() / width;

        let limit = radius / mapper.texel_scale();
        let limit_sq = limit * limit;
        let r = limit / size_ratio;
        let cx = center.x / size_ratio;
        let cy = center.y / size_ratio;

        let y_min = (cy - r).clamp(0.0, width).floor() as u32;
        let y_max = (cy + r).clamp(0.0, width).ceil() as u32;
        let x_min = (cx - r).clamp(0.0, width).floor() as u32;
        let x_max = (cx + r).clamp(0.0, width).ceil() as u32;

        let mut trees = Vec::new();
        for y in y_min..y_max {
            for x in x_min..x_max {
                if !map.has_tree(x, y) {
                    continue;
                }
                let spot = FacePoint::new(
                    center.face,
                    f64::from(x) * size_ratio,
                    f64::from(y) * size_ratio,
                );
                if center.distance_squared(&spot) > limit_sq {
                    continue;
                }
                let height = self.sampler.height_at(spot.face, spot.x, spot.y);
                trees.push(mapper.to_sphere_point(spot.face, spot.x, height, spot.y));
            }
        }
        trees
    }
}

/// Stable per-tree frame: `up` along the sphere normal, `forward` roughly
/// toward the north pole, twisted by a hash of the position.
///
/// Returns `None` where the frame degenerates.
#[must_use]
pub fn tree_orientation(position: DVec3, radius: f64) -> Option<DMat3> {
    let up = position.try_normalize()?;
    let north = DVec3::new(0.0, radius, 0.0);

    let mut hasher = FxHasher::default();
    position.x.to_bits().hash(&mut hasher);
    position.y.to_bits().hash(&mut hasher);
    let twist = (hasher.finish() & 2047) as f64;

    let mut forward = north - position;
    forward.x += twist;
    forward.y -= twist;
    let forward = forward.try_normalize()?;

    let right = forward.cross(up).try_normalize()?;
    let forward = right.cross(up).try_normalize()?;
    Some(DMat3::from_cols(right, up, forward))
}

/// Trees around the camera, refreshed only after the camera moved far enough.
#[derive(Clone, Debug)]
pub struct DetailTreeTracker {
    detail_radius: f64,
    update_threshold: f64,
    last_update: Option<DVec3>,
    trees: Vec<PlacedTree>,
}

impl DetailTreeTracker {
    #[must_use]
    pub fn new(detail_radius: f64, update_threshold: f64) -> Self {
        Self {
            detail_radius,
            update_threshold,
            last_update: None,
            trees: Vec::new(),
        }
    }

    /// Re-query when the camera moved at least the update threshold since the
    /// last query. Returns `true` if the tree set was rebuilt.
    pub fn update(&mut self, camera: DVec3, placer: &TreePlacer) -> bool {
        if let Some(last) = self.last_update
            && camera.distance_squared(last) < self.update_threshold * self.update_threshold
        {
            return false;
        }
        let radius = placer.sampler().mapper().radius();
        self.trees = placer
            .trees_in_radius(camera, self.detail_radius)
            .into_iter()
            .map(|position| PlacedTree {
                position,
                orientation: tree_orientation(position, radius),
            })
            .collect();
        self.last_update = Some(camera);
        trace!(trees = self.trees.len(), "detail trees refreshed");
        true
    }

    #[must_use]
    pub fn trees(&self) -> &[PlacedTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Heightmap, HeightmapSet};

    const EPSILON: f64 = 1e-9;

    fn sampler(width: u32, height: u8) -> HeightmapSampler {
        let set = HeightmapSet::shared(Heightmap::flat(width, height).unwrap());
        HeightmapSampler::new(Arc::new(set), 16.0, 0.5)
    }

    fn single_tree_map(width: u32, x: u32, y: u32) -> TreeDensityMap {
        let mut data = vec![u8::MAX; (width * width) as usize];
        data[(y * width + x) as usize] = TreeDensityMap::TREE;
        TreeDensityMap::new(width, data).unwrap()
    }

    #[test]
    fn test_tree_map_from_alpha() {
        let rgba = [9, 9, 9, 0, 9, 9, 9, 255, 9, 9, 9, 255, 9, 9, 9, 0];
        let map = TreeDensityMap::from_rgba(2, &rgba).unwrap();
        assert!(map.has_tree(0, 0));
        assert!(!map.has_tree(1, 0));
        assert!(map.has_tree(1, 1));
        assert!(!map.has_tree(2, 1), "outside the map");
        assert_eq!(map.tree_count(), 2);
    }

    #[test]
    fn test_placer_rejects_bad_maps() {
        assert!(TreePlacer::new(sampler(32, 0), Vec::new()).is_err());
        let too_wide = single_tree_map(64, 0, 0);
        assert!(TreePlacer::new(sampler(32, 0), vec![too_wide]).is_err());
    }

    #[test]
    fn test_trees_in_radius_finds_nearby_tree() {
        // Tree map texel (8, 8) covers heightmap texel (16, 16), the face center.
        let placer = TreePlacer::new(sampler(32, 20), vec![single_tree_map(16, 8, 8)]).unwrap();
        let trees = placer.trees_in_radius(DVec3::new(0.0, 30.0, 0.0), 3.0);
        assert_eq!(trees.len(), 1);
        let expected = DVec3::new(0.0, 16.0 + 10.0, 0.0);
        assert!((trees[0] - expected).length() < EPSILON, "got {:?}", trees[0]);
    }

    #[test]
    fn test_trees_outside_radius_are_skipped() {
        let placer = TreePlacer::new(sampler(32, 0), vec![single_tree_map(16, 12, 8)]).unwrap();
        // The tree is 8 heightmap texels (8 world units) from the center.
        assert!(placer.trees_in_radius(DVec3::Y * 20.0, 5.0).is_empty());
        assert_eq!(placer.trees_in_radius(DVec3::Y * 20.0, 9.0).len(), 1);
    }

    #[test]
    fn test_tree_orientation_is_orthonormal() {
        let pos = DVec3::new(3.0, 9.0, -11.0);
        let m = tree_orientation(pos, 16.0).unwrap();
        let (right, up, forward) = (m.x_axis, m.y_axis, m.z_axis);
        assert!((up - pos.normalize()).length() < EPSILON);
        for v in [right, up, forward] {
            assert!((v.length() - 1.0).abs() < EPSILON);
        }
        assert!(right.dot(up).abs() < EPSILON);
        assert!(forward.dot(up).abs() < EPSILON);
        assert!(right.dot(forward).abs() < EPSILON);
    }

    #[test]
    fn test_tree_orientation_is_stable() {
        let pos = DVec3::new(-5.0, 2.0, 14.0);
        assert_eq!(tree_orientation(pos, 16.0), tree_orientation(pos, 16.0));
    }

    #[test]
    fn test_tree_orientation_degenerate_inputs() {
        assert!(tree_orientation(DVec3::ZERO, 16.0).is_none());
    }

    #[test]
    fn test_tracker_requeries_after_threshold() {
        let placer = TreePlacer::new(sampler(32, 0), vec![single_tree_map(16, 8, 8)]).unwrap();
        let mut tracker = DetailTreeTracker::new(4.0, 2.0);
        assert!(tracker.update(DVec3::Y * 20.0, &placer));
        assert_eq!(tracker.trees().len(), 1);
        assert!(!tracker.update(DVec3::new(1.0, 20.0, 0.0), &placer));
        assert!(tracker.update(DVec3::new(6.0, 20.0, 0.0), &placer));
        assert!(tracker.trees().is_empty(), "tree left the detail radius");
    }
}
