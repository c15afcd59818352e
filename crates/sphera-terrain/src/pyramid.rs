//! Per-tile height envelopes for every quadtree level.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sphera_cubesphere::CubeFace;
use tracing::debug;

use crate::{Heightmap, HeightmapId, HeightmapSet, TerrainError};

/// Unscaled min/max height of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightRange {
    pub min: u8,
    pub max: u8,
}

impl HeightRange {
    #[must_use]
    pub fn merge(self, other: HeightRange) -> HeightRange {
        HeightRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// `(min, max)` in world units.
    #[must_use]
    pub fn scaled(self, height_scale: f64) -> (f64, f64) {
        (
            f64::from(self.min) * height_scale,
            f64::from(self.max) * height_scale,
        )
    }
}

/// Height envelopes of one heightmap at every level.
///
/// Level 0 has one entry per `tile_size`-wide base tile; each further level
/// halves the tile count per axis, down to a single entry for the whole map.
#[derive(Clone, Debug)]
pub struct BoundingBoxPyramid {
    tile_size: u32,
    levels: Vec<Level>,
}

#[derive(Clone, Debug)]
struct Level {
    tiles: u32,
    ranges: Vec<HeightRange>,
}

impl Level {
    fn get(&self, x: u32, y: u32) -> Option<HeightRange> {
        if x >= self.tiles || y >= self.tiles {
            return None;
        }
        self.ranges.get((y * self.tiles + x) as usize).copied()
    }
}

impl BoundingBoxPyramid {
    /// Scan `map` into base tiles, then merge 2x2 blocks upward.
    pub fn compute(map: &Heightmap, tile_size: u32) -> Result<Self, TerrainError> {
        let width = map.width();
        if tile_size == 0 || width % tile_size != 0 {
            return Err(TerrainError::TileSizeMismatch { tile_size, width });
        }
        let mut tiles = width / tile_size;
        if !tiles.is_power_of_two() {
            return Err(TerrainError::TileSizeMismatch { tile_size, width });
        }

        let mut base = Vec::with_capacity((tiles * tiles) as usize);
        for ty in 0..tiles {
            for tx in 0..tiles {
                let (min, max) = map.range_in(tx * tile_size, ty * tile_size, tile_size);
                base.push(HeightRange { min, max });
            }
        }
        let mut levels = vec![Level { tiles, ranges: base }];

        while tiles > 1 {
            let below = &levels[levels.len() - 1];
            tiles /= 2;
            let mut ranges = Vec::with_capacity((tiles * tiles) as usize);
            for y in 0..tiles {
                for x in 0..tiles {
                    let merged = [(0, 0), (1, 0), (0, 1), (1, 1)]
                        .into_iter()
                        .filter_map(|(dx, dy)| below.get(2 * x + dx, 2 * y + dy))
                        .reduce(HeightRange::merge);
                    ranges.extend(merged);
                }
            }
            levels.push(Level { tiles, ranges });
        }

        Ok(Self { tile_size, levels })
    }

    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Envelope of tile `(x, y)` at `level`, in that level's tile units.
    #[must_use]
    pub fn get(&self, level: usize, x: u32, y: u32) -> Option<HeightRange> {
        self.levels.get(level)?.get(x, y)
    }
}

/// Pyramids by heightmap, built at most once each.
///
/// A cache serves the heightmaps of a single [`HeightmapSet`]; ids are only
/// unique within one set.
#[derive(Debug, Default)]
pub struct BoundingBoxCache {
    pyramids: FxHashMap<(HeightmapId, u32), Arc<BoundingBoxPyramid>>,
}

impl BoundingBoxCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pyramid of the heightmap `face` reads. Faces sharing a heightmap
    /// share one pyramid.
    pub fn get_or_compute(
        &mut self,
        maps: &HeightmapSet,
        face: CubeFace,
        tile_size: u32,
    ) -> Result<Arc<BoundingBoxPyramid>, TerrainError> {
        let id = maps.heightmap_id(face);
        if let Some(pyramid) = self.pyramids.get(&(id, tile_size)) {
            return Ok(Arc::clone(pyramid));
        }
        let pyramid = Arc::new(BoundingBoxPyramid::compute(maps.for_face(face), tile_size)?);
        debug!(
            heightmap = id.0,
            tile_size,
            levels = pyramid.level_count(),
            "computed bounding box pyramid"
        );
        self.pyramids.insert((id, tile_size), Arc::clone(&pyramid));
        Ok(pyramid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pyramids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pyramids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_8x8() -> Heightmap {
        let data = (0..64u32).map(|i| ((i * 37 + 11) % 251) as u8).collect();
        Heightmap::new(8, data).unwrap()
    }

    fn children(p: &BoundingBoxPyramid, level: usize, x: u32, y: u32) -> Vec<HeightRange> {
        [(0, 0), (1, 0), (0, 1), (1, 1)]
            .iter()
            .map(|&(dx, dy)| p.get(level - 1, 2 * x + dx, 2 * y + dy).unwrap())
            .collect()
    }

    #[test]
    fn test_level_count() {
        let p = BoundingBoxPyramid::compute(&map_8x8(), 2).unwrap();
        assert_eq!(p.level_count(), 3);
        assert!(p.get(0, 3, 3).is_some());
        assert!(p.get(0, 4, 0).is_none());
        assert!(p.get(2, 0, 0).is_some());
        assert!(p.get(2, 1, 0).is_none());
        assert!(p.get(3, 0, 0).is_none());
    }

    #[test]
    fn test_base_level_scans_texels() {
        let map = map_8x8();
        let p = BoundingBoxPyramid::compute(&map, 2).unwrap();
        let r = p.get(0, 3, 1).unwrap();
        let texels = [map.texel(6, 2), map.texel(7, 2), map.texel(6, 3), map.texel(7, 3)];
        assert_eq!(r.min, *texels.iter().min().unwrap());
        assert_eq!(r.max, *texels.iter().max().unwrap());
    }

    #[test]
    fn test_level_one_equals_children_envelope() {
        let p = BoundingBoxPyramid::compute(&map_8x8(), 2).unwrap();
        let kids = children(&p, 1, 0, 0);
        let r = p.get(1, 0, 0).unwrap();
        assert_eq!(r.min, kids.iter().map(|k| k.min).min().unwrap());
        assert_eq!(r.max, kids.iter().map(|k| k.max).max().unwrap());
    }

    #[test]
    fn test_envelope_holds_on_every_level() {
        let map = map_8x8();
        let p = BoundingBoxPyramid::compute(&map, 2).unwrap();
        for level in 1..p.level_count() {
            let tiles = 4 >> level;
            for y in 0..tiles {
                for x in 0..tiles {
                    let r = p.get(level, x, y).unwrap();
                    for kid in children(&p, level, x, y) {
                        assert!(r.min <= kid.min, "level {level} ({x},{y}) min");
                        assert!(r.max >= kid.max, "level {level} ({x},{y}) max");
                    }
                }
            }
        }
        let top = p.get(2, 0, 0).unwrap();
        assert_eq!(top.min, *map.data().iter().min().unwrap());
        assert_eq!(top.max, *map.data().iter().max().unwrap());
    }

    #[test]
    fn test_rejects_tile_size_that_does_not_split_width() {
        let err = BoundingBoxPyramid::compute(&map_8x8(), 3).unwrap_err();
        assert_eq!(
            err,
            TerrainError::TileSizeMismatch {
                tile_size: 3,
                width: 8
            }
        );
        assert!(BoundingBoxPyramid::compute(&map_8x8(), 0).is_err());
        assert!(BoundingBoxPyramid::compute(&map_8x8(), 16).is_err());
    }

    #[test]
    fn test_cache_computes_each_heightmap_once() {
        let desert = Heightmap::flat(8, 3).unwrap();
        let set = HeightmapSet::with_desert_face(map_8x8(), desert).unwrap();
        let mut cache = BoundingBoxCache::new();
        let a = cache.get_or_compute(&set, CubeFace::PosX, 2).unwrap();
        let b = cache.get_or_compute(&set, CubeFace::NegZ, 2).unwrap();
        assert!(Arc::ptr_eq(&a, &b), "faces sharing a heightmap share a pyramid");
        let desert = cache.get_or_compute(&set, CubeFace::NegX, 2).unwrap();
        assert!(!Arc::ptr_eq(&a, &desert));
        assert_eq!(desert.get(2, 0, 0), Some(HeightRange { min: 3, max: 3 }));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_scaled_range() {
        let r = HeightRange { min: 10, max: 200 };
        assert_eq!(r.scaled(0.5), (5.0, 100.0));
    }
}
