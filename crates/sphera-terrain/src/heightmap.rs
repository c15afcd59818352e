//! Single-channel heightmaps and the face-to-heightmap mapping.

use sphera_cubesphere::CubeFace;

use crate::TerrainError;

/// Index of a heightmap inside a [`HeightmapSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeightmapId(pub usize);

/// Face that uses the second heightmap in the two-map layout.
const DESERT_FACE: CubeFace = CubeFace::NegX;

/// Square grid of unscaled byte heights with wrap-around addressing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heightmap {
    width: u32,
    data: Vec<u8>,
}

impl Heightmap {
    /// `data` holds one byte per texel, row-major, `width * width` bytes.
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

    /// Build from decoded RGBA8 pixels, keeping the red channel.
    pub fn from_rgba(width: u32, rgba: &[u8]) -> Result<Self, TerrainError> {
        let expected = width as usize * width as usize * 4;
        if rgba.len() != expected {
            return Err(TerrainError::DimensionMismatch {
                width,
                expected,
                actual: rgba.len(),
            });
        }
        Self::new(width, rgba.chunks_exact(4).map(|px| px[0]).collect())
    }

    /// Map filled with a single value.
    pub fn flat(width: u32, value: u8) -> Result<Self, TerrainError> {
        Self::new(width, vec![value; width as usize * width as usize])
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Texel at `(x, y)`; both coordinates wrap around.
    #[must_use]
    pub fn texel(&self, x: i64, y: i64) -> u8 {
        let w = i64::from(self.width);
        let (x, y) = (x.rem_euclid(w), y.rem_euclid(w));
        self.data[(y * w + x) as usize]
    }

    /// Smallest and largest texel in the `size`-wide square at `(x0, y0)`.
    pub(crate) fn range_in(&self, x0: u32, y0: u32, size: u32) -> (u8, u8) {
        let w = self.width as usize;
        let mut lo = u8::MAX;
        let mut hi = u8::MIN;
        for y in y0..y0 + size {
            let row = &self.data[y as usize * w..][x0 as usize..(x0 + size) as usize];
            for &v in row {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        (lo, hi)
    }
}

/// The heightmaps of one planet and which face reads which map.
#[derive(Clone, Debug)]
pub struct HeightmapSet {
    maps: Vec<Heightmap>,
    face_to_heightmap: [HeightmapId; 6],
}

impl HeightmapSet {
    /// `face_to_heightmap[f]` is the index in `maps` used by face `f`.
    pub fn new(maps: Vec<Heightmap>, face_to_heightmap: [usize; 6]) -> Result<Self, TerrainError> {
        let first = maps.first().ok_or(TerrainError::EmptySet)?;
        let width = first.width();
        if let Some(other) = maps.iter().find(|m| m.width() != width) {
            return Err(TerrainError::WidthMismatch {
                expected: width,
                actual: other.width(),
            });
        }
        for (face, &index) in face_to_heightmap.iter().enumerate() {
            if index >= maps.len() {
                return Err(TerrainError::FaceMappingOutOfRange {
                    face,
                    index,
                    count: maps.len(),
                });
            }
        }
        Ok(Self {
            maps,
            face_to_heightmap: face_to_heightmap.map(HeightmapId),
        })
    }

    /// All six faces read the same map.
    #[must_use]
    pub fn shared(map: Heightmap) -> Self {
        Self {
            maps: vec![map],
            face_to_heightmap: [HeightmapId(0); 6],
        }
    }

    /// One face reads `desert`, every other face reads `common`.
    pub fn with_desert_face(common: Heightmap, desert: Heightmap) -> Result<Self, TerrainError> {
        let mut mapping = [0; 6];
        mapping[DESERT_FACE.index()] = 1;
        Self::new(vec![common, desert], mapping)
    }

    /// Shared width of every map in the set.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.maps[0].width()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    #[must_use]
    pub fn heightmap_id(&self, face: CubeFace) -> HeightmapId {
        self.face_to_heightmap[face.index()]
    }

    #[must_use]
    pub fn for_face(&self, face: CubeFace) -> &Heightmap {
        &self.maps[self.heightmap_id(face).0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: u32) -> Heightmap {
        let data = (0..width * width).map(|i| i as u8).collect();
        Heightmap::new(width, data).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = Heightmap::new(4, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            TerrainError::DimensionMismatch {
                width: 4,
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_new_rejects_non_power_of_two() {
        assert_eq!(
            Heightmap::new(6, vec![0; 36]).unwrap_err(),
            TerrainError::NotPowerOfTwo(6)
        );
        assert!(Heightmap::new(0, Vec::new()).is_err());
    }

    #[test]
    fn test_from_rgba_keeps_red_channel() {
        let rgba: Vec<u8> = (0..4u8).flat_map(|i| [i * 10, 1, 2, 255]).collect();
        let map = Heightmap::from_rgba(2, &rgba).unwrap();
        assert_eq!(map.data(), &[0, 10, 20, 30]);
    }

    #[test]
    fn test_texel_wraps_in_both_directions() {
        let map = ramp(4);
        assert_eq!(map.texel(0, 0), 0);
        assert_eq!(map.texel(4, 0), 0);
        assert_eq!(map.texel(-1, 0), 3);
        assert_eq!(map.texel(1, -1), 13);
        assert_eq!(map.texel(5, 6), 9);
    }

    #[test]
    fn test_range_in_square() {
        let map = ramp(4);
        assert_eq!(map.range_in(2, 2, 2), (10, 15));
        assert_eq!(map.range_in(0, 0, 4), (0, 15));
    }

    #[test]
    fn test_set_validates_mapping() {
        let err = HeightmapSet::new(vec![ramp(4)], [0, 0, 1, 0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            TerrainError::FaceMappingOutOfRange {
                face: 2,
                index: 1,
                count: 1
            }
        );
        assert_eq!(
            HeightmapSet::new(Vec::new(), [0; 6]).unwrap_err(),
            TerrainError::EmptySet
        );
    }

    #[test]
    fn test_set_rejects_mixed_widths() {
        let err = HeightmapSet::new(vec![ramp(4), ramp(8)], [0; 6]).unwrap_err();
        assert_eq!(
            err,
            TerrainError::WidthMismatch {
                expected: 4,
                actual: 8
            }
        );
    }

    #[test]
    fn test_desert_layout() {
        let set = HeightmapSet::with_desert_face(ramp(4), Heightmap::flat(4, 7).unwrap()).unwrap();
        assert_eq!(set.len(), 2);
        for face in CubeFace::ALL {
            let expected = if face == CubeFace::NegX { 1 } else { 0 };
            assert_eq!(set.heightmap_id(face), HeightmapId(expected), "{face:?}");
        }
        assert_eq!(set.for_face(CubeFace::NegX).texel(0, 0), 7);
    }
}
