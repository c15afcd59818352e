//! Continuous level-of-detail metric.
//!
//! The same function runs on the CPU for subdivision decisions and in the
//! tile vertex shader for geomorphing. Both sides must agree exactly or
//! cracks appear between tiles, so the shader source is generated from the
//! constants held here.
//!
//! `TILE_SIZE` in the formula is the world width of a base tile, i.e. the
//! tile size in texels times the texel scale `2R/W`. A base tile then spans
//! the same CLOD interval whatever the planet scale.

use sphera_config::TerrainConfig;

/// Maps squared camera distance to a real-valued LOD in
/// `[0, count_lod_levels - 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClodMetric {
    count_lod_levels: u32,
    /// World width of a base tile.
    tile_extent: f64,
    distance_factor: f64,
    attenuation: f64,
}

impl ClodMetric {
    #[must_use]
    pub fn new(count_lod_levels: u32, tile_extent: f64, distance_factor: f64, attenuation: f64) -> Self {
        Self {
            count_lod_levels: count_lod_levels.max(1),
            tile_extent,
            distance_factor,
            attenuation,
        }
    }

    /// Metric for a terrain whose face texels are `texel_scale` world units
    /// wide.
    #[must_use]
    pub fn from_config(config: &TerrainConfig, texel_scale: f64) -> Self {
        Self::new(
            config.count_lod_levels,
            f64::from(config.tile_size) * texel_scale,
            config.lod.distance_factor,
            config.lod.attenuation,
        )
    }

    /// `clamp(log2(d² * K / TILE_SIZE²) * 0.5 * attenuation, 0, COUNT - 1)`.
    ///
    /// Monotonic non-decreasing in `sq_distance`. Zero, negative and NaN
    /// inputs yield 0.
    #[must_use]
    pub fn calc_clod(&self, sq_distance: f64) -> f64 {
        let clod = (sq_distance * self.distance_factor / (self.tile_extent * self.tile_extent)).log2()
            * 0.5
            * self.attenuation;
        if clod.is_nan() {
            return 0.0;
        }
        clod.clamp(0.0, self.max_lod())
    }

    /// Highest LOD value the metric produces.
    #[must_use]
    pub fn max_lod(&self) -> f64 {
        f64::from(self.count_lod_levels - 1)
    }

    /// Widest node, in base tiles, a single tile mesh can draw.
    #[must_use]
    pub fn max_tile_width(&self) -> u32 {
        1 << (self.count_lod_levels - 1).min(31)
    }

    #[must_use]
    pub fn tile_extent(&self) -> f64 {
        self.tile_extent
    }

    #[must_use]
    pub fn count_lod_levels(&self) -> u32 {
        self.count_lod_levels
    }

    #[must_use]
    pub fn attenuation(&self) -> f64 {
        self.attenuation
    }

    pub fn set_attenuation(&mut self, attenuation: f64) {
        self.attenuation = attenuation;
    }

    /// WGSL source of `calc_clod` with the fixed constants baked in.
    /// Attenuation stays a parameter since it can change at runtime.
    #[must_use]
    pub fn wgsl_function(&self) -> String {
        format!(
            "const COUNT_LOD_LEVELS: f32 = {count:?};\n\
             const TILE_SIZE: f32 = {tile:?};\n\
             const CLOD_DISTANCE_FACTOR: f32 = {k:?};\n\
             \n\
             fn calc_clod(sq_distance: f32, lod_attenuation: f32) -> f32 {{\n\
             \x20   let clod = log2(sq_distance * CLOD_DISTANCE_FACTOR / (TILE_SIZE * TILE_SIZE)) * 0.5 * lod_attenuation;\n\
             \x20   return clamp(clod, 0.0, COUNT_LOD_LEVELS - 1.0);\n\
             }}\n",
            count = f64::from(self.count_lod_levels),
            tile = self.tile_extent,
            k = self.distance_factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn metric() -> ClodMetric {
        ClodMetric::from_config(&TerrainConfig::default(), 1.0)
    }

    #[test]
    fn test_known_value() {
        let m = metric();
        // d² * 3 / 64² = 2^10 -> 10 * 0.5 * 0.5
        let sq = 1024.0 * 4096.0 / 3.0;
        assert!((m.calc_clod(sq) - 2.5).abs() < EPSILON, "got {}", m.calc_clod(sq));
    }

    #[test]
    fn test_saturates_at_both_ends() {
        let m = metric();
        assert_eq!(m.calc_clod(0.0), 0.0);
        assert_eq!(m.calc_clod(1e-9), 0.0);
        assert_eq!(m.calc_clod(-5.0), 0.0);
        assert_eq!(m.calc_clod(f64::NAN), 0.0);
        assert_eq!(m.calc_clod(1e300), 8.0);
        assert_eq!(m.calc_clod(f64::INFINITY), 8.0);
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let m = metric();
        let mut prev = m.calc_clod(0.0);
        let mut sq = 1e-3;
        while sq < 1e24 {
            let clod = m.calc_clod(sq);
            assert!(clod >= prev, "not monotonic at d²={sq}: {clod} < {prev}");
            assert!((0.0..=m.max_lod()).contains(&clod));
            prev = clod;
            sq *= 1.37;
        }
    }

    #[test]
    fn test_attenuation_scales_result() {
        let mut m = metric();
        let sq = 1e7;
        let base = m.calc_clod(sq);
        m.set_attenuation(0.25);
        assert!((m.calc_clod(sq) - base * 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_texel_scale_widens_tiles() {
        let unit = metric();
        let coarse = ClodMetric::from_config(&TerrainConfig::default(), 6.25);
        assert_eq!(coarse.tile_extent(), 400.0);
        for sq in [1.0, 3e4, 5e6, 7e9] {
            let expected = unit.calc_clod(sq);
            let got = coarse.calc_clod(sq * 6.25 * 6.25);
            assert!((got - expected).abs() < EPSILON, "d²={sq}: {got} vs {expected}");
        }
        assert!(coarse.wgsl_function().contains("const TILE_SIZE: f32 = 400.0;"));
    }

    #[test]
    fn test_max_tile_width() {
        assert_eq!(metric().max_tile_width(), 256);
        assert_eq!(ClodMetric::new(1, 64.0, 3.0, 0.5).max_tile_width(), 1);
    }

    #[test]
    fn test_wgsl_bakes_constants() {
        let src = metric().wgsl_function();
        assert!(src.contains("const COUNT_LOD_LEVELS: f32 = 9.0;"), "{src}");
        assert!(src.contains("const TILE_SIZE: f32 = 64.0;"), "{src}");
        assert!(src.contains("const CLOD_DISTANCE_FACTOR: f32 = 3.0;"), "{src}");
        assert!(src.contains("fn calc_clod(sq_distance: f32, lod_attenuation: f32) -> f32"));
        assert!(src.contains("    return clamp(clod, 0.0, COUNT_LOD_LEVELS - 1.0);"));
    }
}
