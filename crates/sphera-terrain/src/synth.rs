//! Synthetic heightmaps and tree maps from fractal simplex noise.

use noise::{NoiseFn, Simplex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sphera_cubesphere::saturate;

use crate::{Heightmap, TerrainError, TreeDensityMap};

/// Multi-octave fBm settings. Frequencies are in cycles per map width.
#[derive(Clone, Debug)]
pub struct HeightmapParams {
    pub seed: u64,
    /// Number of octaves summed. Each one adds finer detail.
    pub octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Frequency of the broadest octave.
    pub base_frequency: f64,
    /// Exponent applied to the normalized height; values above 1 flatten
    /// lowlands and sharpen peaks.
    pub ridge_exponent: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 6,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 4.0,
            ridge_exponent: 1.0,
        }
    }
}

/// Fractal Brownian motion over 2D simplex noise.
pub struct FbmNoise {
    noise: Simplex,
    params: HeightmapParams,
}

impl FbmNoise {
    pub fn new(params: HeightmapParams) -> Self {
        Self {
            noise: Simplex::new(params.seed as u32),
            params,
        }
    }

    /// Raw sum of octaves at `(u, v)`, in `[-max_amplitude, max_amplitude]`.
    pub fn sample(&self, u: f64, v: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = 1.0;
        for _ in 0..self.params.octaves {
            total += self.noise.get([u * frequency, v * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }
        total
    }

    /// Geometric sum of the octave amplitudes.
    pub fn max_amplitude(&self) -> f64 {
        (0..self.params.octaves)
            .map(|i| self.params.persistence.powi(i as i32))
            .sum()
    }

    /// Sample mapped to `[0, 1]`.
    pub fn sample_unit(&self, u: f64, v: f64) -> f64 {
        let max = self.max_amplitude();
        if max <= 0.0 {
            return 0.5;
        }
        let n = saturate(self.sample(u, v) / max * 0.5 + 0.5);
        n.powf(self.params.ridge_exponent)
    }
}

/// Byte heightmap of fBm noise spanning the full 0..=255 range.
pub fn generate_heightmap(width: u32, params: &HeightmapParams) -> Result<Heightmap, TerrainError> {
    if !width.is_power_of_two() {
        return Err(TerrainError::NotPowerOfTwo(width));
    }
    let fbm = FbmNoise::new(params.clone());
    let inv = 1.0 / f64::from(width);
    let raw: Vec<f64> = (0..width)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| fbm.sample_unit(f64::from(x) * inv, f64::from(y) * inv))
        .collect();

    let (lo, hi) = raw
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        });
    let span = if hi > lo { hi - lo } else { 1.0 };
    let data = raw
        .iter()
        .map(|&h| ((h - lo) / span * 255.0).round() as u8)
        .collect();
    Heightmap::new(width, data)
}

/// Tree map with clustered trees; roughly `density` of all texels hold one.
///
/// Low-frequency noise decides where forests are, a seeded RNG scatters
/// individual trees inside them.
pub fn generate_tree_map(width: u32, seed: u64, density: f64) -> Result<TreeDensityMap, TerrainError> {
    if !width.is_power_of_two() {
        return Err(TerrainError::NotPowerOfTwo(width));
    }
    let density = saturate(density);
    let forests = FbmNoise::new(HeightmapParams {
        seed: seed ^ 0x7EE5,
        octaves: 3,
        ..Default::default()
    });
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let inv = 1.0 / f64::from(width);

    let mut data = Vec::with_capacity(width as usize * width as usize);
    for y in 0..width {
        for x in 0..width {
            let cluster = forests.sample_unit(f64::from(x) * inv, f64::from(y) * inv);
            let chance = (density * 2.0 * cluster).min(1.0);
            let is_tree = rng.random::<f64>() < chance;
            data.push(if is_tree { TreeDensityMap::TREE } else { u8::MAX });
        }
    }
    TreeDensityMap::new(width, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_fbm_is_deterministic() {
        let a = FbmNoise::new(HeightmapParams {
            seed: 42,
            ..Default::default()
        });
        let b = FbmNoise::new(HeightmapParams {
            seed: 42,
            ..Default::default()
        });
        assert!((a.sample(0.3, 0.7) - b.sample(0.3, 0.7)).abs() < EPSILON);
    }

    #[test]
    fn test_fbm_stays_within_amplitude() {
        let fbm = FbmNoise::new(HeightmapParams::default());
        let max = fbm.max_amplitude();
        for i in 0..50 {
            for j in 0..50 {
                let (u, v) = (f64::from(i) * 0.021, f64::from(j) * 0.017);
                assert!(fbm.sample(u, v).abs() <= max + EPSILON);
                let unit = fbm.sample_unit(u, v);
                assert!((0.0..=1.0).contains(&unit), "unit sample {unit}");
            }
        }
    }

    #[test]
    fn test_generated_heightmap_spans_byte_range() {
        let map = generate_heightmap(64, &HeightmapParams::default()).unwrap();
        assert_eq!(map.width(), 64);
        assert_eq!(*map.data().iter().min().unwrap(), 0);
        assert_eq!(*map.data().iter().max().unwrap(), 255);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_heightmap(32, &HeightmapParams { seed: 1, ..Default::default() }).unwrap();
        let b = generate_heightmap(32, &HeightmapParams { seed: 2, ..Default::default() }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_rejects_odd_width() {
        assert!(generate_heightmap(48, &HeightmapParams::default()).is_err());
        assert!(generate_tree_map(48, 1, 0.1).is_err());
    }

    #[test]
    fn test_tree_map_density_bounds() {
        let empty = generate_tree_map(32, 9, 0.0).unwrap();
        assert_eq!(empty.tree_count(), 0);
        let full = generate_tree_map(32, 9, 1.0).unwrap();
        assert!(full.tree_count() > 0);
        let again = generate_tree_map(32, 9, 1.0).unwrap();
        assert_eq!(full, again, "same seed must give the same map");
    }
}
