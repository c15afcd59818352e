//! Point and smoothed height queries against the face heightmaps.

use std::sync::Arc;

use glam::DVec3;
use sphera_cubesphere::{CubeFace, CubeSphereMapper, lerp};

use crate::HeightmapSet;

/// Half width of the smoothing kernel; the kernel is 3x3.
const KERNEL_RANGE: i32 = 1;
const KERNEL_WIDTH: usize = (2 * KERNEL_RANGE + 1) as usize;
/// Texel spacing between smoothing taps.
const SAMPLE_DELTA: f64 = 1.0;

/// Height lookups in world units (scaled heightmap values).
#[derive(Clone, Debug)]
pub struct HeightmapSampler {
    maps: Arc<HeightmapSet>,
    mapper: CubeSphereMapper,
    height_scale: f64,
    kernel: [f64; KERNEL_WIDTH * KERNEL_WIDTH],
}

impl HeightmapSampler {
    #[must_use]
    pub fn new(maps: Arc<HeightmapSet>, radius: f64, height_scale: f64) -> Self {
        let mapper = CubeSphereMapper::new(radius, maps.width());
        Self {
            maps,
            mapper,
            height_scale,
            kernel: gaussian_kernel(),
        }
    }

    #[must_use]
    pub fn mapper(&self) -> &CubeSphereMapper {
        &self.mapper
    }

    #[must_use]
    pub fn heightmaps(&self) -> &HeightmapSet {
        &self.maps
    }

    #[must_use]
    pub fn height_scale(&self) -> f64 {
        self.height_scale
    }

    /// Bilinear height at texel coordinates `(x, y)` of `face`.
    ///
    /// Coordinates wrap around the map, so every finite input is valid.
    #[must_use]
    pub fn height_at(&self, face: CubeFace, x: f64, y: f64) -> f64 {
        let map = self.maps.for_face(face);
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let w = f64::from(map.width());
        let (ix, iy) = (x0.rem_euclid(w) as i64, y0.rem_euclid(w) as i64);

        let h = |dx: i64, dy: i64| f64::from(map.texel(ix + dx, iy + dy));
        let top = lerp(h(0, 0), h(1, 0), fx);
        let bottom = lerp(h(0, 1), h(1, 1), fx);
        lerp(top, bottom, fy) * self.height_scale
    }

    /// Gaussian-smoothed height under a world position.
    ///
    /// Nine point samples per call; meant for slow-changing queries such as
    /// the ground height under the camera.
    #[must_use]
    pub fn smoothed_height_at(&self, world: DVec3) -> f64 {
        let p = self.mapper.face_point(world);
        kernel_offsets()
            .zip(self.kernel.iter())
            .map(|((j, k), weight)| {
                let x = p.x + SAMPLE_DELTA * f64::from(j);
                let y = p.y + SAMPLE_DELTA * f64::from(k);
                weight * self.height_at(p.face, x, y)
            })
            .sum()
    }
}

fn kernel_offsets() -> impl Iterator<Item = (i32, i32)> {
    (-KERNEL_RANGE..=KERNEL_RANGE)
        .flat_map(|j| (-KERNEL_RANGE..=KERNEL_RANGE).map(move |k| (j, k)))
}

/// Normalized 3x3 Gaussian with unit standard deviation.
fn gaussian_kernel() -> [f64; KERNEL_WIDTH * KERNEL_WIDTH] {
    let mut kernel = [0.0; KERNEL_WIDTH * KERNEL_WIDTH];
    for (w, (j, k)) in kernel.iter_mut().zip(kernel_offsets()) {
        *w = (-f64::from(j * j + k * k) * 0.5).exp();
    }
    let total: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= total);
    kernel
}
