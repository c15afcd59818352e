//! Camera path of the demo: an orbit that spirals down to the surface.

use glam::DVec3;
use sphera_config::DemoConfig;

/// Tilt of the orbit plane against the equator.
const ORBIT_TILT: f64 = 0.35;

#[derive(Clone, Debug)]
pub struct OrbitDescent {
    radius: f64,
    start_altitude: f64,
    end_altitude: f64,
    frames: u32,
    radians_per_frame: f64,
}

impl OrbitDescent {
    pub fn new(radius: f64, demo: &DemoConfig) -> Self {
        Self {
            radius,
            start_altitude: demo.start_altitude,
            end_altitude: demo.end_altitude,
            frames: demo.frames,
            radians_per_frame: demo.orbit_degrees_per_frame.to_radians(),
        }
    }

    /// Altitude above the base sphere. Falls off exponentially so the
    /// flight spends as long near the ground as up in orbit.
    pub fn altitude(&self, frame: u32) -> f64 {
        let t = if self.frames > 1 {
            f64::from(frame.min(self.frames - 1)) / f64::from(self.frames - 1)
        } else {
            1.0
        };
        if self.start_altitude > 0.0 && self.end_altitude > 0.0 {
            self.start_altitude * (self.end_altitude / self.start_altitude).powf(t)
        } else {
            self.start_altitude + (self.end_altitude - self.start_altitude) * t
        }
    }

    pub fn position(&self, frame: u32) -> DVec3 {
        let angle = f64::from(frame) * self.radians_per_frame;
        let (sin, cos) = angle.sin_cos();
        let dir = DVec3::new(cos, sin * ORBIT_TILT.sin(), sin * ORBIT_TILT.cos());
        dir * (self.radius + self.altitude(frame))
    }
}
