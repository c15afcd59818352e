//! Cube-sphere geometry: six flat face planes projected onto a sphere.
//!
//! Face-local coordinates are heightmap texels `(x, y)` in `[0, W]` on each
//! face plane. [`CubeSphereMapper`] converts between those and world space.

mod anchor;
mod bounds;
mod cube_face;
mod face_point;
mod geometry;
mod mapper;

pub use anchor::FaceAnchor;
pub use bounds::WorldAabb;
pub use cube_face::CubeFace;
pub use face_point::FacePoint;
pub use geometry::{find_closest_point, lerp, saturate};
pub use mapper::CubeSphereMapper;
