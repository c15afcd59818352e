//! Errors raised while ingesting terrain data.

use thiserror::Error;

/// Precondition failures of heightmaps, tree maps and pyramids.
///
/// These surface when terrain data is built, never during a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    #[error("expected {expected} bytes for a {width}x{width} map, got {actual}")]
    DimensionMismatch {
        width: u32,
        expected: usize,
        actual: usize,
    },

    #[error("map width {0} is not a power of two")]
    NotPowerOfTwo(u32),

    #[error("tile size {tile_size} does not evenly split map width {width}")]
    TileSizeMismatch { tile_size: u32, width: u32 },

    #[error("face {face} maps to heightmap {index}, but only {count} are loaded")]
    FaceMappingOutOfRange {
        face: usize,
        index: usize,
        count: usize,
    },

    #[error("map width mismatch: expected {expected}, got {actual}")]
    WidthMismatch { expected: u32, actual: u32 },

    #[error("expected one tree map per heightmap ({expected}), got {actual}")]
    MapCountMismatch { expected: usize, actual: usize },

    #[error("at least one heightmap is required")]
    EmptySet,
}
