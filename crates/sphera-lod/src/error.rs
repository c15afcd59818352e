use sphera_config::ConfigError;
use sphera_terrain::TerrainError;
use thiserror::Error;

/// Errors from building a [`SphericalTerrain`](crate::SphericalTerrain).
#[derive(Debug, Error)]
pub enum LodError {
    #[error("terrain data: {0}")]
    Terrain(#[from] TerrainError),

    #[error("terrain settings: {0}")]
    Config(#[from] ConfigError),
}
