//! Terrain data behind the LOD engine: heightmaps, sampling, per-tile height
//! envelopes and tree placement.

mod error;
mod heightmap;
mod pyramid;
mod sampler;
mod synth;
mod trees;

pub use error::TerrainError;
pub use heightmap::{Heightmap, HeightmapId, HeightmapSet};
pub use pyramid::{BoundingBoxCache, BoundingBoxPyramid, HeightRange};
pub use sampler::HeightmapSampler;
pub use synth::{FbmNoise, HeightmapParams, generate_heightmap, generate_tree_map};
pub use trees::{DetailTreeTracker, PlacedTree, TreeDensityMap, TreePlacer, tree_orientation};
