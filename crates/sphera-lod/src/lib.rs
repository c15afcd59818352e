//! Adaptive cube-sphere terrain LOD.
//!
//! Each of the six faces carries a quadtree that is re-evaluated for every
//! camera pass. A node either draws itself as one tile or splits into four
//! children, driven by a continuous LOD metric so that neighboring tiles
//! never differ by more than one LOD level.

mod clod;
mod error;
mod node;
mod quadtree;
mod stats;
mod terrain;
mod tile;
mod visibility;


pub use clod::ClodMetric;
pub use error::LodError;
pub use node::{CornerSet, NodeId, NodeState, QuadTreeNode, SceneNode};
pub use quadtree::ActiveTile;
pub use stats::FrameStats;
pub use terrain::SphericalTerrain;
pub use tile::{
    DrawTile, LodRange, LodRangeUniform, NullRenderer, RecordedTile, RecordingRenderer,
    TileDesc, TileHandle, TileRenderer,
};
pub use visibility::{HorizonClassifier, Visibility};
