//! Draw tiles and the renderer capability the quadtree drives.

use bytemuck::{Pod, Zeroable};
use rustc_hash::FxHashMap;
use sphera_cubesphere::CubeFace;

use crate::node::{NodeId, SceneNode};

/// Opaque renderer-side handle of a draw tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileHandle(pub u64);

/// Discrete LOD bracket a tile is drawn with; `max` is always `min + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LodRange {
    pub min: u32,
    pub max: u32,
}

/// GPU layout of a [`LodRange`]: `[min, max, 2^min, 2^max]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LodRangeUniform {
    pub lod_range: [f32; 4],
}

impl LodRange {
    #[must_use]
    pub fn from_floor(lod_min: u32) -> Self {
        Self {
            min: lod_min,
            max: lod_min + 1,
        }
    }

    #[must_use]
    pub fn uniform(&self) -> LodRangeUniform {
        LodRangeUniform {
            lod_range: [
                self.min as f32,
                self.max as f32,
                (1u64 << self.min.min(63)) as f32,
                (1u64 << self.max.min(63)) as f32,
            ],
        }
    }

    /// Mesh LOD a tile spanning `w` base tiles is drawn at.
    #[must_use]
    pub fn mesh_lod(&self, w: u32) -> u32 {
        self.min.saturating_sub(w.max(1).ilog2())
    }
}

/// Everything a renderer needs to build the mesh of one tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileDesc {
    pub face: CubeFace,
    /// Lower corner in base tiles.
    pub x: u32,
    pub y: u32,
    /// Width in base tiles.
    pub w: u32,
    /// Mesh must be drawn with reversed winding.
    pub is_back_face: bool,
    /// Mean of the node's scaled height envelope.
    pub base_height: f64,
    /// Node the tile belongs to.
    pub node: NodeId,
}

/// Leaf payload owned by a collapsed node. Created once, then only its LOD
/// range and enabled flag change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawTile {
    /// Renderer handle from [`TileRenderer::create_tile`].
    pub handle: TileHandle,
    /// Last range sent to the renderer; `None` before the first one.
    pub range: Option<LodRange>,
    enabled: bool,
}

impl DrawTile {
    pub(crate) fn new(handle: TileHandle) -> Self {
        Self {
            handle,
            range: None,
            enabled: false,
        }
    }
}

impl SceneNode for DrawTile {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }
}

/// Renderer side of the terrain.
///
/// Calls are only made when something changes, so implementations may
/// treat every call as real work.
pub trait TileRenderer {
    /// Build the mesh of a new tile. It starts disabled.
    fn create_tile(&mut self, desc: &TileDesc) -> TileHandle;

    fn set_lod_range(&mut self, tile: TileHandle, range: LodRange);

    fn set_tile_enabled(&mut self, tile: TileHandle, enabled: bool);

    /// A quadtree node was created. Roots have no parent.
    fn attach_node(&mut self, _node: NodeId, _parent: Option<NodeId>) {}

    /// A child node was shown or hidden by its parent.
    fn set_node_enabled(&mut self, _node: NodeId, _enabled: bool) {}
}

/// Renderer that only hands out handles.
#[derive(Debug, Default)]
pub struct NullRenderer {
    next: u64,
}

impl TileRenderer for NullRenderer {
    fn create_tile(&mut self, _desc: &TileDesc) -> TileHandle {
        self.next += 1;
        TileHandle(self.next - 1)
    }

    fn set_lod_range(&mut self, _tile: TileHandle, _range: LodRange) {}

    fn set_tile_enabled(&mut self, _tile: TileHandle, _enabled: bool) {}
}

/// Renderer-side view of one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedTile {
    pub desc: TileDesc,
    pub range: Option<LodRange>,
    pub enabled: bool,
}

/// Renderer that records every call, for tests and statistics.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    /// Indexed by [`TileHandle`].
    pub tiles: Vec<RecordedTile>,
    /// `(node, parent)` in attach order.
    pub attached: Vec<(NodeId, Option<NodeId>)>,
    /// Last enabled flag per node; roots never appear.
    pub node_enabled: FxHashMap<NodeId, bool>,
    // Call counters since the last `reset_counters`.
    pub range_updates: u32,
    pub tile_toggles: u32,
    pub node_toggles: u32,
}

impl RecordingRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tile(&self, handle: TileHandle) -> Option<&RecordedTile> {
        self.tiles.get(handle.0 as usize)
    }

    /// Reset the per-frame call counters.
    pub fn reset_counters(&mut self) {
        self.range_updates = 0;
        self.tile_toggles = 0;
        self.node_toggles = 0;
    }
}

impl TileRenderer for RecordingRenderer {
    fn create_tile(&mut self, desc: &TileDesc) -> TileHandle {
        self.tiles.push(RecordedTile {
            desc: *desc,
            range: None,
            enabled: false,
        });
        TileHandle(self.tiles.len() as u64 - 1)
    }

    fn set_lod_range(&mut self, tile: TileHandle, range: LodRange) {
        self.range_updates += 1;
        if let Some(t) = self.tiles.get_mut(tile.0 as usize) {
            t.range = Some(range);
        }
    }

    fn set_tile_enabled(&mut self, tile: TileHandle, enabled: bool) {
        self.tile_toggles += 1;
        if let Some(t) = self.tiles.get_mut(tile.0 as usize) {
            t.enabled = enabled;
        }
    }

    fn attach_node(&mut self, node: NodeId, parent: Option<NodeId>) {
        self.attached.push((node, parent));
    }

    fn set_node_enabled(&mut self, node: NodeId, enabled: bool) {
        self.node_toggles += 1;
        self.node_enabled.insert(node, enabled);
    }
}
