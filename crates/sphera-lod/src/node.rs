//! Quadtree nodes: geometry fixed at creation, state updated per pass.

use glam::DVec3;
use sphera_cubesphere::{CubeFace, WorldAabb};
use sphera_terrain::{BoundingBoxPyramid, HeightRange, HeightmapSampler};

use crate::tile::DrawTile;
use crate::visibility::Visibility;

/// Stable index of a node in the quadtree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node did on the last pass that reached it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Drawn as a single tile; children, if any, are disabled.
    Collapsed,
    /// Children are enabled and drawn instead; the tile, if any, is disabled.
    Subdivided,
    /// Behind the planet; tile and children are disabled.
    Hidden,
}

/// Anything the scene shows or hides without destroying it.
pub trait SceneNode {
    fn is_enabled(&self) -> bool;

    /// Returns `true` if the flag changed.
    fn set_enabled(&mut self, enabled: bool) -> bool;
}

/// The four corners of a node, counter-clockwise in face coordinates:
/// `(x0, y0)`, `(x1, y0)`, `(x1, y1)`, `(x0, y1)`. Consecutive corners
/// share an edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerSet {
    /// Corner on the sphere at the lowest height of the node.
    pub lower: [DVec3; 4],
    /// Corner on the sphere at the highest height of the node.
    pub upper: [DVec3; 4],
    /// Unit sphere normals through the corners.
    pub normals: [DVec3; 4],
}

/// One square of a face quadtree.
///
/// Geometry is fixed at construction. Nodes live in the arena for the
/// lifetime of the terrain; a collapse only disables the children.
#[derive(Clone, Debug)]
pub struct QuadTreeNode {
    /// Slot in the arena.
    id: NodeId,
    /// `None` for a face root.
    parent: Option<NodeId>,
    face: CubeFace,
    /// Lower corner in base tiles.
    x: u32,
    y: u32,
    /// Width in base tiles, a power of two.
    w: u32,
    /// `log2(w)`.
    lod_level: u32,
    /// Scaled height envelope `(min, max)` from the pyramid.
    heights: (f64, f64),
    /// Corner normals and radial points for the visibility test.
    corners: CornerSet,
    /// Hull of the node on the sphere between its height bounds.
    bounds: WorldAabb,
    /// Created on the first collapse, kept afterwards.
    pub(crate) draw_tile: Option<DrawTile>,
    /// Created on the first subdivision, in row order.
    pub(crate) children: Option<[NodeId; 4]>,
    /// Outcome of the last pass that reached this node.
    pub(crate) state: NodeState,
    /// Classification of the last pass; `None` until the first one.
    pub(crate) visibility: Option<Visibility>,
    /// Whether the renderer has been told about this node.
    pub(crate) attached: bool,
    enabled: bool,
}

impl QuadTreeNode {
    /// Build the node covering base tiles `[x, x + w) x [y, y + w)` of `face`.
    pub(crate) fn new(
        id: NodeId,
        parent: Option<NodeId>,
        (face, x, y, w): (CubeFace, u32, u32, u32),
        pyramid: &BoundingBoxPyramid,
        sampler: &HeightmapSampler,
    ) -> Self {
        let lod_level = w.ilog2();
        let range = pyramid
            .get(lod_level as usize, x / w, y / w)
            .unwrap_or(HeightRange {
                min: u8::MIN,
                max: u8::MAX,
            });
        let (h_min, h_max) = range.scaled(sampler.height_scale());

        let mapper = sampler.mapper();
        let ts = f64::from(pyramid.tile_size());
        let (x0, x1) = (f64::from(x) * ts, f64::from(x + w) * ts);
        let (y0, y1) = (f64::from(y) * ts, f64::from(y + w) * ts);
        let plane = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];

        let lower = plane.map(|(px, py)| mapper.to_sphere_point(face, px, h_min, py));
        let normals = plane.map(|(px, py)| mapper.sphere_normal(face, px, py));
        let upper = normals.map(|n| n * (mapper.radius() + h_max));

        // The patch bulges outward, so its extent along each axis can peak
        // inside an edge or inside the node. Those peaks lie on the points
        // nearest the face center.
        let center = mapper.face_texels() * 0.5;
        let cx = center.clamp(x0, x1);
        let cy = center.clamp(y0, y1);
        let bulge = [(cx, y0), (x1, cy), (cx, y1), (x0, cy)]
            .into_iter()
            .flat_map(|(px, py)| {
                [
                    mapper.to_sphere_point(face, px, h_min, py),
                    mapper.to_sphere_point(face, px, h_max, py),
                ]
            })
            .chain([mapper.to_sphere_point(face, cx, h_max, cy)]);
        let bounds = WorldAabb::from_points(lower.into_iter().chain(upper).chain(bulge));

        Self {
            id,
            parent,
            face,
            x,
            y,
            w,
            lod_level,
            heights: (h_min, h_max),
            corners: CornerSet {
                lower,
                upper,
                normals,
            },
            bounds,
            draw_tile: None,
            children: None,
            state: NodeState::Collapsed,
            visibility: None,
            attached: false,
            enabled: parent.is_none(),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// Position in base tiles.
    #[must_use]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Width in base tiles, a power of two.
    #[must_use]
    pub fn w(&self) -> u32 {
        self.w
    }

    /// `log2(w)`: the LOD a single tile spanning this node corresponds to.
    #[must_use]
    pub fn lod_level(&self) -> u32 {
        self.lod_level
    }

    /// Scaled `(min, max)` terrain height inside the node.
    #[must_use]
    pub fn height_range(&self) -> (f64, f64) {
        self.heights
    }

    #[must_use]
    pub fn corners(&self) -> &CornerSet {
        &self.corners
    }

    #[must_use]
    pub fn world_bounds(&self) -> &WorldAabb {
        &self.bounds
    }

    #[must_use]
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Classification from the last pass that tested this node.
    #[must_use]
    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    #[must_use]
    pub fn children(&self) -> Option<[NodeId; 4]> {
        self.children
    }

    #[must_use]
    pub fn draw_tile(&self) -> Option<&DrawTile> {
        self.draw_tile.as_ref()
    }

    /// Height at texel coordinates of this node's face. Every node can
    /// answer for any point since the heightmap has full resolution.
    #[must_use]
    pub fn height_at(&self, sampler: &HeightmapSampler, x: f64, y: f64) -> f64 {
        sampler.height_at(self.face, x, y)
    }

    /// `(face, x, y, w)` of the four children, in row order.
    pub(crate) fn child_keys(&self) -> [(CubeFace, u32, u32, u32); 4] {
        let h = self.w / 2;
        [
            (self.face, self.x, self.y, h),
            (self.face, self.x + h, self.y, h),
            (self.face, self.x, self.y + h, h),
            (self.face, self.x + h, self.y + h, h),
        ]
    }
}

impl SceneNode for QuadTreeNode {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }
}
