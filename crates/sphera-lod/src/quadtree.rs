//! Node arena of the six face trees and the per-pass state machine.
//!
//! Nodes are never destroyed. A node that stops being drawn only has its
//! tile or children disabled, so moving the camera back and forth reuses
//! the nodes and tiles created earlier.

use std::sync::Arc;

use glam::DVec3;
use sphera_cubesphere::CubeFace;
use sphera_terrain::{BoundingBoxPyramid, HeightmapSampler};
use tracing::trace;

use crate::clod::ClodMetric;
use crate::node::{NodeId, NodeState, QuadTreeNode, SceneNode};
use crate::stats::FrameStats;
use crate::tile::{DrawTile, LodRange, TileDesc, TileRenderer};
use crate::visibility::{HorizonClassifier, Visibility};

/// Inputs shared by every node of one camera pass.
pub(crate) struct Pass<'a> {
    /// Camera position relative to the planet center.
    pub camera: DVec3,
    /// Radius the CLOD sample points are placed at: base radius plus the
    /// ground height under the camera.
    pub clod_radius: f64,
    /// Partially visible nodes at or above this LOD level are split.
    pub pvs_threshold: u32,
    pub metric: &'a ClodMetric,
    pub classifier: &'a HorizonClassifier,
    /// Heights for nodes created during the pass.
    pub sampler: &'a HeightmapSampler,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Decision {
    Subdivide,
    Collapse(LodRange),
    Hide,
}

/// A draw tile that is currently shown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveTile {
    pub face: CubeFace,
    /// Lower corner in base tiles.
    pub x: u32,
    pub y: u32,
    /// Width in base tiles.
    pub w: u32,
    /// LOD bracket the tile is drawn with.
    pub range: LodRange,
    /// Node owning the tile.
    pub node: NodeId,
}

/// Arena of all nodes of the six face trees.
#[derive(Debug)]
pub(crate) struct QuadTree {
    /// Indexed by [`NodeId`]. Never shrinks.
    nodes: Vec<QuadTreeNode>,
    /// Indexed by face.
    roots: [NodeId; 6],
    /// Indexed by face.
    pyramids: Vec<Arc<BoundingBoxPyramid>>,
    tile_size: u32,
}

impl QuadTree {
    /// One root per face spanning `tiles_per_face` base tiles.
    /// `pyramids` holds the pyramid of every face in index order.
    pub(crate) fn new(
        pyramids: Vec<Arc<BoundingBoxPyramid>>,
        tiles_per_face: u32,
        sampler: &HeightmapSampler,
    ) -> Self {
        let tile_size = pyramids.first().map_or(1, |p| p.tile_size());
        let mut nodes = Vec::with_capacity(CubeFace::ALL.len());
        let roots = CubeFace::ALL.map(|face| {
            let id = NodeId(nodes.len() as u32);
            let key = (face, 0, 0, tiles_per_face);
            nodes.push(QuadTreeNode::new(id, None, key, &pyramids[face.index()], sampler));
            id
        });
        Self {
            nodes,
            roots,
            pyramids,
            tile_size,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn root(&self, face: CubeFace) -> NodeId {
        self.roots[face.index()]
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&QuadTreeNode> {
        self.nodes.get(id.index())
    }

    /// Evaluate the tree of `face` for one camera pass.
    pub(crate) fn render_face<R: TileRenderer>(
        &mut self,
        face: CubeFace,
        pass: &Pass<'_>,
        renderer: &mut R,
        stats: &mut FrameStats,
    ) {
        let id = self.root(face);
        let root = &mut self.nodes[id.index()];
        if !root.attached {
            root.attached = true;
            renderer.attach_node(id, None);
        }
        self.render_node(id, pass, renderer, stats);
    }

    fn render_node<R: TileRenderer>(
        &mut self,
        id: NodeId,
        pass: &Pass<'_>,
        renderer: &mut R,
        stats: &mut FrameStats,
    ) {
        stats.nodes_visited += 1;
        let node = &self.nodes[id.index()];
        let corners = node.corners();
        let visibility = pass
            .classifier
            .classify(&corners.normals, &corners.upper, pass.camera);
        let decision = decide(node, visibility, pass);
        self.nodes[id.index()].visibility = Some(visibility);

        match decision {
            Decision::Subdivide => {
                for child in self.subdivide(id, pass.sampler, renderer, stats) {
                    self.render_node(child, pass, renderer, stats);
                }
            }
            Decision::Collapse(range) => self.collapse(id, range, renderer, stats),
            Decision::Hide => self.hide(id, renderer, stats),
        }
    }

    fn subdivide<R: TileRenderer>(
        &mut self,
        id: NodeId,
        sampler: &HeightmapSampler,
        renderer: &mut R,
        stats: &mut FrameStats,
    ) -> [NodeId; 4] {
        let children = match self.nodes[id.index()].children {
            Some(children) => children,
            None => {
                let children = self.create_children(id, sampler, renderer);
                stats.nodes_created += 4;
                children
            }
        };

        let node = &mut self.nodes[id.index()];
        node.state = NodeState::Subdivided;
        if let Some(tile) = node.draw_tile.as_mut()
            && tile.set_enabled(false)
        {
            renderer.set_tile_enabled(tile.handle, false);
        }
        self.set_children_enabled(children, true, renderer);
        stats.nodes_subdivided += 1;
        children
    }

    fn create_children<R: TileRenderer>(
        &mut self,
        id: NodeId,
        sampler: &HeightmapSampler,
        renderer: &mut R,
    ) -> [NodeId; 4] {
        let keys = self.nodes[id.index()].child_keys();
        let pyramid = Arc::clone(&self.pyramids[keys[0].0.index()]);
        let children = keys.map(|key| {
            let child_id = NodeId(self.nodes.len() as u32);
            let mut child = QuadTreeNode::new(child_id, Some(id), key, &pyramid, sampler);
            child.attached = true;
            self.nodes.push(child);
            renderer.attach_node(child_id, Some(id));
            child_id
        });
        self.nodes[id.index()].children = Some(children);
        trace!(
            parent = id.0,
            face = ?keys[0].0,
            w = keys[0].3 * 2,
            total = self.nodes.len(),
            "created child nodes"
        );
        children
    }

    fn collapse<R: TileRenderer>(
        &mut self,
        id: NodeId,
        range: LodRange,
        renderer: &mut R,
        stats: &mut FrameStats,
    ) {
        let node = &mut self.nodes[id.index()];
        node.state = NodeState::Collapsed;
        let desc = tile_desc(node);
        let tile = node
            .draw_tile
            .get_or_insert_with(|| DrawTile::new(renderer.create_tile(&desc)));
        if tile.range != Some(range) {
            tile.range = Some(range);
            renderer.set_lod_range(tile.handle, range);
        }
        if tile.set_enabled(true) {
            renderer.set_tile_enabled(tile.handle, true);
        }
        if let Some(children) = node.children {
            self.set_children_enabled(children, false, renderer);
        }
        stats.tiles_active += 1;
    }

    fn hide<R: TileRenderer>(&mut self, id: NodeId, renderer: &mut R, stats: &mut FrameStats) {
        let node = &mut self.nodes[id.index()];
        node.state = NodeState::Hidden;
        if let Some(tile) = node.draw_tile.as_mut()
            && tile.set_enabled(false)
        {
            renderer.set_tile_enabled(tile.handle, false);
        }
        if let Some(children) = node.children {
            self.set_children_enabled(children, false, renderer);
        }
        stats.nodes_culled += 1;
    }

    fn set_children_enabled<R: TileRenderer>(
        &mut self,
        children: [NodeId; 4],
        enabled: bool,
        renderer: &mut R,
    ) {
        for child in children {
            if self.nodes[child.index()].set_enabled(enabled) {
                renderer.set_node_enabled(child, enabled);
            }
        }
    }

    /// Tiles drawn after the last pass, found by walking down from the
    /// roots through subdivided nodes.
    pub(crate) fn active_tiles(&self) -> Vec<ActiveTile> {
        let mut tiles = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            match node.state() {
                NodeState::Collapsed => {
                    if let Some(tile) = node.draw_tile()
                        && let Some(range) = tile.range
                    {
                        tiles.push(ActiveTile {
                            face: node.face(),
                            x: node.x(),
                            y: node.y(),
                            w: node.w(),
                            range,
                            node: id,
                        });
                    }
                }
                NodeState::Subdivided => {
                    if let Some(children) = node.children() {
                        stack.extend(children.iter().rev());
                    }
                }
                NodeState::Hidden => {}
            }
        }
        tiles
    }

    /// Deepest node currently drawn (or last drawn) over texel `(x, y)` of
    /// `face`. Coordinates outside the face clamp to its border.
    pub(crate) fn owner(&self, face: CubeFace, x: f64, y: f64) -> &QuadTreeNode {
        let mut node = &self.nodes[self.root(face).index()];
        let last = node.w().saturating_sub(1);
        let ts = f64::from(self.tile_size);
        let bx = ((x / ts).floor().max(0.0) as u32).min(last);
        let by = ((y / ts).floor().max(0.0) as u32).min(last);

        while node.state() == NodeState::Subdivided
            && let Some(children) = node.children()
        {
            let half = node.w() / 2;
            let right = usize::from(bx >= node.x() + half);
            let below = usize::from(by >= node.y() + half);
            node = &self.nodes[children[below * 2 + right].index()];
        }
        node
    }
}

fn tile_desc(node: &QuadTreeNode) -> TileDesc {
    let (lo, hi) = node.height_range();
    TileDesc {
        face: node.face(),
        x: node.x(),
        y: node.y(),
        w: node.w(),
        is_back_face: node.face().is_back(),
        base_height: (lo + hi) * 0.5,
        node: node.id(),
    }
}

fn decide(node: &QuadTreeNode, visibility: Visibility, pass: &Pass<'_>) -> Decision {
    // Full detail under the camera, even where the horizon test would cull.
    if node.world_bounds().contains(pass.camera) {
        return if node.w() > 1 {
            Decision::Subdivide
        } else {
            Decision::Collapse(LodRange::from_floor(0))
        };
    }
    if visibility == Visibility::None {
        return Decision::Hide;
    }
    if node.w() > pass.metric.max_tile_width() {
        return Decision::Subdivide;
    }
    if visibility == Visibility::Partial
        && node.w() > 1
        && node.lod_level() >= pass.pvs_threshold
    {
        return Decision::Subdivide;
    }

    let (clod_min, clod_max) = clod_bracket(node, pass);
    let lod_min = clod_min.floor();
    let too_wide = clod_max.ceil() - lod_min > 1.0;
    let too_coarse = lod_min < f64::from(node.lod_level());
    if node.w() > 1 && (too_wide || too_coarse) {
        Decision::Subdivide
    } else {
        Decision::Collapse(LodRange::from_floor(lod_min as u32))
    }
}

/// Lowest and highest CLOD over the node outline.
///
/// The outline is the four great-circle arcs between the corner normals,
/// the same arcs an adjacent node evaluates along a shared edge.
fn clod_bracket(node: &QuadTreeNode, pass: &Pass<'_>) -> (f64, f64) {
    let clod = |dir: DVec3| {
        pass.metric
            .calc_clod(pass.camera.distance_squared(dir * pass.clod_radius))
    };
    let normals = &node.corners().normals;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (i, &a) in normals.iter().enumerate() {
        let b = normals[(i + 1) % normals.len()];
        let corner = clod(a);
        lo = lo.min(corner);
        hi = hi.max(corner);
        if let Some(near) = arc_point_toward(a, b, pass.camera) {
            lo = lo.min(clod(near));
        }
        if let Some(far) = arc_point_toward(a, b, -pass.camera) {
            hi = hi.max(clod(far));
        }
    }
    (lo, hi)
}

/// Point of the minor arc from `a` to `b` (unit vectors) with the largest
/// dot product with `target`, if it lies strictly between the ends.
///
/// `None` when the maximum is at an end point or the arc or target is
/// degenerate.
fn arc_point_toward(a: DVec3, b: DVec3, target: DVec3) -> Option<DVec3> {
    let m = a.cross(b).try_normalize()?;
    let d = (target - m * target.dot(m)).try_normalize()?;
    let on_arc = a.cross(d).dot(m) >= 0.0 && d.cross(b).dot(m) >= 0.0;
    on_arc.then_some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_arc_point_toward_interior() {
        let d = arc_point_toward(DVec3::X, DVec3::Y, DVec3::new(5.0, 5.0, 3.0)).unwrap();
        let expected = DVec3::new(1.0, 1.0, 0.0).normalize();
        assert!((d - expected).length() < EPSILON, "{d}");
    }

    #[test]
    fn test_arc_point_toward_beyond_end() {
        assert_eq!(
            arc_point_toward(DVec3::X, DVec3::Y, DVec3::new(-1.0, 0.2, 0.0)),
            None,
            "maximum lies at the end point b"
        );
        assert_eq!(arc_point_toward(DVec3::X, DVec3::Y, DVec3::new(1.0, -0.3, 0.0)), None);
    }

    #[test]
    fn test_arc_point_toward_degenerate() {
        assert_eq!(arc_point_toward(DVec3::X, DVec3::X, DVec3::Y), None, "zero-length arc");
        assert_eq!(
            arc_point_toward(DVec3::X, DVec3::Y, DVec3::Z * 4.0),
            None,
            "target perpendicular to the arc plane"
        );
        assert_eq!(arc_point_toward(DVec3::X, DVec3::Y, DVec3::ZERO), None);
    }

    #[test]
    fn test_arc_point_is_closest_sample() {
        let a = DVec3::new(1.0, 0.2, -0.3).normalize();
        let b = DVec3::new(0.4, 1.0, 0.1).normalize();
        let camera = DVec3::new(3.0, 2.5, 1.0);
        let near = arc_point_toward(a, b, camera).unwrap();
        for i in 0..=100 {
            let t = f64::from(i) / 100.0;
            let p = a.lerp(b, t).normalize();
            assert!(
                camera.distance_squared(near) <= camera.distance_squared(p) + EPSILON,
                "sample {t} is closer than the arc point"
            );
        }
    }
}
