/// Counters of one camera pass over the six face trees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes evaluated this pass.
    pub nodes_visited: u32,
    /// Nodes drawn as a single tile.
    pub tiles_active: u32,
    /// Nodes classified as not visible.
    pub nodes_culled: u32,
    /// Nodes that split into their children.
    pub nodes_subdivided: u32,
    /// Nodes added to the arena this pass.
    pub nodes_created: u32,
}

impl FrameStats {
    pub fn accumulate(&mut self, other: &FrameStats) {
        self.nodes_visited += other.nodes_visited;
        self.tiles_active += other.tiles_active;
        self.nodes_culled += other.nodes_culled;
        self.nodes_subdivided += other.nodes_subdivided;
        self.nodes_created += other.nodes_created;
    }
}
