//! The planet: six face quadtrees driven by one camera at a time.

use std::sync::Arc;

use glam::DVec3;
use sphera_config::{LodConfig, TerrainConfig};
use sphera_cubesphere::{CubeFace, CubeSphereMapper, FacePoint};
use sphera_terrain::{BoundingBoxCache, HeightmapSampler, HeightmapSet};
use tracing::{debug, trace};

use crate::clod::ClodMetric;
use crate::error::LodError;
use crate::node::{NodeId, QuadTreeNode};
use crate::quadtree::{ActiveTile, Pass, QuadTree};
use crate::stats::FrameStats;
use crate::tile::TileRenderer;
use crate::visibility::HorizonClassifier;

/// Adaptive terrain over a cube-sphere.
///
/// Each [`render`](Self::render) call re-evaluates the six face trees for
/// one camera. Passes for several cameras must run one after another: the
/// enabled flags of nodes and tiles are shared between cameras.
#[derive(Debug)]
pub struct SphericalTerrain {
    sampler: HeightmapSampler,
    metric: ClodMetric,
    classifier: HorizonClassifier,
    lod: LodConfig,
    tree: QuadTree,
    ground_height: f64,
    ground_distance: f64,
}

impl SphericalTerrain {
    /// Build the six face roots. Pyramids come from `cache`, so terrains
    /// built over the same heightmaps share them.
    pub fn new(
        config: &TerrainConfig,
        maps: Arc<HeightmapSet>,
        cache: &mut BoundingBoxCache,
    ) -> Result<Self, LodError> {
        config.validate()?;

        let mut pyramids = Vec::with_capacity(CubeFace::ALL.len());
        for face in CubeFace::ALL {
            pyramids.push(cache.get_or_compute(&maps, face, config.tile_size)?);
        }
        let tiles_per_face = maps.width() / config.tile_size;
        let sampler = HeightmapSampler::new(maps, config.radius, config.height_scale);
        let tree = QuadTree::new(pyramids, tiles_per_face, &sampler);
        debug!(
            radius = config.radius,
            width = sampler.heightmaps().width(),
            tiles_per_face,
            lod_levels = config.count_lod_levels,
            texel_scale = sampler.mapper().texel_scale(),
            "created spherical terrain"
        );

        Ok(Self {
            metric: ClodMetric::from_config(config, sampler.mapper().texel_scale()),
            classifier: HorizonClassifier::new(config.radius, config.lod.facing_threshold),
            lod: config.lod.clone(),
            tree,
            ground_height: 0.0,
            ground_distance: 0.0,
            sampler,
        })
    }

    /// Evaluate all six faces for `camera` and push the changes to
    /// `renderer`.
    pub fn render<R: TileRenderer>(&mut self, camera: DVec3, renderer: &mut R) -> FrameStats {
        let radius = self.sampler.mapper().radius();
        self.ground_height = self.sampler.smoothed_height_at(camera);
        self.ground_distance = camera.length() - radius - self.ground_height;
        let pvs_threshold = if self.ground_distance < self.lod.pvs_near_ground_distance {
            self.lod.pvs_threshold_lod_near
        } else {
            self.lod.pvs_threshold_lod_far
        };

        let pass = Pass {
            camera,
            clod_radius: radius + self.ground_height,
            pvs_threshold,
            metric: &self.metric,
            classifier: &self.classifier,
            sampler: &self.sampler,
        };
        let mut stats = FrameStats::default();
        for face in CubeFace::ALL {
            self.tree.render_face(face, &pass, renderer, &mut stats);
        }
        trace!(
            ground_distance = self.ground_distance,
            pvs_threshold,
            ?stats,
            "terrain pass"
        );
        stats
    }

    /// Smoothed terrain height under the camera of the last pass.
    #[must_use]
    pub fn ground_height(&self) -> f64 {
        self.ground_height
    }

    /// Camera height above the terrain at the last pass.
    #[must_use]
    pub fn ground_distance(&self) -> f64 {
        self.ground_distance
    }

    /// Tiles drawn after the last pass.
    #[must_use]
    pub fn active_tiles(&self) -> Vec<ActiveTile> {
        self.tree.active_tiles()
    }

    /// Terrain height under `world`, answered by the node that currently
    /// covers it.
    #[must_use]
    pub fn height_at(&self, world: DVec3) -> f64 {
        let p = self.face_point(world);
        self.tree
            .owner(p.face, p.x, p.y)
            .height_at(&self.sampler, p.x, p.y)
    }

    /// Gaussian-smoothed terrain height under `world`.
    #[must_use]
    pub fn smoothed_height_at(&self, world: DVec3) -> f64 {
        self.sampler.smoothed_height_at(world)
    }

    #[must_use]
    pub fn face_point(&self, world: DVec3) -> FacePoint {
        self.mapper().face_point(world)
    }

    #[must_use]
    pub fn find_face(&self, dir: DVec3) -> CubeFace {
        self.mapper().find_face_for_unit_vector(dir)
    }

    pub fn set_lod_attenuation(&mut self, attenuation: f64) {
        self.metric.set_attenuation(attenuation);
        self.lod.attenuation = attenuation;
    }

    #[must_use]
    pub fn lod_attenuation(&self) -> f64 {
        self.metric.attenuation()
    }

    /// Swap in new LOD tunables, e.g. after a config reload. Takes effect
    /// on the next pass.
    pub fn set_lod_config(&mut self, lod: &LodConfig) {
        self.metric = ClodMetric::new(
            self.metric.count_lod_levels(),
            self.metric.tile_extent(),
            lod.distance_factor,
            lod.attenuation,
        );
        self.classifier = HorizonClassifier::new(self.mapper().radius(), lod.facing_threshold);
        self.lod = lod.clone();
    }

    #[must_use]
    pub fn lod_config(&self) -> &LodConfig {
        &self.lod
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&QuadTreeNode> {
        self.tree.get(id)
    }

    /// Nodes created so far, roots included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn face_root(&self, face: CubeFace) -> NodeId {
        self.tree.root(face)
    }

    #[must_use]
    pub fn mapper(&self) -> &CubeSphereMapper {
        self.sampler.mapper()
    }

    #[must_use]
    pub fn sampler(&self) -> &HeightmapSampler {
        &self.sampler
    }

    #[must_use]
    pub fn metric(&self) -> &ClodMetric {
        &self.metric
    }
}
