//! Fly a camera from orbit down to the surface of a synthetic planet.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags. Run with `cargo run -p sphera-demo -- --frames 300 --log-level debug`.

mod flight;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use sphera_config::{CliArgs, Config, default_config_dir};
use sphera_lod::{FrameStats, LodError, RecordingRenderer, SphericalTerrain};
use sphera_terrain::{
    BoundingBoxCache, DetailTreeTracker, HeightmapParams, HeightmapSet, TreePlacer,
    generate_heightmap, generate_tree_map,
};
use tracing::{debug, error, info, warn};

use crate::flight::OrbitDescent;

/// Frames between checks for an edited `config.ron`.
const RELOAD_INTERVAL: u32 = 120;
/// Share of tree map texels that hold a tree on regular faces.
const TREE_DENSITY: f64 = 0.02;
const DESERT_TREE_DENSITY: f64 = 0.002;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    sphera_log::init_logging(
        Some(&log_dir),
        cfg!(debug_assertions) && config.debug.log_to_file,
        Some(&config),
    );

    if let Err(e) = run(&config, &config_dir) {
        error!(error = %e, "demo failed");
        eprintln!("sphera-demo: {e}");
        std::process::exit(1);
    }
}

fn run(config: &Config, config_dir: &Path) -> Result<(), LodError> {
    let demo = &config.demo;
    info!(
        width = demo.heightmap_width,
        seed = demo.seed,
        "generating heightmaps"
    );
    let common = generate_heightmap(
        demo.heightmap_width,
        &HeightmapParams {
            seed: demo.seed,
            ..Default::default()
        },
    )?;
    let desert = generate_heightmap(
        demo.heightmap_width,
        &HeightmapParams {
            seed: demo.seed.wrapping_add(1),
            octaves: 4,
            ridge_exponent: 2.0,
            ..Default::default()
        },
    )?;
    let maps = Arc::new(HeightmapSet::with_desert_face(common, desert)?);
    let tree_maps = vec![
        generate_tree_map(demo.tree_map_width, demo.seed, TREE_DENSITY)?,
        generate_tree_map(demo.tree_map_width, demo.seed.wrapping_add(1), DESERT_TREE_DENSITY)?,
    ];

    info!(
        trees = tree_maps[0].tree_count(),
        desert_trees = tree_maps[1].tree_count(),
        "generated tree maps"
    );

    let mut cache = BoundingBoxCache::new();
    let mut terrain = SphericalTerrain::new(&config.terrain, maps, &mut cache)?;
    debug!(shader = %terrain.metric().wgsl_function(), "CLOD shader source");

    let placer = TreePlacer::new(terrain.sampler().clone(), tree_maps)?;
    let mut trees = DetailTreeTracker::new(config.trees.detail_radius, config.trees.update_threshold);
    let flight = OrbitDescent::new(config.terrain.radius, demo);
    let mut renderer = RecordingRenderer::new();
    let mut live_config = config.clone();
    let mut totals = FrameStats::default();

    for frame in 0..demo.frames {
        if frame > 0 && frame % RELOAD_INTERVAL == 0 {
            match live_config.reload(config_dir) {
                Ok(Some(new_config)) => {
                    terrain.set_lod_config(&new_config.terrain.lod);
                    info!(frame, attenuation = terrain.lod_attenuation(), "applied reloaded LOD settings");
                    live_config = new_config;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "config reload failed"),
            }
        }

        let camera = flight.position(frame);
        renderer.reset_counters();
        let stats = terrain.render(camera, &mut renderer);
        totals.accumulate(&stats);

        if trees.update(camera, &placer) {
            debug!(frame, trees = trees.trees().len(), "detail trees placed");
        }
        debug!(
            frame,
            altitude = flight.altitude(frame),
            ground_distance = terrain.ground_distance(),
            tiles = stats.tiles_active,
            culled = stats.nodes_culled,
            created = stats.nodes_created,
            range_updates = renderer.range_updates,
            toggles = renderer.tile_toggles + renderer.node_toggles,
            "frame"
        );
    }

    info!(
        frames = demo.frames,
        nodes = terrain.node_count(),
        draw_tiles = renderer.tiles.len(),
        active_tiles = terrain.active_tiles().len(),
        pyramids = cache.len(),
        ?totals,
        "flight finished"
    );
    Ok(())
}
