//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// sphera command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "sphera", about = "Adaptive cube-sphere terrain LOD demo")]
pub struct CliArgs {
    /// LOD attenuation (lower keeps more detail).
    #[arg(long)]
    pub lod_attenuation: Option<f64>,

    /// Planet radius in world units.
    #[arg(long)]
    pub radius: Option<f64>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Seed for generated heightmaps and tree maps.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Width of the generated heightmaps.
    #[arg(long)]
    pub heightmap_width: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(attenuation) = args.lod_attenuation {
            self.terrain.lod.attenuation = attenuation;
        }
        if let Some(radius) = args.radius {
            self.terrain.radius = radius;
        }
        if let Some(frames) = args.frames {
            self.demo.frames = frames;
        }
        if let Some(seed) = args.seed {
            self.demo.seed = seed;
        }
        if let Some(width) = args.heightmap_width {
            self.demo.heightmap_width = width;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
