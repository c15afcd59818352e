//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Planet geometry and LOD tunables.
    pub terrain: TerrainConfig,
    /// Detail tree placement.
    pub trees: TreeConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Settings of the demo flight.
    pub demo: DemoConfig,
}

/// Process-wide terrain constants, fixed once the terrain is built.
///
/// `tile_size` and `count_lod_levels` must match the values the tile
/// vertex shader was compiled with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Radius of the base sphere in world units.
    pub radius: f64,
    /// Edge length of a base tile in heightmap texels. Power of two.
    pub tile_size: u32,
    /// Number of discrete mesh LOD levels a draw tile supports.
    pub count_lod_levels: u32,
    /// World units per unscaled heightmap step.
    pub height_scale: f64,
    /// Continuous LOD tunables.
    pub lod: LodConfig,
}

/// Tunables of the continuous LOD metric and the quadtree gates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Multiplier on the log-distance LOD value. Lower keeps more detail.
    pub attenuation: f64,
    /// Constant factor applied to the squared distance before the log.
    pub distance_factor: f64,
    /// Minimum dot product between a corner normal and the camera direction
    /// for the corner to count as facing the camera.
    pub facing_threshold: f64,
    /// Partially visible nodes at or above this LOD level are split when the
    /// camera is close to the ground.
    pub pvs_threshold_lod_near: u32,
    /// Same as `pvs_threshold_lod_near`, used when the camera is high up.
    pub pvs_threshold_lod_far: u32,
    /// Ground distance below which `pvs_threshold_lod_near` applies.
    pub pvs_near_ground_distance: f64,
}

/// Detail tree placement around the camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    /// Radius (face plane units) around the camera in which trees are placed.
    pub detail_radius: f64,
    /// Camera movement that triggers a new placement query.
    pub update_threshold: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "sphera_lod=trace").
    pub log_level: String,
    /// Also write JSON logs to the log directory (debug builds only).
    pub log_to_file: bool,
}

/// Parameters of the demo flight over a synthetic planet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Width of the generated heightmaps in texels.
    pub heightmap_width: u32,
    /// Width of the generated tree density maps in texels.
    pub tree_map_width: u32,
    /// Seed for all generated data.
    pub seed: u64,
    /// Number of simulated frames.
    pub frames: u32,
    /// Camera altitude above the base sphere on the first frame.
    pub start_altitude: f64,
    /// Camera altitude above the base sphere on the last frame.
    pub end_altitude: f64,
    /// Orbit speed of the camera.
    pub orbit_degrees_per_frame: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            radius: 1024.0,
            tile_size: 64,
            count_lod_levels: 9,
            height_scale: 0.55,
            lod: LodConfig::default(),
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            attenuation: 0.5,
            distance_factor: 3.0,
            facing_threshold: 0.0,
            pvs_threshold_lod_near: 3,
            pvs_threshold_lod_far: 5,
            pvs_near_ground_distance: 20.0,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            detail_radius: 60.0,
            update_threshold: 10.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            heightmap_width: 1024,
            tree_map_width: 256,
            seed: 42,
            frames: 600,
            start_altitude: 3000.0,
            end_altitude: 2.0,
            orbit_degrees_per_frame: 0.2,
        }
    }
}

impl TerrainConfig {
    /// Check that the constants describe a terrain the quadtree can build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::Invalid {
                field: "terrain.radius",
                reason: format!("must be positive, got {}", self.radius),
            });
        }
        if !self.tile_size.is_power_of_two() {
            return Err(ConfigError::Invalid {
                field: "terrain.tile_size",
                reason: format!("must be a power of two, got {}", self.tile_size),
            });
        }
        if !(1..=16).contains(&self.count_lod_levels) {
            return Err(ConfigError::Invalid {
                field: "terrain.count_lod_levels",
                reason: format!("must be in 1..=16, got {}", self.count_lod_levels),
            });
        }
        if !self.height_scale.is_finite() {
            return Err(ConfigError::Invalid {
                field: "terrain.height_scale",
                reason: "must be finite".to_string(),
            });
        }
        if !(self.lod.distance_factor > 0.0) {
            return Err(ConfigError::Invalid {
                field: "terrain.lod.distance_factor",
                reason: format!("must be positive, got {}", self.lod.distance_factor),
            });
        }
        Ok(())
    }
}

/// Default platform directory for `config.ron`, if the OS provides one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sphera"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
