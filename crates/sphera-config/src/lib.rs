//! Configuration for the sphera terrain engine.
//!
//! Settings persist to disk as RON and can be overridden from the command line.
//! The terrain and LOD tunables are plain data that callers pass down by
//! reference; nothing here is global.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DemoConfig, LodConfig, TerrainConfig, TreeConfig, default_config_dir,
};
pub use error::ConfigError;
