use std::{
    fs,
    path::{Path, PathBuf},
};

use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Coord;

pub const CONFIG_FILE: &str = "config.json";

/// Settings read once at start up. Every field has a default so a partial
/// `config.json` only overrides what it names.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub nominatim_url: String,
    pub overpass_url: String,
    /// Nominatim refuses anonymous clients.
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Douglas-Peucker tolerance, in degrees, applied to the boundary before
    /// it is sent to Overpass.
    pub simplify_tolerance: f64,
    pub starting_location: Coord,
    pub starting_zoom: u32,
    pub max_zoom: u32,
    /// Pixel size of one map tile.
    pub tile_quality: f32,
    pub cache_dir: Option<PathBuf>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_string(),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            user_agent: concat!("osm-explorer/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 180,
            simplify_tolerance: 0.0005,
            starting_location: Coord::new(38.6270, -90.1994),
            starting_zoom: 10,
            max_zoom: 19,
            tile_quality: 256.0,
            cache_dir: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "openstreetmap", "osm-explorer")
}

impl ExplorerConfig {
    /// Loads `config.json` from the platform config directory. A missing
    /// file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        match project_dirs() {
            Some(dirs) => Self::load_from(&dirs.config_dir().join(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Where map tiles are cached.
    pub fn tile_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.cache_dir().join("tiles")))
            .unwrap_or_else(|| PathBuf::from("cache"))
    }
}

/// Problem hit while loading the config, logged once the log plugin is up.
#[derive(Resource, Default)]
pub struct ConfigWarning(pub Option<String>);

pub fn report_config_warning(warning: Res<ConfigWarning>) {
    if let Some(message) = &warning.0 {
        warn!("{message}; falling back to the default settings");
    }
}
