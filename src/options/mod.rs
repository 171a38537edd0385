//! Centralized renderer options with TOML preset support.
//!
//! All tweakable settings (scene physics, camera, bloom, export) are
//! consolidated here. All sub-structs use `#[serde(default)]` so partial
//! TOML files (e.g. only overriding `[bloom]`) work correctly.

mod bloom;
mod camera;
mod export;
mod scene;

use std::path::Path;

pub use bloom::BloomOptions;
pub use camera::CameraOptions;
pub use export::ExportOptions;
pub use scene::SceneOptions;
use serde::{Deserialize, Serialize};

use crate::error::UmbraError;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Black hole and accretion disk parameters.
    pub scene: SceneOptions,
    /// Orbit camera parameters.
    pub camera: CameraOptions,
    /// Bloom and tone-mapping parameters.
    pub bloom: BloomOptions,
    /// Frame export parameters.
    pub export: ExportOptions,
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, UmbraError> {
        let content = std::fs::read_to_string(path).map_err(UmbraError::Io)?;
        toml::from_str(&content)
            .map_err(|e| UmbraError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Fails if serialization or the filesystem write fails.
    pub fn save(&self, path: &Path) -> Result<(), UmbraError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| UmbraError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(UmbraError::Io)?;
        }
        std::fs::write(path, content).map_err(UmbraError::Io)
    }
}
