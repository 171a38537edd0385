use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Frame export parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportOptions {
    /// Export width in pixels.
    pub width: u32,
    /// Export height in pixels.
    pub height: u32,
    /// Directory receiving timestamped PNG files.
    pub directory: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            directory: PathBuf::from("screenshots"),
        }
    }
}
