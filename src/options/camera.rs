use serde::{Deserialize, Serialize};

use crate::scene::CameraState;

/// Orbit camera parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    /// Distance from the origin.
    pub distance: f32,
    /// Azimuth angle in radians.
    pub angle: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        let c = CameraState::default();
        Self {
            distance: c.distance,
            angle: c.angle,
        }
    }
}

impl From<&CameraOptions> for CameraState {
    fn from(o: &CameraOptions) -> Self {
        Self {
            distance: o.distance,
            angle: o.angle,
        }
    }
}
