use serde::{Deserialize, Serialize};

use crate::bloom::BloomParams;

/// Bloom and tone-mapping parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomOptions {
    /// Brightness threshold for the bright pass.
    pub threshold: f32,
    /// Scale applied to extracted bright regions.
    pub intensity: f32,
    /// Blend weight of the blurred bloom in the composite.
    pub strength: f32,
    /// Exposure multiplier for tone mapping.
    pub exposure: f32,
    /// Whether bloom is applied at all.
    pub enabled: bool,
}

impl Default for BloomOptions {
    fn default() -> Self {
        let p = BloomParams::default();
        Self {
            threshold: p.threshold,
            intensity: p.intensity,
            strength: p.strength,
            exposure: p.exposure,
            enabled: p.enabled,
        }
    }
}

impl From<&BloomOptions> for BloomParams {
    fn from(o: &BloomOptions) -> Self {
        Self {
            threshold: o.threshold,
            intensity: o.intensity,
            strength: o.strength,
            exposure: o.exposure,
            enabled: o.enabled,
        }
    }
}
