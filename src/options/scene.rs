use serde::{Deserialize, Serialize};

use crate::scene::SceneParams;

/// Black hole and accretion disk parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneOptions {
    /// Event horizon radius in world units.
    pub black_hole_radius: f32,
    /// Inner edge of the accretion disk.
    pub disk_inner_radius: f32,
    /// Outer edge of the accretion disk.
    pub disk_outer_radius: f32,
    /// Half-thickness of the disk slab.
    pub disk_thickness: f32,
    /// Emission multiplier for disk glow.
    pub glow_intensity: f32,
    /// Disk color near the inner edge.
    pub disk_color_inner: [f32; 3],
    /// Disk color near the outer edge.
    pub disk_color_outer: [f32; 3],
    /// Angular speed of the disk rotation, radians per second.
    pub disk_speed: f32,
}

impl Default for SceneOptions {
    fn default() -> Self {
        let p = SceneParams::default();
        Self {
            black_hole_radius: p.black_hole_radius,
            disk_inner_radius: p.disk_inner_radius,
            disk_outer_radius: p.disk_outer_radius,
            disk_thickness: p.disk_thickness,
            glow_intensity: p.glow_intensity,
            disk_color_inner: p.disk_color_inner,
            disk_color_outer: p.disk_color_outer,
            disk_speed: p.disk_speed,
        }
    }
}

impl From<&SceneOptions> for SceneParams {
    fn from(o: &SceneOptions) -> Self {
        Self {
            black_hole_radius: o.black_hole_radius,
            disk_inner_radius: o.disk_inner_radius,
            disk_outer_radius: o.disk_outer_radius,
            disk_thickness: o.disk_thickness,
            glow_intensity: o.glow_intensity,
            disk_color_inner: o.disk_color_inner,
            disk_color_outer: o.disk_color_outer,
            disk_speed: o.disk_speed,
        }
    }
}
