//! Ray-marched black hole scene pass.
//!
//! A single full-screen fragment pass marches rays through a gravitationally
//! bent field, accumulating emission from a volumetric accretion disk
//! (sampled from the tiling [`NoiseVolume`](crate::noise::NoiseVolume)) and
//! falling back to the [`StarfieldCubemap`](crate::starfield::StarfieldCubemap)
//! for escaped rays. Output is HDR linear color into the bloom pipeline's
//! scene buffer.

use wgpu::util::DeviceExt;

use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, texture_3d, texture_cube,
    uniform_buffer,
};
use crate::noise::NoiseVolume;
use crate::starfield::StarfieldCubemap;

/// Physical scene parameters, owned and mutated by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParams {
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
    /// Disk color near the inner edge (hot).
    pub disk_color_inner: [f32; 3],
    /// Disk color near the outer edge (cool).
    pub disk_color_outer: [f32; 3],
    /// Angular speed of the disk rotation, radians per second.
    pub disk_speed: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            black_hole_radius: 1.0,
            disk_inner_radius: 2.2,
            disk_outer_radius: 6.0,
            disk_thickness: 0.35,
            glow_intensity: 2.5,
            disk_color_inner: [1.0, 0.85, 0.6],
            disk_color_outer: [0.9, 0.4, 0.1],
            disk_speed: 0.25,
        }
    }
}

/// Orbit camera state: distance from the hole and azimuth angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Distance from the origin.
    pub distance: f32,
    /// Azimuth angle in radians.
    pub angle: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            distance: 12.0,
            angle: 0.0,
        }
    }
}

/// Per-frame render inputs.
#[derive(Debug, Clone, Copy)]
pub struct SceneFrame {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Animation time in seconds.
    pub time: f32,
}

/// Scene uniform - must match the WGSL struct in `scene.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    resolution: [f32; 2],
    time: f32,
    black_hole_radius: f32,

    disk_inner_radius: f32,
    disk_outer_radius: f32,
    disk_thickness: f32,
    glow_intensity: f32,

    disk_color_inner: [f32; 3],
    disk_phase: f32,

    disk_color_outer: [f32; 3],
    camera_distance: f32,

    camera_angle: f32,
    _pad: [f32; 3],
}

impl SceneUniform {
    fn build(
        frame: SceneFrame,
        params: &SceneParams,
        camera: &CameraState,
        disk_phase: f32,
    ) -> Self {
        Self {
            resolution: [frame.width as f32, frame.height as f32],
            time: frame.time,
            black_hole_radius: params.black_hole_radius,
            disk_inner_radius: params.disk_inner_radius,
            disk_outer_radius: params.disk_outer_radius,
            disk_thickness: params.disk_thickness,
            glow_intensity: params.glow_intensity,
            disk_color_inner: params.disk_color_inner,
            disk_phase,
            disk_color_outer: params.disk_color_outer,
            camera_distance: camera.distance,
            camera_angle: camera.angle,
            _pad: [0.0; 3],
        }
    }
}

/// Ray-marched scene renderer.
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    disk_phase: f32,
}

impl SceneRenderer {
    /// Build the scene pipeline, binding the noise volume and starfield
    /// cubemap. Both textures are immutable once baked, so the bind group
    /// is built once and reused every frame.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        noise: &NoiseVolume,
        starfield: &StarfieldCubemap,
    ) -> Self {
        let layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Layout"),
                entries: &[
                    uniform_buffer(0),
                    texture_3d(1),
                    filtering_sampler(2),
                    texture_cube(3),
                    filtering_sampler(4),
                ],
            },
        );

        let shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Scene Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("../assets/shaders/scene.wgsl").into(),
                ),
            });

        let pipeline = create_screen_space_pipeline(
            device,
            "Scene",
            &shader,
            wgpu::TextureFormat::Rgba16Float,
            None,
            &[&layout],
        );

        let uniform_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Uniform"),
                contents: bytemuck::cast_slice(&[SceneUniform::build(
                    SceneFrame {
                        width: 1,
                        height: 1,
                        time: 0.0,
                    },
                    &SceneParams::default(),
                    &CameraState::default(),
                    0.0,
                )]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Scene Bind Group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(
                            noise.view(),
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(
                            noise.sampler(),
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(
                            starfield.view(),
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(
                            starfield.sampler(),
                        ),
                    },
                ],
            });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            disk_phase: 0.0,
        }
    }

    /// Advance the disk rotation phase by `dt` seconds. Kept separate from
    /// rendering so exports can re-render the current frame without the
    /// disk moving between interactive and captured output.
    pub fn update(&mut self, dt: f32, params: &SceneParams) {
        self.disk_phase += dt * params.disk_speed;
    }

    /// Current disk rotation phase in radians.
    pub fn disk_phase(&self) -> f32 {
        self.disk_phase
    }

    /// Render the scene into `target_view` (expected Rgba16Float).
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        target_view: &wgpu::TextureView,
        frame: SceneFrame,
        params: &SceneParams,
        camera: &CameraState,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[SceneUniform::build(
                frame,
                params,
                camera,
                self.disk_phase,
            )]),
        );

        let mut pass =
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(
                    wgpu::RenderPassColorAttachment {
                        view: target_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    },
                )],
                depth_stencil_attachment: None,
                ..Default::default()
            });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraState, SceneFrame, SceneParams, SceneUniform};

    #[test]
    fn uniform_is_eighty_bytes() {
        // Five 16-byte rows; WGSL struct layout depends on this.
        assert_eq!(size_of::<SceneUniform>(), 80);
    }

    #[test]
    fn uniform_carries_frame_and_camera_values() {
        let frame = SceneFrame {
            width: 1920,
            height: 1080,
            time: 3.5,
        };
        let camera = CameraState {
            distance: 8.0,
            angle: 1.25,
        };
        let u = SceneUniform::build(
            frame,
            &SceneParams::default(),
            &camera,
            0.75,
        );
        assert_eq!(u.resolution, [1920.0, 1080.0]);
        assert_eq!(u.time, 3.5);
        assert_eq!(u.camera_distance, 8.0);
        assert_eq!(u.camera_angle, 1.25);
        assert_eq!(u.disk_phase, 0.75);
    }

    #[test]
    fn default_disk_radii_are_ordered() {
        let p = SceneParams::default();
        assert!(p.black_hole_radius < p.disk_inner_radius);
        assert!(p.disk_inner_radius < p.disk_outer_radius);
    }

    #[test]
    fn phase_advances_with_disk_speed() {
        // Pure arithmetic mirror of SceneRenderer::update.
        let params = SceneParams {
            disk_speed: 0.5,
            ..Default::default()
        };
        let mut phase = 0.0f32;
        for _ in 0..4 {
            phase += 0.25 * params.disk_speed;
        }
        assert!((phase - 0.5).abs() < 1e-6);
    }
}
