//! Six-face starfield environment cubemap, baked offscreen at startup.
//!
//! Each face is rendered exactly once by a direction-parameterized generator
//! pass into a single-layer view of one shared cube texture - the per-face
//! attachment retargeting reuses the same scratch render state rather than
//! allocating six separate targets. Face order and (direction, up) bases are
//! fixed constants following the standard axis-aligned cube convention.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, linear_sampler, uniform_buffer,
};

/// Per-face (view direction, up vector) bases, in attachment order
/// +X, -X, +Y, -Y, +Z, -Z. Order and values are load-bearing: the scene
/// shader samples the cubemap assuming this convention.
pub const FACE_BASES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

/// Face basis uniform - must match the WGSL struct in `starfield.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct FaceParams {
    direction: [f32; 3],
    _pad0: f32,
    up: [f32; 3],
    _pad1: f32,
}

/// A baked, immutable environment cubemap ready for sampling.
pub struct StarfieldCubemap {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    face_resolution: u32,
}

impl StarfieldCubemap {
    /// Allocate the cube texture and render all six faces.
    ///
    /// One-shot bake with no per-frame cost; the submitted generator passes
    /// run before any later submission that samples the cubemap, so callers
    /// never observe a partially-populated texture.
    #[must_use]
    pub fn bake(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        face_resolution: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Starfield Cubemap"),
            size: wgpu::Extent3d {
                width: face_resolution,
                height: face_resolution,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let bind_group_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Starfield Face Layout"),
                entries: &[uniform_buffer(0)],
            },
        );

        let shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Starfield Generator Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("../assets/shaders/starfield.wgsl").into(),
                ),
            });

        let pipeline = create_screen_space_pipeline(
            device,
            "Starfield Generator",
            &shader,
            wgpu::TextureFormat::Rgba16Float,
            None,
            &[&bind_group_layout],
        );

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Starfield Bake Encoder"),
            });

        for (face, (direction, up)) in FACE_BASES.iter().enumerate() {
            let params = FaceParams {
                direction: direction.to_array(),
                _pad0: 0.0,
                up: up.to_array(),
                _pad1: 0.0,
            };
            let params_buffer = device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Starfield Face {face} Params")),
                    contents: bytemuck::cast_slice(&[params]),
                    usage: wgpu::BufferUsages::UNIFORM,
                },
            );
            let bind_group =
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("Starfield Face {face} BG")),
                    layout: &bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    }],
                });

            let face_view =
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("Starfield Face {face} View")),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: face as u32,
                    array_layer_count: Some(1),
                    ..Default::default()
                });

            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Starfield Face Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: &face_view,
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
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        let _ = queue.submit(std::iter::once(encoder.finish()));

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Starfield Cubemap View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = linear_sampler(device, "Starfield Sampler");

        log::info!(
            "starfield cubemap generated ({face_resolution}x{face_resolution} per face)"
        );

        Self {
            texture,
            view,
            sampler,
            face_resolution,
        }
    }

    /// Cube view over all six faces for binding.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Clamp-to-edge linear sampler.
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Square resolution of each face.
    pub fn face_resolution(&self) -> u32 {
        self.face_resolution
    }

    /// The underlying cube texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::FACE_BASES;
    use glam::Vec3;

    #[test]
    fn face_order_follows_cube_convention() {
        assert_eq!(FACE_BASES[0].0, Vec3::X);
        assert_eq!(FACE_BASES[1].0, Vec3::NEG_X);
        assert_eq!(FACE_BASES[2].0, Vec3::Y);
        assert_eq!(FACE_BASES[3].0, Vec3::NEG_Y);
        assert_eq!(FACE_BASES[4].0, Vec3::Z);
        assert_eq!(FACE_BASES[5].0, Vec3::NEG_Z);
    }

    #[test]
    fn opposite_face_directions_cancel() {
        let sum: Vec3 = FACE_BASES.iter().map(|(dir, _)| *dir).sum();
        assert_eq!(sum, Vec3::ZERO);
    }

    #[test]
    fn up_vectors_are_orthogonal_unit_vectors() {
        for (dir, up) in FACE_BASES {
            assert_eq!(dir.dot(up), 0.0);
            assert_eq!(dir.length_squared(), 1.0);
            assert_eq!(up.length_squared(), 1.0);
        }
    }

    #[test]
    fn y_faces_use_z_axis_up() {
        assert_eq!(FACE_BASES[2].1, Vec3::Z);
        assert_eq!(FACE_BASES[3].1, Vec3::NEG_Z);
    }
}
