//! Offscreen frame export to PNG.
//!
//! Renders the scene at an independent export resolution into the
//! exporter's own HDR staging buffer, tone-maps it (no bloom term) into an
//! LDR target, reads the pixels back through a row-padded staging buffer,
//! and writes an 8-bit RGB PNG. The export path never touches the live
//! bloom buffers, so a 4K capture cannot disturb the interactive frame.
//! Buffer storage is reallocated only when the requested dimensions change.

use std::path::{Path, PathBuf};

use wgpu::util::DeviceExt;

use crate::error::UmbraError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer,
};
use crate::gpu::texture::RenderTarget;
use crate::scene::{CameraState, SceneFrame, SceneParams, SceneRenderer};

/// Buffer rows must be aligned to `COPY_BYTES_PER_ROW_ALIGNMENT` (256) for
/// texture-to-buffer copies.
#[must_use]
pub const fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Everything a capture needs from the caller for one frame.
pub struct CaptureRequest<'a> {
    /// Scene renderer; its current disk phase is used as-is, so the
    /// captured frame matches what is on screen.
    pub scene: &'a SceneRenderer,
    /// Scene parameters for the captured frame.
    pub params: &'a SceneParams,
    /// Camera for the captured frame.
    pub camera: &'a CameraState,
    /// Exposure for the tone map. The only post-processing parameter that
    /// affects an export; bloom is always excluded.
    pub exposure: f32,
    /// Export width in pixels.
    pub width: u32,
    /// Export height in pixels.
    pub height: u32,
    /// Animation time of the captured frame, frozen by the caller rather
    /// than read from a clock, so repeated captures are reproducible.
    pub time: f32,
}

/// Tone-map uniform - must match the WGSL struct in `tonemap.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct TonemapUniform {
    exposure: f32,
    gamma: f32,
    _pad0: f32,
    _pad1: f32,
}

/// Size-dependent export storage, replaced wholesale on dimension change.
struct ExportBuffers {
    staging: RenderTarget,
    output: RenderTarget,
    readback: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Offscreen PNG exporter with its own render targets and tone-map pass.
pub struct FrameExporter {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    buffers: Option<ExportBuffers>,
    width: u32,
    height: u32,
    allocation_count: u32,
}

impl FrameExporter {
    /// Build the tone-map pipeline. No target storage is allocated until
    /// the first capture.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Export Tonemap Layout"),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                ],
            },
        );
        let shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Export Tonemap Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("../assets/shaders/tonemap.wgsl").into(),
                ),
            });
        let pipeline = create_screen_space_pipeline(
            device,
            "Export Tonemap",
            &shader,
            wgpu::TextureFormat::Rgba8Unorm,
            None,
            &[&layout],
        );
        let uniform_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Export Tonemap Params"),
                contents: bytemuck::cast_slice(&[TonemapUniform {
                    exposure: 1.0,
                    gamma: 1.0 / 2.2,
                    _pad0: 0.0,
                    _pad1: 0.0,
                }]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        Self {
            pipeline,
            layout,
            sampler: linear_sampler(device, "Export Sampler"),
            uniform_buffer,
            buffers: None,
            width: 0,
            height: 0,
            allocation_count: 0,
        }
    }

    /// Number of times export storage has been (re)allocated.
    pub const fn allocation_count(&self) -> u32 {
        self.allocation_count
    }

    /// Current export dimensions, zero before the first capture.
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.buffers.is_some()
            && width == self.width
            && height == self.height
        {
            return;
        }
        self.width = width;
        self.height = height;

        let staging = RenderTarget::new(
            device,
            "Export HDR Staging",
            width,
            height,
            wgpu::TextureFormat::Rgba16Float,
        );
        let output = RenderTarget::new(
            device,
            "Export Output",
            width,
            height,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Export Readback"),
            size: u64::from(padded_bytes_per_row(width)) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Export Tonemap Bind Group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(
                            &staging.view,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(
                            &self.sampler,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                ],
            });

        self.buffers = Some(ExportBuffers {
            staging,
            output,
            readback,
            bind_group,
        });
        self.allocation_count += 1;
        log::debug!("export storage allocated at {width}x{height}");
    }

    /// Capture one frame into `directory` under a timestamped filename.
    ///
    /// Collisions within the same second overwrite; the filename carries
    /// one-second resolution and is not deduplicated.
    ///
    /// The capture renders through the live scene renderer and stages its
    /// uniform (export resolution, frozen time) with `Queue::write_buffer`,
    /// which lands at the start of the next submission - do not call this
    /// while a frame encoder is recorded but not yet submitted, or that
    /// frame will draw with the capture's uniform values.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created, the GPU readback fails, or
    /// the PNG cannot be written.
    pub fn capture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        request: &CaptureRequest<'_>,
        directory: &Path,
    ) -> Result<PathBuf, UmbraError> {
        std::fs::create_dir_all(directory)?;
        let filename = format!(
            "blackhole_{}.png",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        let path = directory.join(filename);
        self.capture_to(device, queue, request, &path)?;
        Ok(path)
    }

    /// Capture one frame and write it to an explicit path.
    ///
    /// # Errors
    ///
    /// Fails if the GPU readback fails or the PNG cannot be written.
    pub fn capture_to(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        request: &CaptureRequest<'_>,
        path: &Path,
    ) -> Result<(), UmbraError> {
        let rgb = self.capture_pixels(device, queue, request)?;
        image::save_buffer(
            path,
            &rgb,
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| UmbraError::Encode(e.to_string()))?;
        log::info!("frame exported to {}", path.display());
        Ok(())
    }

    /// Render, read back, and return tightly-packed RGB8 pixels in
    /// top-to-bottom row order.
    ///
    /// Must not run while a frame encoder is recorded but unsubmitted; see
    /// [`Self::capture`] for the shared-uniform staging constraint.
    ///
    /// # Errors
    ///
    /// Fails if the staging buffer cannot be mapped.
    pub fn capture_pixels(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        request: &CaptureRequest<'_>,
    ) -> Result<Vec<u8>, UmbraError> {
        let width = request.width;
        let height = request.height;
        self.ensure_size(device, width, height);
        // ensure_size always populates the storage
        let Some(buffers) = self.buffers.as_ref() else {
            return Err(UmbraError::Capture(
                "export storage missing".to_owned(),
            ));
        };

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[TonemapUniform {
                exposure: request.exposure,
                gamma: 1.0 / 2.2,
                _pad0: 0.0,
                _pad1: 0.0,
            }]),
        );

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Export Encoder"),
            });
        request.scene.render(
            &mut encoder,
            queue,
            &buffers.staging.view,
            SceneFrame {
                width,
                height,
                time: request.time,
            },
            request.params,
            request.camera,
        );

        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Export Tonemap Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: &buffers.output.view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(
                                    wgpu::Color::BLACK,
                                ),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: None,
                    ..Default::default()
                });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &buffers.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        let padded = padded_bytes_per_row(width);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &buffers.output.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffers.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let _ = queue.submit(std::iter::once(encoder.finish()));

        let slice = buffers.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::PollType::Wait);
        rx.recv()
            .map_err(|e| UmbraError::Capture(e.to_string()))?
            .map_err(|e| UmbraError::Capture(e.to_string()))?;

        // Readback rows are already top-to-bottom; strip the row padding
        // and drop alpha.
        let rgb = {
            let data = slice.get_mapped_range();
            let mut rgb =
                Vec::with_capacity(width as usize * height as usize * 3);
            for row in 0..height as usize {
                let start = row * padded as usize;
                let end = start + width as usize * 4;
                for texel in data[start..end].chunks_exact(4) {
                    rgb.extend_from_slice(&texel[..3]);
                }
            }
            rgb
        };
        buffers.readback.unmap();
        Ok(rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::{padded_bytes_per_row, CaptureRequest, FrameExporter};
    use crate::gpu::test_support;
    use crate::noise::NoiseVolume;
    use crate::scene::{CameraState, SceneParams, SceneRenderer};
    use crate::starfield::StarfieldCubemap;

    #[test]
    fn row_padding_rounds_up_to_256() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(100), 512);
        assert_eq!(padded_bytes_per_row(256), 1024);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn exact_multiples_need_no_padding() {
        assert_eq!(padded_bytes_per_row(320), 1280);
        assert_eq!(padded_bytes_per_row(1920), 7680);
    }

    #[test]
    fn exporter_starts_unallocated() {
        let Some((device, queue)) = test_support::device() else {
            return;
        };
        drop(queue);
        let exporter = FrameExporter::new(&device);
        assert_eq!(exporter.allocation_count(), 0);
        assert_eq!(exporter.dimensions(), (0, 0));
    }

    #[test]
    fn storage_reallocates_only_when_dimensions_change() {
        let Some((device, queue)) = test_support::device() else {
            return;
        };
        let noise = NoiseVolume::bake(&device, &queue, 16);
        let starfield = StarfieldCubemap::bake(&device, &queue, 32);
        let scene = SceneRenderer::new(&device, &noise, &starfield);
        let params = SceneParams::default();
        let camera = CameraState::default();
        let mut exporter = FrameExporter::new(&device);

        let mut capture = |exporter: &mut FrameExporter, w: u32, h: u32| {
            exporter
                .capture_pixels(
                    &device,
                    &queue,
                    &CaptureRequest {
                        scene: &scene,
                        params: &params,
                        camera: &camera,
                        exposure: 1.0,
                        width: w,
                        height: h,
                        time: 0.0,
                    },
                )
                .unwrap()
        };

        let first = capture(&mut exporter, 64, 48);
        assert_eq!(first.len(), 64 * 48 * 3);
        assert_eq!(exporter.allocation_count(), 1);

        // Same size: no new allocation
        let _ = capture(&mut exporter, 64, 48);
        assert_eq!(exporter.allocation_count(), 1);

        // New size, then back: two more allocations
        let _ = capture(&mut exporter, 100, 80);
        assert_eq!(exporter.allocation_count(), 2);
        let _ = capture(&mut exporter, 64, 48);
        assert_eq!(exporter.allocation_count(), 3);
    }

    #[test]
    fn captured_pixels_are_tightly_packed_rgb() {
        let Some((device, queue)) = test_support::device() else {
            return;
        };
        let noise = NoiseVolume::bake(&device, &queue, 16);
        let starfield = StarfieldCubemap::bake(&device, &queue, 32);
        let scene = SceneRenderer::new(&device, &noise, &starfield);
        let mut exporter = FrameExporter::new(&device);
        let rgb = exporter
            .capture_pixels(
                &device,
                &queue,
                &CaptureRequest {
                    scene: &scene,
                    params: &SceneParams::default(),
                    camera: &CameraState::default(),
                    exposure: 1.2,
                    width: 80,
                    height: 60,
                    time: 1.0,
                },
            )
            .unwrap();
        assert_eq!(rgb.len(), 80 * 60 * 3);
    }

    #[test]
    fn captures_at_one_size_are_reproducible() {
        let Some((device, queue)) = test_support::device() else {
            return;
        };
        let noise = NoiseVolume::bake(&device, &queue, 16);
        let starfield = StarfieldCubemap::bake(&device, &queue, 32);
        let scene = SceneRenderer::new(&device, &noise, &starfield);
        let mut exporter = FrameExporter::new(&device);
        let params = SceneParams::default();
        let camera = CameraState::default();
        let request = CaptureRequest {
            scene: &scene,
            params: &params,
            camera: &camera,
            exposure: 1.0,
            width: 48,
            height: 32,
            time: 2.0,
        };
        let a = exporter.capture_pixels(&device, &queue, &request).unwrap();
        let b = exporter.capture_pixels(&device, &queue, &request).unwrap();
        assert_eq!(a, b);
    }
}
