//! HDR bloom post-processing - bright-pass extraction, separable Gaussian
//! blur, tone-mapped composite.
//!
//! The pipeline owns four offscreen color buffers: a full-resolution HDR
//! scene buffer (filled by an external scene pass), a half-resolution bright
//! buffer, and two half-resolution ping-pong buffers for the blur. A frame
//! runs either [`BloomPipeline::apply_bloom`] (all three stages) or
//! [`BloomPipeline::render_without_bloom`] (composite only, bloom weight
//! forced to zero).

use wgpu::util::DeviceExt;

use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer,
};
use crate::gpu::texture::RenderTarget;

/// Number of alternating separable blur passes, starting horizontal.
///
/// The count is even, so the final blurred result lands in ping buffer 0;
/// [`final_ping_index`] encodes that parity explicitly and the composite
/// bind group is built from it.
pub const BLUR_PASS_COUNT: usize = 6;

/// Ping-pong buffer index holding the final blurred result after
/// `pass_count` alternating passes (first pass writes buffer 1).
#[must_use]
pub const fn final_ping_index(pass_count: usize) -> usize {
    if pass_count % 2 == 0 {
        0
    } else {
        1
    }
}

/// Bright/ping buffers are exactly half the scene dimensions (floor
/// division), clamped to 1.
#[must_use]
pub const fn half_extent(width: u32, height: u32) -> (u32, u32) {
    let w = width / 2;
    let h = height / 2;
    (if w == 0 { 1 } else { w }, if h == 0 { 1 } else { h })
}

/// Bloom parameter values, owned and mutated by the caller (UI layer);
/// the pipeline only reads them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParams {
    /// Brightness threshold below which pixels contribute nothing.
    pub threshold: f32,
    /// Scale applied to extracted bright regions before blurring.
    pub intensity: f32,
    /// Blend weight of the blurred bloom in the composite.
    pub strength: f32,
    /// Exposure multiplier for tone mapping.
    pub exposure: f32,
    /// Whether the caller wants the bloom chain at all; the pipeline never
    /// reads this to pick a path on its own.
    pub enabled: bool,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            intensity: 1.0,
            strength: 0.5,
            exposure: 1.2,
            enabled: true,
        }
    }
}

/// Bright-pass uniform - must match the WGSL struct in `bloom_extract.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ExtractUniform {
    threshold: f32,
    intensity: f32,
    _pad0: f32,
    _pad1: f32,
}

impl ExtractUniform {
    fn from_params(params: &BloomParams) -> Self {
        Self {
            threshold: params.threshold,
            intensity: params.intensity,
            _pad0: 0.0,
            _pad1: 0.0,
        }
    }
}

/// Blur direction uniform - must match the WGSL struct in `bloom_blur.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurUniform {
    texel_size: [f32; 2],
    horizontal: u32,
    _pad: u32,
}

/// Composite uniform - must match the WGSL struct in `bloom_composite.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeUniform {
    bloom_strength: f32,
    exposure: f32,
    gamma: f32,
    _pad: f32,
}

impl CompositeUniform {
    fn with_bloom(params: &BloomParams, gamma: f32) -> Self {
        Self {
            bloom_strength: params.strength,
            exposure: params.exposure,
            gamma,
            _pad: 0.0,
        }
    }

    /// Tone-map-only variant: bloom weight forced to zero no matter what
    /// the params say, exposure still live.
    fn without_bloom(params: &BloomParams, gamma: f32) -> Self {
        Self {
            bloom_strength: 0.0,
            exposure: params.exposure,
            gamma,
            _pad: 0.0,
        }
    }
}

/// The three blur routes through the ping-pong pair. The first pass reads
/// the bright buffer; after that, each pass reads whichever ping buffer the
/// previous pass wrote.
const BLUR_ROUTE_FROM_BRIGHT: usize = 0;
const BLUR_ROUTE_FROM_PING1: usize = 1;
const BLUR_ROUTE_FROM_PING0: usize = 2;

/// Multi-pass HDR bloom pipeline.
pub struct BloomPipeline {
    extract_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,

    extract_layout: wgpu::BindGroupLayout,
    blur_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,

    sampler: wgpu::Sampler,

    extract_buffer: wgpu::Buffer,
    composite_buffer: wgpu::Buffer,
    /// One pre-built uniform per blur route (texel size + direction flag).
    blur_buffers: [wgpu::Buffer; 3],

    scene: RenderTarget,
    bright: RenderTarget,
    ping: [RenderTarget; 2],

    extract_bind_group: wgpu::BindGroup,
    blur_bind_groups: [wgpu::BindGroup; 3],
    composite_bind_group: wgpu::BindGroup,

    /// 1.0 for sRGB outputs (hardware gamma), 1/2.2 for linear outputs.
    gamma: f32,
    width: u32,
    height: u32,
}

impl BloomPipeline {
    /// Allocate the four-buffer set at the given scene dimensions and build
    /// the extract/blur/composite pipelines targeting `output_format` for
    /// the final composite.
    ///
    /// Allocation failure is fatal (wgpu device-lost semantics); there is no
    /// runtime recovery path.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        let sampler = linear_sampler(device, "Bloom Sampler");

        let extract_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Bloom Extract Layout"),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                ],
            },
        );
        let blur_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Bloom Blur Layout"),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                ],
            },
        );
        let composite_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Bloom Composite Layout"),
                entries: &[
                    texture_2d(0),
                    texture_2d(1),
                    filtering_sampler(2),
                    uniform_buffer(3),
                ],
            },
        );

        let extract_shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Bloom Extract Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("../assets/shaders/bloom_extract.wgsl")
                        .into(),
                ),
            });
        let blur_shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Bloom Blur Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("../assets/shaders/bloom_blur.wgsl").into(),
                ),
            });
        let composite_shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Bloom Composite Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("../assets/shaders/bloom_composite.wgsl")
                        .into(),
                ),
            });

        let extract_pipeline = create_screen_space_pipeline(
            device,
            "Bloom Extract",
            &extract_shader,
            wgpu::TextureFormat::Rgba16Float,
            None,
            &[&extract_layout],
        );
        let blur_pipeline = create_screen_space_pipeline(
            device,
            "Bloom Blur",
            &blur_shader,
            wgpu::TextureFormat::Rgba16Float,
            None,
            &[&blur_layout],
        );
        let composite_pipeline = create_screen_space_pipeline(
            device,
            "Bloom Composite",
            &composite_shader,
            output_format,
            None,
            &[&composite_layout],
        );

        // sRGB output formats gamma-correct in hardware
        let gamma = if output_format.is_srgb() { 1.0 } else { 1.0 / 2.2 };

        // Initial uniform contents mirror the default params; every pass
        // entry point rewrites them before drawing.
        let defaults = BloomParams::default();
        let extract_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Extract Params"),
                contents: bytemuck::cast_slice(&[
                    ExtractUniform::from_params(&defaults),
                ]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let composite_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Composite Params"),
                contents: bytemuck::cast_slice(&[
                    CompositeUniform::without_bloom(&defaults, gamma),
                ]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });

        let (scene, bright, ping, blur_buffers) =
            Self::create_buffers(device, width, height);

        let extract_bind_group = Self::create_extract_bind_group(
            device,
            &extract_layout,
            &scene.view,
            &sampler,
            &extract_buffer,
        );
        let blur_bind_groups = Self::create_blur_bind_groups(
            device,
            &blur_layout,
            &bright,
            &ping,
            &sampler,
            &blur_buffers,
        );
        let composite_bind_group = Self::create_composite_bind_group(
            device,
            &composite_layout,
            &scene.view,
            &ping[final_ping_index(BLUR_PASS_COUNT)].view,
            &sampler,
            &composite_buffer,
        );

        Self {
            extract_pipeline,
            blur_pipeline,
            composite_pipeline,
            extract_layout,
            blur_layout,
            composite_layout,
            sampler,
            extract_buffer,
            composite_buffer,
            blur_buffers,
            scene,
            bright,
            ping,
            extract_bind_group,
            blur_bind_groups,
            composite_bind_group,
            gamma,
            width,
            height,
        }
    }

    fn create_buffers(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (RenderTarget, RenderTarget, [RenderTarget; 2], [wgpu::Buffer; 3])
    {
        let (half_w, half_h) = half_extent(width, height);
        let scene = RenderTarget::new(
            device,
            "Bloom Scene Buffer",
            width,
            height,
            wgpu::TextureFormat::Rgba16Float,
        );
        let bright = RenderTarget::new(
            device,
            "Bloom Bright Buffer",
            half_w,
            half_h,
            wgpu::TextureFormat::Rgba16Float,
        );
        let ping = [
            RenderTarget::new(
                device,
                "Bloom Ping Buffer 0",
                half_w,
                half_h,
                wgpu::TextureFormat::Rgba16Float,
            ),
            RenderTarget::new(
                device,
                "Bloom Ping Buffer 1",
                half_w,
                half_h,
                wgpu::TextureFormat::Rgba16Float,
            ),
        ];

        let texel_size =
            [1.0 / half_w as f32, 1.0 / half_h as f32];
        let make_blur_buffer = |label: &str, horizontal: u32| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[BlurUniform {
                    texel_size,
                    horizontal,
                    _pad: 0,
                }]),
                usage: wgpu::BufferUsages::UNIFORM,
            })
        };
        let blur_buffers = [
            make_blur_buffer("Bloom Blur Params (bright, H)", 1),
            make_blur_buffer("Bloom Blur Params (ping 1, V)", 0),
            make_blur_buffer("Bloom Blur Params (ping 0, H)", 1),
        ];

        (scene, bright, ping, blur_buffers)
    }

    fn create_extract_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        extract_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Extract Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: extract_buffer.as_entire_binding(),
                },
            ],
        })
    }

    fn create_blur_bind_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        bright: &RenderTarget,
        ping: &[RenderTarget; 2],
        sampler: &wgpu::Sampler,
        blur_buffers: &[wgpu::Buffer; 3],
    ) -> [wgpu::BindGroup; 3] {
        let make = |label: &str, source: &wgpu::TextureView, buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Buffer(buffer),
                    },
                ],
            })
        };
        [
            make(
                "Bloom Blur BG (bright)",
                &bright.view,
                blur_buffers[BLUR_ROUTE_FROM_BRIGHT]
                    .as_entire_buffer_binding(),
            ),
            make(
                "Bloom Blur BG (ping 1)",
                &ping[1].view,
                blur_buffers[BLUR_ROUTE_FROM_PING1]
                    .as_entire_buffer_binding(),
            ),
            make(
                "Bloom Blur BG (ping 0)",
                &ping[0].view,
                blur_buffers[BLUR_ROUTE_FROM_PING0]
                    .as_entire_buffer_binding(),
            ),
        ]
    }

    fn create_composite_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        bloom_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        composite_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Composite Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(bloom_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: composite_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// The HDR scene attachment. The external scene pass must render into
    /// this before [`Self::apply_bloom`] / [`Self::render_without_bloom`]
    /// each frame (caller contract, not enforced here).
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.scene.view
    }

    /// Current scene buffer dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reallocate buffer storage for a new output size. All four buffers
    /// and their dependent bind groups are rebuilt before returning, so the
    /// next composite call never samples mismatched dimensions.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;

        let (scene, bright, ping, blur_buffers) =
            Self::create_buffers(device, width, height);
        self.scene = scene;
        self.bright = bright;
        self.ping = ping;
        self.blur_buffers = blur_buffers;

        self.extract_bind_group = Self::create_extract_bind_group(
            device,
            &self.extract_layout,
            &self.scene.view,
            &self.sampler,
            &self.extract_buffer,
        );
        self.blur_bind_groups = Self::create_blur_bind_groups(
            device,
            &self.blur_layout,
            &self.bright,
            &self.ping,
            &self.sampler,
            &self.blur_buffers,
        );
        self.composite_bind_group = Self::create_composite_bind_group(
            device,
            &self.composite_layout,
            &self.scene.view,
            &self.ping[final_ping_index(BLUR_PASS_COUNT)].view,
            &self.sampler,
            &self.composite_buffer,
        );

        log::debug!("bloom buffers resized to {width}x{height}");
    }

    /// Run the full chain: extract bright regions at half resolution, blur
    /// them with [`BLUR_PASS_COUNT`] alternating separable passes, then
    /// tone-map scene + bloom into `output_view` at full resolution.
    ///
    /// The composite uniform is staged with `Queue::write_buffer`, which
    /// lands at the start of the next submission - so at most one composite
    /// call ([`Self::apply_bloom`] or [`Self::render_without_bloom`]) may be
    /// recorded per submission, or the later uniform write wins for both.
    pub fn apply_bloom(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        params: &BloomParams,
        output_view: &wgpu::TextureView,
    ) {
        queue.write_buffer(
            &self.extract_buffer,
            0,
            bytemuck::cast_slice(&[ExtractUniform::from_params(params)]),
        );
        queue.write_buffer(
            &self.composite_buffer,
            0,
            bytemuck::cast_slice(&[CompositeUniform::with_bloom(
                params, self.gamma,
            )]),
        );

        // Pass 1: bright extraction into the half-res bright buffer
        fullscreen_pass(
            encoder,
            "Bloom Extract Pass",
            &self.bright.view,
            &self.extract_pipeline,
            &self.extract_bind_group,
        );

        // Pass 2: alternating separable blur. The first pass reads bright
        // and writes ping 1; every later pass reads the buffer written two
        // steps earlier. With an even pass count the result lands in ping 0.
        let mut horizontal = true;
        for i in 0..BLUR_PASS_COUNT {
            let route = if i == 0 {
                BLUR_ROUTE_FROM_BRIGHT
            } else if horizontal {
                BLUR_ROUTE_FROM_PING0
            } else {
                BLUR_ROUTE_FROM_PING1
            };
            let target = &self.ping[usize::from(horizontal)].view;
            fullscreen_pass(
                encoder,
                "Bloom Blur Pass",
                target,
                &self.blur_pipeline,
                &self.blur_bind_groups[route],
            );
            horizontal = !horizontal;
        }

        // Pass 3: composite scene + blurred bloom, tone-mapped
        fullscreen_pass(
            encoder,
            "Bloom Composite Pass",
            output_view,
            &self.composite_pipeline,
            &self.composite_bind_group,
        );
    }

    /// Tone-map the scene buffer into `output_view` with the bloom
    /// contribution forced to zero. The ping buffer stays bound (weighted
    /// to zero, never meaningfully read), so threshold/intensity/strength
    /// values cannot affect the output - only exposure does.
    ///
    /// Shares the composite uniform with [`Self::apply_bloom`]; see the
    /// one-composite-call-per-submission note there.
    pub fn render_without_bloom(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        params: &BloomParams,
        output_view: &wgpu::TextureView,
    ) {
        queue.write_buffer(
            &self.composite_buffer,
            0,
            bytemuck::cast_slice(&[CompositeUniform::without_bloom(
                params, self.gamma,
            )]),
        );
        fullscreen_pass(
            encoder,
            "Tone Map Pass",
            output_view,
            &self.composite_pipeline,
            &self.composite_bind_group,
        );
    }
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

#[cfg(test)]
mod tests {
    use super::{
        final_ping_index, half_extent, BloomParams, BloomPipeline,
        CompositeUniform, ExtractUniform, BLUR_PASS_COUNT,
    };
    use crate::gpu::test_support;

    #[test]
    fn uniform_builders_mirror_params() {
        // The construction-time uniform contents are built from
        // BloomParams::default() through these same builders, so a default
        // change cannot diverge from what the first frame draws with.
        let params = BloomParams {
            threshold: 1.3,
            intensity: 2.0,
            strength: 0.7,
            exposure: 1.6,
            enabled: true,
        };
        let extract = ExtractUniform::from_params(&params);
        assert_eq!(extract.threshold, 1.3);
        assert_eq!(extract.intensity, 2.0);
        let composite = CompositeUniform::with_bloom(&params, 1.0);
        assert_eq!(composite.bloom_strength, 0.7);
        assert_eq!(composite.exposure, 1.6);
    }

    #[test]
    fn even_pass_counts_end_in_ping_zero() {
        for count in [2, 4, 6, 8] {
            assert_eq!(final_ping_index(count), 0);
        }
    }

    #[test]
    fn odd_pass_counts_end_in_ping_one() {
        for count in [1, 3, 5, 7] {
            assert_eq!(final_ping_index(count), 1);
        }
    }

    #[test]
    fn configured_pass_count_is_even() {
        // The composite bind group is built from final_ping_index; this
        // guards against a pass-count change silently moving the result.
        assert_eq!(BLUR_PASS_COUNT % 2, 0);
    }

    #[test]
    fn half_extent_floors_and_clamps() {
        assert_eq!(half_extent(1280, 720), (640, 360));
        assert_eq!(half_extent(1281, 721), (640, 360));
        assert_eq!(half_extent(1, 1), (1, 1));
        assert_eq!(half_extent(3, 5), (1, 2));
    }

    #[test]
    fn tone_map_only_uniform_ignores_bloom_params() {
        let a = BloomParams {
            threshold: 0.1,
            intensity: 9.0,
            strength: 3.0,
            exposure: 1.5,
            enabled: true,
        };
        let b = BloomParams {
            threshold: 2.0,
            intensity: 0.0,
            strength: 0.0,
            exposure: 1.5,
            enabled: false,
        };
        let ua = CompositeUniform::without_bloom(&a, 1.0);
        let ub = CompositeUniform::without_bloom(&b, 1.0);
        assert_eq!(ua.bloom_strength, 0.0);
        assert_eq!(ua.bloom_strength, ub.bloom_strength);
        assert_eq!(ua.exposure, ub.exposure);
    }

    #[test]
    fn exposure_stays_live_without_bloom() {
        let params = BloomParams {
            exposure: 2.5,
            ..Default::default()
        };
        assert_eq!(CompositeUniform::without_bloom(&params, 1.0).exposure, 2.5);
    }

    #[test]
    fn resize_keeps_dependents_at_half_scene_size() {
        let Some((device, queue)) = test_support::device() else {
            return;
        };
        drop(queue);
        let mut bloom = BloomPipeline::new(
            &device,
            1280,
            720,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        for (w, h) in [(1920, 1080), (333, 777), (2, 3), (1280, 720)] {
            bloom.resize(&device, w, h);
            let (half_w, half_h) = half_extent(w, h);
            assert_eq!(bloom.scene.width(), w);
            assert_eq!(bloom.scene.height(), h);
            assert_eq!(bloom.bright.width(), half_w);
            assert_eq!(bloom.bright.height(), half_h);
            for p in &bloom.ping {
                assert_eq!(p.width(), half_w);
                assert_eq!(p.height(), half_h);
            }
        }
    }

    /// Flat mid-gray scene with a threshold above any pixel: the bright
    /// buffer must come out entirely zero, and the bloom composite must
    /// match the tone-map-only output.
    #[test]
    fn threshold_above_scene_produces_no_bloom() {
        let Some((device, queue)) = test_support::device() else {
            return;
        };
        let bloom = BloomPipeline::new(
            &device,
            160,
            90,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let params = BloomParams {
            threshold: 2.0,
            ..Default::default()
        };

        // Flat 0.5 gray scene
        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor::default(),
        );
        {
            let _pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Flat Scene"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: bloom.scene_view(),
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: 0.5,
                                    g: 0.5,
                                    b: 0.5,
                                    a: 1.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: None,
                    ..Default::default()
                });
        }

        let with_bloom = crate::gpu::texture::RenderTarget::new(
            &device,
            "With Bloom",
            160,
            90,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let without_bloom = crate::gpu::texture::RenderTarget::new(
            &device,
            "Without Bloom",
            160,
            90,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        // One submission per composite call: the staged uniform writes land
        // at the start of the next submit, so recording both paths into one
        // encoder would run both with the last-written uniform.
        bloom.apply_bloom(&mut encoder, &queue, &params, &with_bloom.view);
        let _ = queue.submit(std::iter::once(encoder.finish()));

        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor::default(),
        );
        bloom.render_without_bloom(
            &mut encoder,
            &queue,
            &params,
            &without_bloom.view,
        );
        let _ = queue.submit(std::iter::once(encoder.finish()));

        // Bright buffer: every f16 texel decodes to 0 (alpha is 1)
        let bright_bytes = test_support::read_texture_bytes(
            &device,
            &queue,
            &bloom.bright.texture,
            8,
        )
        .unwrap();
        for texel in bright_bytes.chunks_exact(8) {
            for channel in texel[..6].chunks_exact(2) {
                let v = half::f16::from_le_bytes([channel[0], channel[1]]);
                assert_eq!(v.to_f32(), 0.0);
            }
        }

        // Composite output equals the tone-map-only output within rounding
        let a = test_support::read_texture_bytes(
            &device,
            &queue,
            &with_bloom.texture,
            4,
        )
        .unwrap();
        let b = test_support::read_texture_bytes(
            &device,
            &queue,
            &without_bloom.texture,
            4,
        )
        .unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(x.abs_diff(*y) <= 1);
        }
    }

    /// Positive control for the equality check above: with the threshold
    /// below the scene brightness, the bloom composite must visibly differ
    /// from the tone-map-only output.
    #[test]
    fn bloom_brightens_above_threshold() {
        let Some((device, queue)) = test_support::device() else {
            return;
        };
        let bloom = BloomPipeline::new(
            &device,
            160,
            90,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let params = BloomParams {
            threshold: 0.0,
            strength: 1.0,
            ..Default::default()
        };

        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor::default(),
        );
        {
            let _pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Flat Scene"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: bloom.scene_view(),
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: 0.5,
                                    g: 0.5,
                                    b: 0.5,
                                    a: 1.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: None,
                    ..Default::default()
                });
        }

        let with_bloom = crate::gpu::texture::RenderTarget::new(
            &device,
            "With Bloom",
            160,
            90,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let without_bloom = crate::gpu::texture::RenderTarget::new(
            &device,
            "Without Bloom",
            160,
            90,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        bloom.apply_bloom(&mut encoder, &queue, &params, &with_bloom.view);
        let _ = queue.submit(std::iter::once(encoder.finish()));

        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor::default(),
        );
        bloom.render_without_bloom(
            &mut encoder,
            &queue,
            &params,
            &without_bloom.view,
        );
        let _ = queue.submit(std::iter::once(encoder.finish()));

        let a = test_support::read_texture_bytes(
            &device,
            &queue,
            &with_bloom.texture,
            4,
        )
        .unwrap();
        let b = test_support::read_texture_bytes(
            &device,
            &queue,
            &without_bloom.texture,
            4,
        )
        .unwrap();
        let differing = a
            .iter()
            .zip(b.iter())
            .filter(|(x, y)| x.abs_diff(**y) > 1)
            .count();
        assert!(differing > 0, "bloom contribution had no visible effect");
    }
}
