//! Headless frame capture tool.
//!
//! Renders one frame of the black hole scene without a window and writes it
//! to a PNG. Usage:
//!
//! ```text
//! umbra-capture [OPTIONS_TOML] [OUTPUT_PNG]
//! ```
//!
//! With no arguments, default options are used and a timestamped file lands
//! in the configured export directory. Logging goes through `env_logger`
//! (`RUST_LOG=umbra=debug` for verbose output).

use std::path::{Path, PathBuf};

use umbra::error::UmbraError;
use umbra::exporter::{CaptureRequest, FrameExporter};
use umbra::gpu::render_context::RenderContext;
use umbra::noise::NoiseVolume;
use umbra::options::Options;
use umbra::scene::SceneRenderer;
use umbra::starfield::StarfieldCubemap;

const NOISE_VOLUME_SIZE: u32 = 128;
const STARFIELD_FACE_RESOLUTION: u32 = 1024;

fn main() -> Result<(), UmbraError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let options = match args.next() {
        Some(path) => Options::load(Path::new(&path))?,
        None => Options::default(),
    };
    let output: Option<PathBuf> = args.next().map(PathBuf::from);

    let width = options.export.width;
    let height = options.export.height;
    log::info!("rendering {width}x{height} capture");

    let context = pollster::block_on(RenderContext::headless(width, height))?;
    let device = &context.device;
    let queue = &context.queue;

    let noise = NoiseVolume::bake(device, queue, NOISE_VOLUME_SIZE);
    let starfield =
        StarfieldCubemap::bake(device, queue, STARFIELD_FACE_RESOLUTION);
    let scene = SceneRenderer::new(device, &noise, &starfield);
    let mut exporter = FrameExporter::new(device);

    let scene_params = (&options.scene).into();
    let camera = (&options.camera).into();
    let request = CaptureRequest {
        scene: &scene,
        params: &scene_params,
        camera: &camera,
        exposure: options.bloom.exposure,
        width,
        height,
        time: 0.0,
    };

    let path = match output {
        Some(path) => {
            exporter.capture_to(device, queue, &request, &path)?;
            path
        }
        None => exporter.capture(
            device,
            queue,
            &request,
            &options.export.directory,
        )?,
    };
    log::info!("wrote {}", path.display());
    Ok(())
}
