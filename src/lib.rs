// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Procedural black-hole scene baking and HDR compositing engine built on
//! wgpu.
//!
//! Umbra renders a raymarched black hole into high-dynamic-range offscreen
//! buffers and composites it through a bright-pass / separable-blur / tone-map
//! bloom chain. The expensive inputs are baked once at startup:
//!
//! - [`noise::NoiseVolume`] - a deterministic 3D simplex-noise RGBA volume,
//!   synthesized on the CPU and uploaded as a repeat-wrapping 3D texture,
//! - [`starfield::StarfieldCubemap`] - a six-face environment cubemap rendered
//!   offscreen, one directional generator pass per face.
//!
//! Per frame, [`scene::SceneRenderer`] fills the scene buffer owned by
//! [`bloom::BloomPipeline`], which then runs the three-stage bloom chain (or a
//! plain tone-map pass when bloom is disabled). [`exporter::FrameExporter`]
//! re-renders the scene at an arbitrary resolution into its own buffers and
//! writes a timestamped PNG, fully decoupled from the live frame.
//!
//! Window creation, input handling and UI are external collaborators; the
//! crate itself is headless (see [`gpu::render_context::RenderContext`]).

pub mod bloom;
pub mod error;
pub mod exporter;
pub mod gpu;
pub mod noise;
pub mod options;
pub mod scene;
pub mod starfield;
