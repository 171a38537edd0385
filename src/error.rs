//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the umbra crate.
///
/// Initialization failures ([`UmbraError::Gpu`]) are fatal: the caller cannot
/// render anything without a device, so startup should abort with the
/// diagnostic. Capture-time failures are recoverable - interactive rendering
/// continues and the export request simply reports the error.
#[derive(Debug)]
pub enum UmbraError {
    /// GPU context initialization failure (fatal).
    Gpu(RenderContextError),
    /// Offscreen capture failure (incomplete target, readback mapping).
    Capture(String),
    /// PNG encoding failure during export.
    Encode(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for UmbraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Capture(msg) => write!(f, "capture error: {msg}"),
            Self::Encode(msg) => write!(f, "image encode error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for UmbraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for UmbraError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for UmbraError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
