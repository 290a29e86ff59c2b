//! Frame-source and frame-sink adapters for `riesz-breath-core`.
//!
//! Mirrors `av_metrics_decoders`'s shape: a small trait plus feature-gated
//! concrete implementations, so the CLI can depend on just the adapters it
//! needs.

pub mod camera;
#[cfg(feature = "y4m-decode")]
pub mod sink;
#[cfg(feature = "y4m-decode")]
pub mod y4m_source;

use riesz_breath_core::Frame;
use thiserror::Error;

#[cfg(feature = "y4m-decode")]
pub use crate::sink::Y4mFrameSink;
#[cfg(feature = "y4m-decode")]
pub use crate::y4m_source::Y4mFrameSource;
pub use crate::camera::CameraFrameSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open frame source: {0}")]
    Open(String),
    #[error("failed to read a frame: {0}")]
    Read(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write a frame: {0}")]
    Write(String),
}

/// A blocking source of frames. `read()` returns `Ok(None)` at a clean
/// end-of-stream; any I/O failure is `Err`.
pub trait FrameSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn read(&mut self) -> Result<Option<Frame>, SourceError>;
}

/// A blocking sink for processed frames.
pub trait FrameSink {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError>;
}
