//! Camera frame-source boundary.
//!
//! Driving a real V4L2 device is hardware-specific glue outside what a
//! portable crate can own; this type exists so the rest of the pipeline has
//! a concrete `FrameSource` to depend on, and fails fast and clearly when
//! asked to actually open a device.

use riesz_breath_core::Frame;

use crate::{FrameSource, SourceError};

pub struct CameraFrameSource {
    width: usize,
    height: usize,
}

impl CameraFrameSource {
    /// Always fails: this crate does not implement a V4L2/camera backend.
    /// The signature exists so callers can select `CameraFrameSource` or
    /// `Y4mFrameSource` behind the same `FrameSource` trait and get a clear
    /// error rather than a missing type.
    pub fn open(_camera_id: i32, width: usize, height: usize) -> Result<Self, SourceError> {
        let _ = (width, height);
        log::warn!("camera capture requested but not implemented by this crate");
        Err(SourceError::Open(
            "camera capture is not implemented by this crate; provide a file input instead, \
             or wire up a platform-specific FrameSource"
                .into(),
        ))
    }
}

impl FrameSource for CameraFrameSource {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        log::warn!("read() called on an unimplemented CameraFrameSource");
        Err(SourceError::Read("camera capture is not implemented by this crate".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_always_fails_fast() {
        assert!(CameraFrameSource::open(0, 320, 240).is_err());
    }
}
