//! Y4M file frame-source.
//!
//! Grounded on `av_metrics_decoders::Y4MDecoder`: a thin wrapper around the
//! `y4m` crate's decoder, converting its planar output into this crate's
//! packed-RGB [`Frame`].

use std::fs::File;
use std::io::BufReader;

use riesz_breath_core::Frame;

use crate::{FrameSource, SourceError};

pub struct Y4mFrameSource {
    inner: y4m::Decoder<BufReader<File>>,
    width: usize,
    height: usize,
}

impl Y4mFrameSource {
    pub fn open(path: &str) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|e| {
            log::error!("failed to open y4m input '{path}': {e}");
            SourceError::Open(e.to_string())
        })?;
        let inner = y4m::decode(BufReader::new(file)).map_err(|e| {
            log::error!("failed to decode y4m header for '{path}': {e}");
            SourceError::Open(e.to_string())
        })?;
        let width = inner.get_width();
        let height = inner.get_height();
        Ok(Y4mFrameSource { inner, width, height })
    }

    pub fn frame_rate(&self) -> f64 {
        let ratio = self.inner.get_framerate();
        ratio.num as f64 / ratio.den as f64
    }
}

impl FrameSource for Y4mFrameSource {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        match self.inner.read_frame() {
            Ok(frame) => yuv_to_rgb_frame(&frame, self.width, self.height).map(Some),
            Err(y4m::Error::EOF) => Ok(None),
            Err(e) => {
                log::error!("failed to read a y4m frame: {e}");
                Err(SourceError::Read(e.to_string()))
            }
        }
    }
}

fn yuv_to_rgb_frame(frame: &y4m::Frame, width: usize, height: usize) -> Result<Frame, SourceError> {
    let data = yuv_planes_to_rgb(frame.get_y_plane(), frame.get_u_plane(), frame.get_v_plane(), width, height);
    Frame::from_rgb(width, height, data).map_err(|e| {
        log::error!("decoded y4m frame has the wrong shape: {e}");
        SourceError::Read(e.to_string())
    })
}

/// 4:2:0 planar YCbCr to packed RGB, BT.601-style coefficients. Split out
/// from [`yuv_to_rgb_frame`] so it can be exercised without a real y4m
/// decoder behind it.
fn yuv_planes_to_rgb(y_plane: &[u8], u_plane: &[u8], v_plane: &[u8], width: usize, height: usize) -> Vec<u8> {
    let chroma_width = (width + 1) / 2;
    let mut data = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        for col in 0..width {
            let y = y_plane[row * width + col] as f32;
            let cu = u_plane[(row / 2) * chroma_width + col / 2] as f32 - 128.0;
            let cv = v_plane[(row / 2) * chroma_width + col / 2] as f32 - 128.0;

            let r = (y + 1.402 * cv).round().clamp(0.0, 255.0) as u8;
            let g = (y - 0.344136 * cu - 0.714136 * cv).round().clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * cu).round().clamp(0.0, 255.0) as u8;
            data.push(r);
            data.push(g);
            data.push(b);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_chroma_reproduces_luma_as_gray() {
        // u=v=128 (neutral chroma) must round-trip luma to R=G=B=Y.
        let y = vec![0u8, 64, 128, 255];
        let u = vec![128u8; 1];
        let v = vec![128u8; 1];
        let rgb = yuv_planes_to_rgb(&y, &u, &v, 2, 2);
        for px in rgb.chunks(3) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
        assert_eq!(rgb[0], 0);
        assert_eq!(rgb[9], 255);
    }

    #[test]
    fn output_length_matches_width_height_times_three() {
        let y = vec![100u8; 16];
        let u = vec![128u8; 4];
        let v = vec![128u8; 4];
        let rgb = yuv_planes_to_rgb(&y, &u, &v, 4, 4);
        assert_eq!(rgb.len(), 4 * 4 * 3);
    }
}
