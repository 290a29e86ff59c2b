//! Y4M file frame-sink, mirroring [`crate::y4m_source::Y4mFrameSource`].

use std::fs::File;
use std::io::BufWriter;

use riesz_breath_core::Frame;

use crate::{FrameSink, SinkError};

pub struct Y4mFrameSink {
    inner: y4m::Encoder<BufWriter<File>>,
    width: usize,
    height: usize,
}

impl Y4mFrameSink {
    pub fn create(path: &str, width: usize, height: usize, fps_num: usize, fps_den: usize) -> Result<Self, SinkError> {
        let file = File::create(path).map_err(|e| {
            log::error!("failed to create y4m output '{path}': {e}");
            SinkError::Write(e.to_string())
        })?;
        let inner = y4m::encode(width, height, y4m::Ratio::new(fps_num, fps_den))
            .write_header(BufWriter::new(file))
            .map_err(|e| {
                log::error!("failed to write y4m header to '{path}': {e}");
                SinkError::Write(e.to_string())
            })?;
        Ok(Y4mFrameSink { inner, width, height })
    }
}

impl FrameSink for Y4mFrameSink {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        let (y, u, v) = rgb_frame_to_yuv(frame, self.width, self.height);
        let y4m_frame = y4m::Frame::new([&y, &u, &v], None);
        self.inner.write_frame(&y4m_frame).map_err(|e| {
            log::error!("failed to write a y4m frame: {e}");
            SinkError::Write(e.to_string())
        })
    }
}

fn rgb_frame_to_yuv(frame: &Frame, width: usize, height: usize) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let chroma_width = (width + 1) / 2;
    let chroma_height = (height + 1) / 2;
    let mut y_plane = vec![0u8; width * height];
    let mut u_plane = vec![128u8; chroma_width * chroma_height];
    let mut v_plane = vec![128u8; chroma_width * chroma_height];

    for row in 0..height {
        for col in 0..width {
            let px = &frame.data[(row * width + col) * 3..][..3];
            let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
            let y = 0.299 * r + 0.587 * g + 0.114 * b;
            y_plane[row * width + col] = y.round().clamp(0.0, 255.0) as u8;

            if row % 2 == 0 && col % 2 == 0 {
                let u = -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0;
                let v = 0.5 * r - 0.418688 * g - 0.081312 * b + 128.0;
                let idx = (row / 2) * chroma_width + col / 2;
                u_plane[idx] = u.round().clamp(0.0, 255.0) as u8;
                v_plane[idx] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    (y_plane, u_plane, v_plane)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_frame_yields_neutral_chroma() {
        let frame = Frame::from_rgb(4, 4, vec![128u8; 4 * 4 * 3]).unwrap();
        let (y, u, v) = rgb_frame_to_yuv(&frame, 4, 4);
        assert!(y.iter().all(|&v| (v as i32 - 128).abs() <= 1));
        assert!(u.iter().all(|&c| c == 128));
        assert!(v.iter().all(|&c| c == 128));
    }

    #[test]
    fn plane_sizes_match_width_height_and_subsampled_chroma() {
        let frame = Frame::from_rgb(5, 3, vec![0u8; 5 * 3 * 3]).unwrap();
        let (y, u, v) = rgb_frame_to_yuv(&frame, 5, 3);
        assert_eq!(y.len(), 15);
        assert_eq!(u.len(), 3 * 2);
        assert_eq!(v.len(), 3 * 2);
    }
}
