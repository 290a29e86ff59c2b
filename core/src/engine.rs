//! The per-worker magnifier engine: wraps a current/prior pyramid pair, a
//! band-pass, and the amplification parameters, and exposes the single
//! `transform` entry point the dispatcher calls once per frame per worker.
//!
//! Grounded on `RieszTransform::transform`/`initialize` from the reference.

use crate::bandpass::BandPass;
use crate::error::MagnifierError;
use crate::frame::{Frame, FrameView, LumaPlane};
use crate::pyramid::{filter_pyramids, RieszPyramid};

const PI_PERCENT: f32 = std::f32::consts::PI / 100.0;

pub struct MagnifierEngine {
    band: BandPass,
    alpha: f32,
    threshold: f32,
    state: Option<PyramidPair>,
}

struct PyramidPair {
    current: RieszPyramid,
    prior: RieszPyramid,
}

impl MagnifierEngine {
    pub fn new(fps: f64, low_cut: f64, high_cut: f64, alpha: f32, threshold: f32) -> Result<Self, MagnifierError> {
        Ok(MagnifierEngine {
            band: BandPass::new(fps, low_cut, high_cut)?,
            alpha,
            threshold,
            state: None,
        })
    }

    pub fn band_mut(&mut self) -> &mut BandPass {
        &mut self.band
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Re-initialize from a frame of (possibly new) size, discarding all
    /// carried pyramid state. Used when the dispatcher resizes workers
    /// around an adaptive-crop transition.
    pub fn reinitialize(&mut self, frame: FrameView<'_>) {
        let luma = frame.to_luma_f32();
        self.state = Some(PyramidPair {
            current: RieszPyramid::initialize(&luma),
            prior: RieszPyramid::initialize(&luma),
        });
    }

    /// Process one frame band. On the very first call (or right after a
    /// `reinitialize`), returns the input frame unchanged while both
    /// pyramids warm up — matching the reference's identity-on-first-frame
    /// behavior.
    pub fn transform(&mut self, frame: FrameView<'_>) -> Frame {
        let luma = frame.to_luma_f32();

        let pair = match self.state.as_mut() {
            Some(pair) => pair,
            None => {
                self.state = Some(PyramidPair {
                    current: RieszPyramid::initialize(&luma),
                    prior: RieszPyramid::initialize(&luma),
                });
                return frame.to_owned();
            }
        };

        pair.current.build(&luma);
        pair.current.unwrap_orient_phase(&pair.prior);
        filter_pyramids(&mut pair.current, &mut pair.prior, &self.band);
        pair.current.amplify(self.alpha, self.threshold * PI_PERCENT);

        let collapsed: LumaPlane = pair.current.collapse();
        let mut out = frame.to_owned();
        out.replace_luma(&collapsed);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn gray_frame(width: usize, height: usize, value: u8) -> Frame {
        Frame::from_rgb(width, height, vec![value; width * height * 3]).unwrap()
    }

    #[test]
    fn first_frame_is_returned_unchanged() {
        let mut engine = MagnifierEngine::new(30.0, 0.5, 1.0, 20.0, 25.0).unwrap();
        let frame = gray_frame(32, 32, 128);
        let out = engine.transform(frame.view());
        assert_eq!(out.data, frame.data);
    }

    #[test]
    fn zero_alpha_keeps_constant_frames_close_to_input() {
        let mut engine = MagnifierEngine::new(30.0, 0.5, 1.0, 0.0, 0.0).unwrap();
        let frame = gray_frame(32, 32, 128);
        let _ = engine.transform(frame.view());
        for _ in 0..5 {
            let out = engine.transform(frame.view());
            for (&a, &b) in out.data.iter().zip(frame.data.iter()) {
                assert!((a as i32 - b as i32).abs() <= 2);
            }
        }
    }
}
