//! The full Riesz pyramid: an ordered stack of [`level::PyramidLevel`]s
//! built and collapsed the way a Laplacian pyramid is, with the Riesz
//! machinery layered onto each octave.

pub mod level;

use crate::bandpass::BandPass;
use crate::frame::LumaPlane;
use crate::imgproc;
use level::PyramidLevel;

/// Largest number of octaves such that every level stays larger than 5x5,
/// mirroring the reference's `countLevels`.
fn count_levels(width: usize, height: usize) -> usize {
    let mut levels = 1;
    let (mut w, mut h) = (width, height);
    while w / 2 > 5 && h / 2 > 5 {
        w /= 2;
        h /= 2;
        levels += 1;
    }
    levels
}

pub struct RieszPyramid {
    pub levels: Vec<PyramidLevel>,
}

impl RieszPyramid {
    /// Allocate and build levels from a first frame.
    pub fn initialize(frame: &LumaPlane) -> Self {
        let num_levels = count_levels(frame.width, frame.height);
        let mut levels = Vec::with_capacity(num_levels);
        let mut octave = frame.clone();
        for _ in 0..num_levels {
            levels.push(PyramidLevel::new(octave.width, octave.height));
        }
        let mut pyramid = RieszPyramid { levels };
        pyramid.build(frame);
        pyramid
    }

    /// Rebuild every level's `lp`/`r` from a fresh frame.
    pub fn build(&mut self, frame: &LumaPlane) {
        let mut octave = frame.clone();
        let last = self.levels.len() - 1;
        for i in 0..self.levels.len() {
            if i == last {
                self.levels[i].build(octave);
                break;
            }
            let down = imgproc::pyr_down(&octave);
            let up = imgproc::pyr_up(&down, octave.width, octave.height);
            let detail = subtract(&octave, &up);
            self.levels[i].build(detail);
            octave = down;
        }
    }

    /// Unwrap oriented phase at every level but the deepest (the DC
    /// residual is never amplified, so its phase is never used).
    pub fn unwrap_orient_phase(&mut self, prior: &RieszPyramid) {
        let last = self.levels.len() - 1;
        for i in 0..last {
            self.levels[i].unwrap_orient_phase(&prior.levels[i]);
        }
    }

    pub fn amplify(&mut self, alpha: f32, threshold_rad: f32) {
        let last = self.levels.len() - 1;
        for level in self.levels[..last].iter_mut() {
            level.amplify(alpha, threshold_rad);
        }
    }

    /// Collapse the pyramid back into a single plane.
    pub fn collapse(&self) -> LumaPlane {
        let last = self.levels.len() - 1;
        let mut result = self.levels[last].lp.clone();
        let mut i = last;
        while i > 0 {
            i -= 1;
            let up = imgproc::pyr_up(&result, self.levels[i].width, self.levels[i].height);
            result = add(&up, &self.levels[i].lp);
        }
        result
    }

    /// Advance `self` to become the new `prior`: copy `lp`, `r`, `phase`
    /// from `current`, level by level. Filter states are untouched.
    pub fn assign_from(&mut self, current: &RieszPyramid) {
        for (dst, src) in self.levels.iter_mut().zip(current.levels.iter()) {
            dst.assign_from(src);
        }
    }
}

fn subtract(a: &LumaPlane, b: &LumaPlane) -> LumaPlane {
    let mut out = a.clone();
    for (o, &bv) in out.data.iter_mut().zip(b.data.iter()) {
        *o -= bv;
    }
    out
}

fn add(a: &LumaPlane, b: &LumaPlane) -> LumaPlane {
    let mut out = a.clone();
    for (o, &bv) in out.data.iter_mut().zip(b.data.iter()) {
        *o += bv;
    }
    out
}

/// Drive a full band-pass + shift pass across a pyramid pair, mirroring
/// `RieszTemporalBandpass::filterPyramids`: every non-deepest level is
/// filtered and shifted; the deepest level is only shifted.
pub fn filter_pyramids(current: &mut RieszPyramid, prior: &mut RieszPyramid, band: &BandPass) {
    let last = current.levels.len() - 1;
    for i in 0..last {
        let prior_level = prior.levels[i].clone();
        current.levels[i].filter(band.filters(), &prior_level);
    }
    prior.assign_from(current);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_levels_stops_above_five_pixels() {
        assert_eq!(count_levels(640, 480), 7);
        assert_eq!(count_levels(10, 10), 1);
        assert_eq!(count_levels(8, 480), 1);
    }

    #[test]
    fn round_trip_reconstructs_constant_plane() {
        let frame = LumaPlane {
            width: 64,
            height: 64,
            data: vec![0.4; 64 * 64],
        };
        let pyramid = RieszPyramid::initialize(&frame);
        let collapsed = pyramid.collapse();
        for &v in &collapsed.data {
            assert!((v - 0.4).abs() < 1e-2);
        }
    }

    #[test]
    fn deepest_level_is_never_amplified() {
        let frame = LumaPlane {
            width: 64,
            height: 64,
            data: (0..64 * 64).map(|i| (i % 7) as f32 / 7.0).collect(),
        };
        let mut pyramid = RieszPyramid::initialize(&frame);
        let last = pyramid.levels.len() - 1;
        let before = pyramid.levels[last].lp.clone();
        pyramid.amplify(50.0, 1.0);
        assert_eq!(pyramid.levels[last].lp.data, before.data);
    }
}
