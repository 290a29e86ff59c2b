//! Temporal band-pass coordinator.
//!
//! Grounded on `RieszTemporalBandpass`: two first-order low-pass filters
//! (`hi_cut`, `lo_cut`) whose difference forms the pass-band. Both filters
//! are redesigned whenever the sampling rate or either cutoff changes.

use crate::error::MagnifierError;
use crate::temporal_filter::TemporalFilter;

/// The pair of filters a [`crate::pyramid::level::PyramidLevel`] runs
/// against the prior frame's phase.
pub struct CutoffFilters {
    pub hi_cut: TemporalFilter,
    pub lo_cut: TemporalFilter,
}

pub struct BandPass {
    fps: f64,
    low_cut: f64,
    high_cut: f64,
    filters: CutoffFilters,
}

impl BandPass {
    pub fn new(fps: f64, low_cut: f64, high_cut: f64) -> Result<Self, MagnifierError> {
        if low_cut > high_cut {
            return Err(MagnifierError::InvalidFilter {
                order: 1,
                cutoff: low_cut,
            });
        }
        let half_fps = fps / 2.0;
        let hi_cut = TemporalFilter::new(high_cut, half_fps)?;
        let lo_cut = TemporalFilter::new(low_cut, half_fps)?;
        Ok(BandPass {
            fps,
            low_cut,
            high_cut,
            filters: CutoffFilters { hi_cut, lo_cut },
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn low_cut(&self) -> f64 {
        self.low_cut
    }

    pub fn high_cut(&self) -> f64 {
        self.high_cut
    }

    pub fn filters(&self) -> &CutoffFilters {
        &self.filters
    }

    pub fn set_fps(&mut self, fps: f64) -> Result<(), MagnifierError> {
        self.fps = fps;
        self.recompute()
    }

    /// Set both cutoffs together, validated as a pair. This sidesteps the
    /// reference's "set high before low" ordering hazard (each of its
    /// setters is validated only against the other's *current* value) by
    /// never exposing an intermediate, partially-updated state.
    pub fn set_cutoffs(&mut self, low_cut: f64, high_cut: f64) -> Result<(), MagnifierError> {
        if low_cut > high_cut {
            return Err(MagnifierError::InvalidFilter {
                order: 1,
                cutoff: low_cut,
            });
        }
        self.low_cut = low_cut;
        self.high_cut = high_cut;
        self.recompute()
    }

    fn recompute(&mut self) -> Result<(), MagnifierError> {
        let half_fps = self.fps / 2.0;
        self.filters.hi_cut = TemporalFilter::new(self.high_cut, half_fps)?;
        self.filters.lo_cut = TemporalFilter::new(self.low_cut, half_fps)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_low_cut_above_high_cut() {
        assert!(BandPass::new(30.0, 2.0, 1.0).is_err());
    }

    #[test]
    fn set_cutoffs_recomputes_both_filters() {
        let mut band = BandPass::new(30.0, 0.5, 1.0).unwrap();
        band.set_cutoffs(0.7, 1.2).unwrap();
        assert!((band.low_cut() - 0.7).abs() < 1e-12);
        assert!((band.high_cut() - 1.2).abs() < 1e-12);
        assert!((band.filters().hi_cut.frequency() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn set_fps_keeps_cutoffs_but_redesigns_filters() {
        let mut band = BandPass::new(30.0, 0.5, 1.0).unwrap();
        band.set_fps(15.0).unwrap();
        assert!((band.fps() - 15.0).abs() < 1e-12);
        assert!((band.low_cut() - 0.5).abs() < 1e-12);
    }
}
