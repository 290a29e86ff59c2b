//! Observed input frame-rate measurement.
//!
//! Grounded on the reference's startup calibration pass: the first 100
//! frames read from the source are timestamped, and the rate is derived
//! from the wall-clock span between the first and the last. This module
//! only measures and exposes the result; deciding whether to throttle
//! reads against a configured `input_fps`/`full_fps`/`crop_fps` is left to
//! the frame-source adapter.

use std::time::Instant;

const SAMPLE_FRAMES: usize = 100;

/// Accumulates timestamps for the first [`SAMPLE_FRAMES`] frames and
/// derives an observed rate once enough samples have arrived.
pub struct FpsEstimator {
    first: Option<Instant>,
    last: Option<Instant>,
    count: usize,
    observed: Option<f64>,
}

impl FpsEstimator {
    pub fn new() -> Self {
        FpsEstimator {
            first: None,
            last: None,
            count: 0,
            observed: None,
        }
    }

    /// Record the arrival of a frame. Once [`SAMPLE_FRAMES`] frames have
    /// been recorded, this fixes the observed rate for good; further calls
    /// are no-ops.
    pub fn record(&mut self, now: Instant) {
        if self.observed.is_some() {
            return;
        }
        if self.first.is_none() {
            self.first = Some(now);
        }
        self.last = Some(now);
        self.count += 1;

        if self.count >= SAMPLE_FRAMES {
            let span = now.duration_since(self.first.unwrap()).as_secs_f64();
            let intervals = (self.count - 1) as f64;
            self.observed = Some(if intervals > 0.0 && span > 0.0 {
                intervals / span
            } else {
                0.0
            });
        }
    }

    /// The observed rate, once [`SAMPLE_FRAMES`] frames have been seen.
    pub fn observed_fps(&self) -> Option<f64> {
        self.observed
    }

    pub fn is_settled(&self) -> bool {
        self.observed.is_some()
    }
}

impl Default for FpsEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn stays_unsettled_before_the_sample_window_fills() {
        let mut est = FpsEstimator::new();
        let start = Instant::now();
        for i in 0..50 {
            est.record(start + Duration::from_millis(i * 33));
        }
        assert!(!est.is_settled());
        assert_eq!(est.observed_fps(), None);
    }

    #[test]
    fn derives_rate_from_evenly_spaced_frames() {
        let mut est = FpsEstimator::new();
        let start = Instant::now();
        for i in 0..SAMPLE_FRAMES {
            // 30 fps: one frame every 1/30 s.
            est.record(start + Duration::from_secs_f64(i as f64 / 30.0));
        }
        let fps = est.observed_fps().expect("should have settled");
        assert!((fps - 30.0).abs() < 1e-6);
    }

    #[test]
    fn locks_the_rate_once_settled() {
        let mut est = FpsEstimator::new();
        let start = Instant::now();
        for i in 0..SAMPLE_FRAMES {
            est.record(start + Duration::from_secs_f64(i as f64 / 30.0));
        }
        let locked = est.observed_fps().unwrap();
        // A wildly different gap after settling must not move the estimate.
        est.record(start + Duration::from_secs(1000));
        assert_eq!(est.observed_fps(), Some(locked));
    }
}
