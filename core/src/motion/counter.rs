//! Motion-pixel counting, breathing-rate peak detection, and the
//! sustained-absence alarm timer.
//!
//! Grounded on `MotionDetection.cpp::countNumChanges`/`calculatePeriod`. The
//! reference keeps all of this state in function-local statics; here it is
//! owned explicitly by [`MotionCounter`].

use std::time::{Duration, Instant};

const EWMA_ALPHA: f64 = 0.3;
const RATE_ALPHA: f64 = 0.4;
const MIN_PEAK_INTERVAL: Duration = Duration::from_millis(400);

pub struct MotionCounter {
    pixel_threshold: usize,
    motion_duration: u32,
    time_to_alarm: Duration,

    duration: u32,
    ewma: f64,
    last_ewma: f64,
    was_rising: bool,

    breathing_rate: f64,
    last_peak_time: Option<Instant>,

    no_movement_detected: bool,
    last_zero_start: Option<Instant>,
}

/// Result of a single motion-counting step, surfaced to telemetry.
#[derive(Debug, Clone, Copy)]
pub struct MotionTick {
    pub changed_pixels: usize,
    pub breathing_rate: f64,
    pub alarm: bool,
}

impl MotionCounter {
    pub fn new(pixel_threshold: usize, motion_duration: u32, time_to_alarm: Duration) -> Self {
        MotionCounter {
            pixel_threshold,
            motion_duration,
            time_to_alarm,
            duration: 0,
            ewma: 0.0,
            last_ewma: 0.0,
            was_rising: true,
            breathing_rate: 1.0,
            last_peak_time: None,
            no_movement_detected: false,
            last_zero_start: None,
        }
    }

    pub fn breathing_rate(&self) -> f64 {
        self.breathing_rate
    }

    /// Pre-erode `evaluation` with a fixed 2x2 kernel, count surviving
    /// pixels, and update the EWMA/peak/alarm state machine. `now` is the
    /// caller's monotonic clock reading for this frame.
    pub fn tick(&mut self, evaluation: &[bool], width: usize, height: usize, now: Instant) -> MotionTick {
        let eroded = crate::imgproc::erode(evaluation, width, height, 2);
        let count = eroded.iter().filter(|&&v| v).count();

        if count >= self.pixel_threshold {
            self.duration += 1;
        } else if self.duration > 0 {
            self.duration -= 1;
        }

        if self.duration >= self.motion_duration {
            self.ewma = EWMA_ALPHA * count as f64 + (1.0 - EWMA_ALPHA) * self.ewma;
            if self.ewma < self.last_ewma && self.was_rising {
                self.calculate_period(now);
                self.was_rising = false;
            } else if self.ewma > self.last_ewma && !self.was_rising {
                self.was_rising = true;
            }
            self.last_ewma = self.ewma;
            self.no_movement_detected = false;
        }

        let alarm = self.update_alarm(now);

        MotionTick {
            changed_pixels: count,
            breathing_rate: self.breathing_rate,
            alarm,
        }
    }

    fn calculate_period(&mut self, now: Instant) {
        if let Some(last) = self.last_peak_time {
            let period = now.duration_since(last);
            if period > MIN_PEAK_INTERVAL {
                let new_rate = 1.0 / period.as_secs_f64();
                self.breathing_rate = RATE_ALPHA * new_rate + (1.0 - RATE_ALPHA) * self.breathing_rate;
            }
        }
        self.last_peak_time = Some(now);
    }

    fn update_alarm(&mut self, now: Instant) -> bool {
        if self.no_movement_detected {
            if let Some(start) = self.last_zero_start {
                now.duration_since(start) >= self.time_to_alarm
            } else {
                false
            }
        } else {
            self.no_movement_detected = true;
            self.last_zero_start = Some(now);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breathing_rate_stays_within_bounds_for_periodic_motion() {
        let mut counter = MotionCounter::new(5, 1, Duration::from_secs(10));
        let width = 10;
        let height = 10;
        let start = Instant::now();
        let mut mask = vec![true; width * height];

        // Drive several synthetic "breaths" at ~0.5s intervals.
        for i in 0..20 {
            let now = start + Duration::from_millis(i * 500);
            for v in mask.iter_mut() {
                *v = i % 2 == 0;
            }
            counter.tick(&mask, width, height, now);
        }
        assert!(counter.breathing_rate() >= 0.0);
        assert!(counter.breathing_rate() <= 2.5);
    }

    #[test]
    fn alarm_fires_only_after_time_to_alarm_of_silence() {
        let mut counter = MotionCounter::new(5, 1, Duration::from_millis(500));
        let width = 10;
        let height = 10;
        let silent = vec![false; width * height];
        let start = Instant::now();

        let tick0 = counter.tick(&silent, width, height, start);
        assert!(!tick0.alarm);

        let tick1 = counter.tick(&silent, width, height, start + Duration::from_millis(100));
        assert!(!tick1.alarm);

        let tick2 = counter.tick(&silent, width, height, start + Duration::from_millis(600));
        assert!(tick2.alarm);
    }
}
