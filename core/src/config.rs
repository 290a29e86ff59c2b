//! Validated engine configuration.
//!
//! Field set, defaults, and range checks are taken from
//! `original_source/src/CommandLine.{hpp,cpp}`'s `CommandLine` struct and
//! its INI-driven constructor, re-expressed as a single immutable value
//! produced through validation rather than a boolean `ok` flag plus a
//! side-printed usage message.

use std::time::Duration;

use crate::error::MagnifierError;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub frame_width: usize,
    pub frame_height: usize,

    pub input_fps: f64,
    pub full_fps: f64,
    pub crop_fps: f64,
    pub time_to_alarm: Duration,

    pub amplify: f32,
    pub low_cutoff: f64,
    pub high_cutoff: f64,
    pub threshold: f32,

    pub erode_dimension: usize,
    pub dilate_dimension: usize,
    pub diff_threshold: f32,
    pub motion_duration: u32,
    pub pixel_threshold: usize,

    pub crop: bool,
    pub frames_to_settle: u32,
    pub roi_window: u32,
    pub roi_update_interval: u32,

    /// Accepted for compatibility with the reference's `[motion] show_diff`
    /// toggle, which drove an `imshow` debug window. This crate is headless
    /// and has no window to show; kept so existing config files still load.
    pub show_diff: bool,
    /// Same story as `show_diff`, for `[magnification] show_magnification`.
    pub show_magnification: bool,
    pub print_times: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            frame_width: 320,
            frame_height: 240,
            input_fps: 30.0,
            full_fps: 30.0,
            crop_fps: 30.0,
            time_to_alarm: Duration::from_secs(120),
            amplify: 20.0,
            low_cutoff: 0.7,
            high_cutoff: 1.0,
            threshold: 50.0,
            erode_dimension: 3,
            dilate_dimension: 60,
            diff_threshold: 10.0 / 255.0,
            motion_duration: 1,
            pixel_threshold: 5,
            crop: false,
            frames_to_settle: 10,
            roi_window: 10,
            roi_update_interval: 100,
            show_diff: false,
            show_magnification: false,
            print_times: false,
        }
    }
}

impl EngineConfig {
    /// Apply the same range checks `CommandLine`'s constructor applies
    /// while reading its INI file, surfacing the first violation found.
    pub fn validate(&self) -> Result<(), MagnifierError> {
        if !(320..=1920).contains(&self.frame_width) {
            return Err(invalid("width", self.frame_width as f64));
        }
        if !(240..=1080).contains(&self.frame_height) {
            return Err(invalid("height", self.frame_height as f64));
        }
        if self.time_to_alarm.as_secs_f64() <= 1.0 {
            return Err(invalid("time_to_alarm", self.time_to_alarm.as_secs_f64()));
        }
        if !(0.0..=100.0).contains(&self.amplify) {
            return Err(invalid("amplify", self.amplify as f64));
        }
        if self.low_cutoff > self.high_cutoff {
            return Err(invalid("low-cutoff", self.low_cutoff));
        }
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(invalid("threshold", self.threshold as f64));
        }
        if self.erode_dimension == 0 || self.dilate_dimension == 0 {
            return Err(invalid("erode_dim/dilate_dim", 0.0));
        }
        if self.motion_duration == 0 {
            return Err(invalid("duration", self.motion_duration as f64));
        }
        if self.pixel_threshold == 0 {
            return Err(invalid("pixel_threshold", 0.0));
        }
        if self.frames_to_settle == 0 {
            return Err(invalid("frames_to_settle", 0.0));
        }
        if self.roi_window == 0 {
            return Err(invalid("roi_window", 0.0));
        }
        if self.roi_update_interval < self.roi_window {
            return Err(invalid("roi_update_interval", self.roi_update_interval as f64));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: f64) -> MagnifierError {
    MagnifierError::InvalidConfig {
        field: field.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_low_cutoff_above_high_cutoff() {
        let mut config = EngineConfig::default();
        config.low_cutoff = 2.0;
        config.high_cutoff = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_roi_update_interval_below_roi_window() {
        let mut config = EngineConfig::default();
        config.roi_window = 50;
        config.roi_update_interval = 10;
        assert!(config.validate().is_err());
    }
}
