//! INI configuration loading.
//!
//! Section names, keys, and defaults mirror
//! `original_source/src/CommandLine.cpp`'s `INIReader`-based constructor.

use std::time::Duration;

use ini::Ini;
use riesz_breath_core::EngineConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file '{path}': {source}")]
    Unreadable { path: String, source: String },
    #[error("'input' and 'camera' are mutually exclusive")]
    MutuallyExclusiveInputs,
    #[error("no 'input' file and no 'camera' id were given")]
    MissingInput,
    #[error("engine configuration rejected: {0}")]
    OutOfRange(#[from] riesz_breath_core::MagnifierError),
}

pub struct LoadedConfig {
    pub engine: EngineConfig,
    pub input_path: Option<String>,
    pub camera_id: Option<i32>,
}

pub fn load(path: &str) -> Result<LoadedConfig, ConfigError> {
    let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Unreadable {
        path: path.to_string(),
        source: e.to_string(),
    })?;
    load_from_ini(&ini)
}

fn load_from_ini(ini: &Ini) -> Result<LoadedConfig, ConfigError> {
    let io = ini.section(Some("io"));
    let magnification = ini.section(Some("magnification"));
    let motion = ini.section(Some("motion"));
    let cropping = ini.section(Some("cropping"));
    let debug = ini.section(Some("debug"));

    let get = |section: Option<&ini::Properties>, key: &str| section.and_then(|s| s.get(key)).map(str::to_owned);
    let get_f64 = |section: Option<&ini::Properties>, key: &str, default: f64| {
        get(section, key).and_then(|v| v.parse().ok()).unwrap_or(default)
    };
    let get_usize = |section: Option<&ini::Properties>, key: &str, default: usize| {
        get(section, key).and_then(|v| v.parse().ok()).unwrap_or(default)
    };
    let get_u32 = |section: Option<&ini::Properties>, key: &str, default: u32| {
        get(section, key).and_then(|v| v.parse().ok()).unwrap_or(default)
    };
    let get_bool = |section: Option<&ini::Properties>, key: &str, default: bool| {
        get(section, key).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    let input_path = get(io, "input");
    let camera_id: Option<i32> = get(io, "camera").and_then(|v| v.parse().ok());
    match (&input_path, camera_id) {
        (Some(_), Some(_)) => return Err(ConfigError::MutuallyExclusiveInputs),
        (None, None) => return Err(ConfigError::MissingInput),
        _ => {}
    }

    let default = EngineConfig::default();
    let engine = EngineConfig {
        frame_width: get_usize(io, "width", default.frame_width),
        frame_height: get_usize(io, "height", default.frame_height),
        input_fps: get_f64(io, "input_fps", default.input_fps),
        full_fps: get_f64(io, "full_fps", default.full_fps),
        crop_fps: get_f64(io, "crop_fps", default.crop_fps),
        time_to_alarm: Duration::from_secs_f64(get_f64(
            io,
            "time_to_alarm",
            default.time_to_alarm.as_secs_f64(),
        )),
        amplify: get_f64(magnification, "amplify", default.amplify as f64) as f32,
        low_cutoff: get_f64(magnification, "low-cutoff", default.low_cutoff),
        high_cutoff: get_f64(magnification, "high-cutoff", default.high_cutoff),
        threshold: get_f64(magnification, "threshold", default.threshold as f64) as f32,
        show_magnification: get_bool(magnification, "show_magnification", default.show_magnification),
        erode_dimension: get_usize(motion, "erode_dim", default.erode_dimension),
        dilate_dimension: get_usize(motion, "dilate_dim", default.dilate_dimension),
        diff_threshold: get_f64(motion, "diff_threshold", (default.diff_threshold * 255.0) as f64) as f32
            / 255.0,
        motion_duration: get_u32(motion, "duration", default.motion_duration),
        pixel_threshold: get_usize(motion, "pixel_threshold", default.pixel_threshold),
        show_diff: get_bool(motion, "show_diff", default.show_diff),
        crop: get_bool(cropping, "crop", default.crop),
        frames_to_settle: get_u32(cropping, "frames_to_settle", default.frames_to_settle),
        roi_window: get_u32(cropping, "roi_window", default.roi_window),
        roi_update_interval: get_u32(cropping, "roi_update_interval", default.roi_update_interval),
        print_times: get_bool(debug, "print_times", default.print_times),
    };

    engine.validate()?;

    Ok(LoadedConfig { engine, input_path, camera_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config_and_overrides_defaults() {
        let text = "
[io]
input = clip.y4m
width = 640
height = 480

[magnification]
amplify = 15
low-cutoff = 0.6
high-cutoff = 1.3

[cropping]
crop = true
frames_to_settle = 20
roi_window = 20
roi_update_interval = 200
";
        let ini = Ini::load_from_str(text).unwrap();
        let loaded = load_from_ini(&ini).unwrap();
        assert_eq!(loaded.input_path.as_deref(), Some("clip.y4m"));
        assert_eq!(loaded.camera_id, None);
        assert_eq!(loaded.engine.frame_width, 640);
        assert_eq!(loaded.engine.frame_height, 480);
        assert!((loaded.engine.amplify - 15.0).abs() < 1e-6);
        assert!(loaded.engine.crop);
    }

    #[test]
    fn rejects_both_input_and_camera() {
        let text = "
[io]
input = clip.y4m
camera = 0
";
        let ini = Ini::load_from_str(text).unwrap();
        assert!(matches!(load_from_ini(&ini), Err(ConfigError::MutuallyExclusiveInputs)));
    }

    #[test]
    fn rejects_neither_input_nor_camera() {
        let text = "[io]\nwidth = 320\n";
        let ini = Ini::load_from_str(text).unwrap();
        assert!(matches!(load_from_ini(&ini), Err(ConfigError::MissingInput)));
    }

    #[test]
    fn propagates_engine_validation_failures() {
        let text = "
[io]
input = clip.y4m
width = 50
";
        let ini = Ini::load_from_str(text).unwrap();
        assert!(matches!(load_from_ini(&ini), Err(ConfigError::OutOfRange(_))));
    }
}
