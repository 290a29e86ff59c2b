mod audio;
mod config_file;

use std::process::ExitCode;
use std::time::Instant;

use clap::{App, Arg};
use console::style;

use serde::Serialize;

use audio::{AlarmSink, LoggingAlarm};
use riesz_breath_core::{Dispatcher, FpsEstimator, MagnifierEngine, MotionConfig, MotionDetector};
use riesz_breath_decode::{CameraFrameSource, FrameSource};

#[derive(Serialize)]
struct Telemetry {
    state: String,
    breathing_rate: f64,
    roi: [usize; 4],
    alarm: bool,
}

const ABOUT: &str = "\
riesz-breath: real-time Eulerian video magnification and breathing-rate \
monitoring.

Based on the method described in \"Eulerian Video Magnification for \
Revealing Subtle Changes in the World\" (Wu et al., SIGGRAPH 2012) and its \
Riesz-pyramid phase-based refinement.";

const NUM_WORKERS: usize = 3;

fn main() -> ExitCode {
    env_logger::init();

    let matches = App::new("riesz-breath")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Real-time motion magnification and breathing-rate monitor")
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("PATH")
                .help("Path to an INI configuration file")
                .required(true),
        )
        .arg(
            Arg::with_name("about")
                .long("about")
                .help("Print background and acknowledgements"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Emit one JSON telemetry line per frame instead of human-readable logs"),
        )
        .get_matches();

    if matches.is_present("about") {
        println!("{}", ABOUT);
        return ExitCode::SUCCESS;
    }

    let json = matches.is_present("json");
    let config_path = matches.value_of("config").expect("required by clap");

    match run(config_path, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

fn run(config_path: &str, json: bool) -> Result<(), ExitCode> {
    let loaded = config_file::load(config_path).map_err(|e| {
        eprintln!("{} {}", style("error:").red().bold(), e);
        ExitCode::from(1)
    })?;

    let engine = &loaded.engine;

    let mut source: Box<dyn FrameSource> = match (&loaded.input_path, loaded.camera_id) {
        (Some(path), None) => {
            #[cfg(feature = "y4m-decode")]
            {
                Box::new(riesz_breath_decode::Y4mFrameSource::open(path).map_err(|e| {
                    eprintln!("{} {}", style("error:").red().bold(), e);
                    ExitCode::from(2)
                })?)
            }
            #[cfg(not(feature = "y4m-decode"))]
            {
                let _ = path;
                eprintln!("{} built without y4m-decode support", style("error:").red().bold());
                return Err(ExitCode::from(2));
            }
        }
        (None, Some(camera_id)) => Box::new(
            CameraFrameSource::open(camera_id, engine.frame_width, engine.frame_height).map_err(|e| {
                eprintln!("{} {}", style("error:").red().bold(), e);
                ExitCode::from(2)
            })?,
        ),
        _ => unreachable!("config_file::load already enforces exactly one input source"),
    };

    let width = source.width();
    let height = source.height();

    let low_cutoff = engine.low_cutoff;
    let high_cutoff = engine.high_cutoff;
    let amplify = engine.amplify;
    let threshold = engine.threshold;
    let fps = engine.full_fps;

    let dispatcher = Dispatcher::new(NUM_WORKERS, move || {
        MagnifierEngine::new(fps, low_cutoff, high_cutoff, amplify, threshold)
    })
    .map_err(|e| {
        eprintln!("{} {}", style("error:").red().bold(), e);
        ExitCode::from(3)
    })?;

    let motion_config = MotionConfig {
        frames_to_settle: engine.frames_to_settle,
        roi_window: engine.roi_window,
        roi_update_interval: engine.roi_update_interval,
        erode_dim: engine.erode_dimension,
        dilate_dim: engine.dilate_dimension,
        diff_threshold: engine.diff_threshold,
        pixel_threshold: engine.pixel_threshold,
        motion_duration: engine.motion_duration,
        time_to_alarm: engine.time_to_alarm,
        crop_enabled: engine.crop,
    };
    let mut detector = MotionDetector::new(width, height, motion_config);
    let alarm = LoggingAlarm::new();
    let mut fps_estimator = FpsEstimator::new();

    loop {
        let frame = match source.read() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                eprintln!("{} {}", style("error:").red().bold(), e);
                return Err(ExitCode::from(2));
            }
        };

        let now = Instant::now();
        fps_estimator.record(now);
        if let Some(observed) = fps_estimator.observed_fps() {
            log::trace!("observed input rate: {:.3} fps", observed);
        }

        let output = detector.update(&frame, &dispatcher, now).map_err(|e| {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::from(3)
        })?;

        if engine.print_times {
            log::debug!("frame processed in {:?}", now.elapsed());
        }

        if output.alarm {
            alarm.trigger();
        }

        if json {
            let telemetry = Telemetry {
                state: format!("{:?}", output.state),
                breathing_rate: output.breathing_rate,
                roi: [output.roi.x, output.roi.y, output.roi.w, output.roi.h],
                alarm: output.alarm,
            };
            match serde_json::to_string(&telemetry) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("failed to serialize telemetry: {}", e),
            }
        } else {
            log::info!(
                "state={:?} breathing_rate={:.2} roi=({},{},{},{})",
                output.state,
                output.breathing_rate,
                output.roi.x,
                output.roi.y,
                output.roi.w,
                output.roi.h
            );
        }
    }

    dispatcher.shutdown();
    Ok(())
}
