//! Riesz-pyramid video motion magnification and breathing-rate detection.
//!
//! This crate owns the real-time processing pipeline: a Butterworth filter
//! designer, a per-level Riesz transform, a fixed worker-thread pool that
//! fans a frame out across persistent per-band magnifier engines, and an
//! adaptive-crop motion-detection state machine that estimates breathing
//! rate and triggers an alarm on sustained motion absence.
//!
//! Frame-source/sink adapters and CLI/config-file glue live in the sibling
//! `riesz-breath-decode` and `riesz-breath-cli` crates.

pub mod bandpass;
pub mod butterworth;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod fps_estimator;
pub mod frame;
pub mod imgproc;
pub mod motion;
pub mod pyramid;
pub mod temporal_filter;

pub use config::EngineConfig;
pub use dispatcher::Dispatcher;
pub use engine::MagnifierEngine;
pub use error::MagnifierError;
pub use fps_estimator::FpsEstimator;
pub use frame::{Frame, FrameView, LumaPlane};
pub use motion::{FsmState, MotionConfig, MotionDetector, MotionOutput};
