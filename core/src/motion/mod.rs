//! The adaptive-crop / motion-detection state machine.
//!
//! Grounded on `MotionDetection.cpp::update`, which runs a per-frame action
//! switch followed by a separate transition switch, both keyed on the
//! state as of the start of the call. This module mirrors that split.

pub mod counter;
pub mod differential;
pub mod roi;

use std::time::Instant;

use counter::MotionCounter;
use roi::{Rect, RoiTracker};

use crate::dispatcher::Dispatcher;
use crate::error::MagnifierError;
use crate::frame::{Frame, LumaPlane};

const REFILL_FRAMES: u32 = 3;
const FRAME_BUFFER_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmState {
    Init,
    Reset,
    Idle,
    MonitorMotion,
    ComputeRoi,
    ValidRoi,
}

pub struct MotionConfig {
    pub frames_to_settle: u32,
    pub roi_window: u32,
    pub roi_update_interval: u32,
    pub erode_dim: usize,
    pub dilate_dim: usize,
    pub diff_threshold: f32,
    pub pixel_threshold: usize,
    pub motion_duration: u32,
    pub time_to_alarm: std::time::Duration,
    pub crop_enabled: bool,
}

/// Everything the FSM produces for one input frame.
pub struct MotionOutput {
    pub frame: Frame,
    pub state: FsmState,
    pub roi: Rect,
    pub breathing_rate: f64,
    pub alarm: bool,
}

struct FrameBuffer {
    slots: [Option<LumaPlane>; FRAME_BUFFER_LEN],
}

impl FrameBuffer {
    fn new() -> Self {
        FrameBuffer { slots: [None, None, None] }
    }

    fn push(&mut self, plane: LumaPlane) {
        self.slots[0] = self.slots[1].take();
        self.slots[1] = self.slots[2].take();
        self.slots[2] = Some(plane);
    }

    fn full(&self) -> Option<(&LumaPlane, &LumaPlane, &LumaPlane)> {
        match (&self.slots[0], &self.slots[1], &self.slots[2]) {
            (Some(a), Some(b), Some(c)) => Some((a, b, c)),
            _ => None,
        }
    }
}

pub struct MotionDetector {
    state: FsmState,
    config: MotionConfig,
    frame_width: usize,
    frame_height: usize,

    buffer: FrameBuffer,
    accumulator: Vec<bool>,
    roi: Rect,
    roi_tracker: RoiTracker,
    counter: MotionCounter,

    init_timer: u32,
    valid_timer: u32,
    roi_timer: u32,
    refill_timer: u32,

    just_entered: Option<FsmState>,
}

impl MotionDetector {
    pub fn new(frame_width: usize, frame_height: usize, config: MotionConfig) -> Self {
        MotionDetector {
            state: FsmState::Init,
            roi: Rect::full_frame(frame_width, frame_height),
            roi_tracker: RoiTracker::new(frame_width, frame_height),
            counter: MotionCounter::new(config.pixel_threshold, config.motion_duration, config.time_to_alarm),
            accumulator: vec![false; frame_width * frame_height],
            buffer: FrameBuffer::new(),
            frame_width,
            frame_height,
            config,
            init_timer: 0,
            valid_timer: 0,
            roi_timer: 0,
            refill_timer: 0,
            just_entered: Some(FsmState::Init),
        }
    }

    pub fn state(&self) -> FsmState {
        self.state
    }

    pub fn roi(&self) -> Rect {
        self.roi
    }

    /// Run one frame through the action for the current state, then
    /// evaluate the transition table to decide next state.
    pub fn update(&mut self, new_frame: &Frame, dispatcher: &Dispatcher, now: Instant) -> Result<MotionOutput, MagnifierError> {
        let entered = self.just_entered.take();

        let (out_frame, breathing_rate, alarm) = match self.state {
            FsmState::Init => {
                let magnified = dispatcher.process(new_frame)?;
                self.buffer.push(magnified.to_luma_f32());
                self.init_timer += 1;
                (magnified, self.counter.breathing_rate(), false)
            }
            FsmState::Reset => {
                let magnified = dispatcher.process(new_frame)?;
                self.buffer.push(magnified.to_luma_f32());
                self.init_timer += 1;
                self.accumulator.iter_mut().for_each(|v| *v = false);
                (magnified, self.counter.breathing_rate(), false)
            }
            FsmState::Idle => {
                self.valid_timer += 1;
                let cropped = new_frame.crop(self.roi.x, self.roi.y, self.roi.w, self.roi.h);
                let magnified = dispatcher.process(&cropped)?;
                self.buffer.push(magnified.to_luma_f32());

                let mut tick = None;
                if let Some((f0, f1, f2)) = self.buffer.full() {
                    let evaluation = differential::differential_collins(
                        f0,
                        f1,
                        f2,
                        self.config.diff_threshold,
                        self.config.erode_dim,
                    );
                    tick = Some(self.counter.tick(&evaluation, self.roi.w, self.roi.h, now));
                }
                match tick {
                    Some(t) => (magnified, t.breathing_rate, t.alarm),
                    None => (magnified, self.counter.breathing_rate(), false),
                }
            }
            FsmState::MonitorMotion => {
                self.roi_timer += 1;
                let magnified = dispatcher.process(new_frame)?;
                self.buffer.push(magnified.to_luma_f32());

                if entered == Some(FsmState::MonitorMotion) {
                    self.accumulator.iter_mut().for_each(|v| *v = false);
                } else if let Some((f0, f1, f2)) = self.buffer.full() {
                    let evaluation = differential::differential_collins(
                        f0,
                        f1,
                        f2,
                        self.config.diff_threshold,
                        self.config.erode_dim,
                    );
                    for (acc, ev) in self.accumulator.iter_mut().zip(evaluation.iter()) {
                        *acc |= *ev;
                    }
                }
                (magnified, self.counter.breathing_rate(), false)
            }
            FsmState::ComputeRoi => {
                self.roi = self.roi_tracker.update(
                    &self.accumulator,
                    self.frame_width,
                    self.frame_height,
                    self.config.erode_dim,
                    self.config.dilate_dim,
                    self.roi,
                );
                (new_frame.clone(), self.counter.breathing_rate(), false)
            }
            FsmState::ValidRoi => {
                self.refill_timer += 1;
                let cropped = new_frame.crop(self.roi.x, self.roi.y, self.roi.w, self.roi.h);
                self.buffer.push(cropped.to_luma_f32());
                (cropped, self.counter.breathing_rate(), false)
            }
        };

        let next_state = self.transition(new_frame, dispatcher)?;
        if next_state != self.state {
            log::debug!("motion fsm: {:?} -> {:?}", self.state, next_state);
            self.just_entered = Some(next_state);
        }
        self.state = next_state;

        Ok(MotionOutput {
            frame: out_frame,
            state: self.state,
            roi: self.roi,
            breathing_rate,
            alarm,
        })
    }

    fn transition(&mut self, new_frame: &Frame, dispatcher: &Dispatcher) -> Result<FsmState, MagnifierError> {
        let next = match self.state {
            FsmState::Init => {
                if self.init_timer >= self.config.frames_to_settle {
                    self.init_timer = 0;
                    if self.config.crop_enabled {
                        FsmState::MonitorMotion
                    } else {
                        FsmState::Idle
                    }
                } else {
                    FsmState::Init
                }
            }
            FsmState::Reset => {
                if self.init_timer >= self.config.frames_to_settle {
                    self.init_timer = 0;
                    FsmState::MonitorMotion
                } else {
                    FsmState::Reset
                }
            }
            FsmState::Idle => {
                if self.config.crop_enabled && self.valid_timer >= self.config.roi_update_interval {
                    self.valid_timer = 0;
                    dispatcher.reinitialize(new_frame)?;
                    FsmState::Reset
                } else {
                    if !self.config.crop_enabled {
                        self.valid_timer = 0;
                    }
                    FsmState::Idle
                }
            }
            FsmState::MonitorMotion => {
                if self.roi_timer >= self.config.roi_window {
                    self.roi_timer = 0;
                    FsmState::ComputeRoi
                } else {
                    FsmState::MonitorMotion
                }
            }
            FsmState::ComputeRoi => FsmState::ValidRoi,
            FsmState::ValidRoi => {
                if self.refill_timer >= REFILL_FRAMES {
                    self.refill_timer = 0;
                    let cropped = new_frame.crop(self.roi.x, self.roi.y, self.roi.w, self.roi.h);
                    dispatcher.reinitialize(&cropped)?;
                    FsmState::Idle
                } else {
                    FsmState::ValidRoi
                }
            }
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MagnifierEngine;
    use std::time::Duration;

    fn make_dispatcher() -> Dispatcher {
        Dispatcher::new(1, || MagnifierEngine::new(30.0, 0.5, 1.0, 20.0, 25.0)).unwrap()
    }

    fn config(crop: bool) -> MotionConfig {
        MotionConfig {
            frames_to_settle: 3,
            roi_window: 3,
            roi_update_interval: 100,
            erode_dim: 1,
            dilate_dim: 1,
            diff_threshold: 0.05,
            pixel_threshold: 5,
            motion_duration: 1,
            time_to_alarm: Duration::from_secs(10),
            crop_enabled: crop,
        }
    }

    #[test]
    fn settles_from_init_to_idle_without_crop() {
        let dispatcher = make_dispatcher();
        let mut fsm = MotionDetector::new(16, 16, config(false));
        let frame = Frame::new(16, 16);
        let now = Instant::now();
        for _ in 0..5 {
            fsm.update(&frame, &dispatcher, now).unwrap();
        }
        assert_eq!(fsm.state(), FsmState::Idle);
        dispatcher.shutdown();
    }

    #[test]
    fn reaches_compute_roi_and_valid_roi_with_crop_enabled() {
        let dispatcher = make_dispatcher();
        let mut fsm = MotionDetector::new(16, 16, config(true));
        let frame = Frame::new(16, 16);
        let now = Instant::now();
        let mut seen_compute_roi = false;
        for _ in 0..12 {
            let out = fsm.update(&frame, &dispatcher, now).unwrap();
            if out.state == FsmState::ValidRoi {
                seen_compute_roi = true;
            }
        }
        assert!(seen_compute_roi);
        dispatcher.shutdown();
    }
}
