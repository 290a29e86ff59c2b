//! Alarm playback.
//!
//! Grounded on `MotionDetection.cpp::soundAlarm`'s idempotency pattern (a
//! "currently playing" flag so a sustained alarm condition doesn't retrigger
//! every frame). Driving an actual audio device is out of scope for this
//! crate; the default implementation surfaces the alarm through the same
//! logging facility the rest of the binary uses.

use std::sync::atomic::{AtomicBool, Ordering};

/// Receives the motion-detector's alarm signal.
pub trait AlarmSink {
    fn trigger(&self);
}

pub struct LoggingAlarm {
    playing: AtomicBool,
}

impl LoggingAlarm {
    pub fn new() -> Self {
        LoggingAlarm { playing: AtomicBool::new(false) }
    }
}

impl Default for LoggingAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmSink for LoggingAlarm {
    fn trigger(&self) {
        if !self.playing.swap(true, Ordering::SeqCst) {
            log::error!("NO MOVEMENT DETECTED");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_is_idempotent_while_already_playing() {
        let alarm = LoggingAlarm::new();
        alarm.trigger();
        assert!(alarm.playing.load(Ordering::SeqCst));
        // A second trigger while already "playing" must not panic or
        // double-fire any external resource.
        alarm.trigger();
    }
}
