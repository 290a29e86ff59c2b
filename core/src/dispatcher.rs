//! A fixed pool of persistent worker threads, each owning one
//! [`MagnifierEngine`] exclusively.
//!
//! Grounded on `WorkerThread.hpp`'s `async_queue` + `push() -> future<R>`
//! pattern and `MotionDetection.cpp::magnifyVideo`'s row-band split. Here
//! each worker gets its own bounded `crossbeam_channel`; the "future" is a
//! one-shot reply channel sent alongside the task.

use crossbeam::channel::{bounded, Sender};
use std::thread::JoinHandle;

use crate::engine::MagnifierEngine;
use crate::error::MagnifierError;
use crate::frame::Frame;

enum Task {
    Transform {
        frame: Frame,
        reply: Sender<Frame>,
    },
    Reinitialize {
        frame: Frame,
        ack: Sender<()>,
    },
    Stop,
}

struct Worker {
    inbox: Sender<Task>,
    handle: JoinHandle<()>,
}

/// A fixed-size pool of workers, each assigned a stable row-band index of
/// every incoming frame.
pub struct Dispatcher {
    workers: Vec<Worker>,
}

impl Dispatcher {
    /// Build a pool of `num_workers` engines, each constructed with the
    /// same filter parameters via `make_engine`.
    pub fn new<F>(num_workers: usize, make_engine: F) -> Result<Self, MagnifierError>
    where
        F: Fn() -> Result<MagnifierEngine, MagnifierError>,
    {
        let mut workers = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let mut engine = make_engine()?;
            let (tx, rx) = bounded::<Task>(4);
            let handle = std::thread::spawn(move || loop {
                match rx.recv() {
                    Ok(Task::Transform { frame, reply }) => {
                        let out = engine.transform(frame.view());
                        let _ = reply.send(out);
                    }
                    Ok(Task::Reinitialize { frame, ack }) => {
                        engine.reinitialize(frame.view());
                        let _ = ack.send(());
                    }
                    Ok(Task::Stop) | Err(_) => break,
                }
            });
            workers.push(Worker { inbox: tx, handle });
        }
        Ok(Dispatcher { workers })
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Split `frame` into `num_workers` contiguous row-bands, dispatch each
    /// to its stable worker, and vertically concatenate the replies in
    /// band order.
    pub fn process(&self, frame: &Frame) -> Result<Frame, MagnifierError> {
        let n = self.workers.len();
        let rows_per_band = frame.height / n;
        let mut replies = Vec::with_capacity(n);

        for (i, worker) in self.workers.iter().enumerate() {
            let row_start = i * rows_per_band;
            let row_end = if i == n - 1 { frame.height } else { (i + 1) * rows_per_band };
            let band = frame.row_band(row_start, row_end).to_owned();
            let (tx, rx) = bounded(1);
            worker
                .inbox
                .send(Task::Transform { frame: band, reply: tx })
                .map_err(|_| MagnifierError::PoolShutDown)?;
            replies.push(rx);
        }

        let mut bands = Vec::with_capacity(n);
        for rx in replies {
            bands.push(rx.recv().map_err(|_| MagnifierError::PoolShutDown)?);
        }
        Ok(concat_vertical(&bands))
    }

    /// Re-initialize every worker's engine with a fresh row-band slice of
    /// `frame`, used when the adaptive-crop state machine changes the
    /// working frame size.
    pub fn reinitialize(&self, frame: &Frame) -> Result<(), MagnifierError> {
        let n = self.workers.len();
        let rows_per_band = frame.height / n;
        let mut acks = Vec::with_capacity(n);
        for (i, worker) in self.workers.iter().enumerate() {
            let row_start = i * rows_per_band;
            let row_end = if i == n - 1 { frame.height } else { (i + 1) * rows_per_band };
            let band = frame.row_band(row_start, row_end).to_owned();
            let (tx, rx) = bounded(1);
            worker
                .inbox
                .send(Task::Reinitialize { frame: band, ack: tx })
                .map_err(|_| MagnifierError::PoolShutDown)?;
            acks.push(rx);
        }
        for rx in acks {
            rx.recv().map_err(|_| MagnifierError::PoolShutDown)?;
        }
        Ok(())
    }

    /// Signal every worker to stop and join its thread. In-flight tasks
    /// complete first, since `Stop` is appended to each worker's own
    /// FIFO inbox rather than broadcast out of order.
    pub fn shutdown(self) {
        for worker in &self.workers {
            let _ = worker.inbox.send(Task::Stop);
        }
        for worker in self.workers {
            let _ = worker.handle.join();
        }
    }
}

fn concat_vertical(bands: &[Frame]) -> Frame {
    let width = bands[0].width;
    let height: usize = bands.iter().map(|b| b.height).sum();
    let mut data = Vec::with_capacity(width * height * 3);
    for band in bands {
        data.extend_from_slice(&band.data);
    }
    Frame { width, height, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn make_engine() -> Result<MagnifierEngine, MagnifierError> {
        MagnifierEngine::new(30.0, 0.5, 1.0, 20.0, 25.0)
    }

    #[test]
    fn split_and_merge_preserves_frame_dimensions() {
        let dispatcher = Dispatcher::new(3, make_engine).unwrap();
        let frame = Frame::from_rgb(16, 30, vec![100u8; 16 * 30 * 3]).unwrap();
        let out = dispatcher.process(&frame).unwrap();
        assert_eq!(out.width, 16);
        assert_eq!(out.height, 30);
        dispatcher.shutdown();
    }

    #[test]
    fn shutdown_joins_all_workers() {
        let dispatcher = Dispatcher::new(3, make_engine).unwrap();
        dispatcher.shutdown();
    }
}
