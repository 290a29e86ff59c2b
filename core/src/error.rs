use thiserror::Error;

/// Errors produced by the magnification core.
#[derive(Debug, Error)]
pub enum MagnifierError {
    #[error("invalid filter design parameters: order={order}, cutoff={cutoff}")]
    InvalidFilter { order: usize, cutoff: f64 },

    #[error("worker pool is shut down")]
    PoolShutDown,

    #[error("configuration field '{field}' is out of range: {value}")]
    InvalidConfig { field: String, value: f64 },

    #[error("frame has {actual} bytes, expected {width}x{height}x3 = {expected}")]
    BadFrameType {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}
