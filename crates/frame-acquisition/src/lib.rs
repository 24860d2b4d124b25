//! Radar Frame Acquisition
//!
//! Moves raw radar frames from the interrupt-fed buffer service to the
//! processing stage:
//! - data-ready interrupt hand-off (`DataReadyInterrupt`)
//! - interleaved to planar reshaping (`PlanarFrame`)
//! - swap-based frame exchange with the processing task (`FrameExchange`)
//! - simulated BGT60-style radar device for host runs (`device`)

pub mod acquisition;
pub mod device;
pub mod exchange;
pub mod frame;
pub mod interrupt;

pub use acquisition::AcquisitionTask;
pub use device::{RadarClock, SimulatedRadar, SimulationConfig};
pub use exchange::FrameExchange;
pub use frame::{deinterleave, FrameGeometry, PlanarFrame};
pub use interrupt::DataReadyInterrupt;

use radar_buffer::BufferError;
use thiserror::Error;

/// Acquisition error types. All of them are fatal for the pipeline.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Buffer service fault: {0}")]
    Buffer(#[from] BufferError),

    #[error("Raw frame has {actual} samples, expected {expected}")]
    Layout { expected: usize, actual: usize },

    #[error("Invalid frame geometry: {0}")]
    Geometry(String),

    #[error("Device clock failed: {0}")]
    Device(#[from] std::io::Error),
}
