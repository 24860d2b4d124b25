//! Radar Data Buffer
//!
//! Buffers raw radar FIFO frames between the data-ready interrupt and the
//! consumer tasks. The producer side (`feed`) is safe to call from interrupt
//! context; consumers subscribe with a wake handle, then `read` and `ack`
//! frames one batch at a time.

mod manager;

pub use manager::{FrameRead, RadarDataManager, MAX_SUBSCRIBERS};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the buffer service to its consumers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Buffer geometry rejected at construction
    #[error("Invalid buffer geometry: frame_len={frame_len}, capacity_frames={capacity_frames}")]
    InvalidGeometry { frame_len: usize, capacity_frames: usize },

    /// All subscription slots are taken
    #[error("No free subscription slot (max {0})")]
    NoFreeSubscription(usize),

    /// Subscription id is unknown or was released
    #[error("Unknown subscription {0}")]
    UnknownSubscription(SubscriptionId),

    /// Not enough buffered data for the requested read
    #[error("Not enough data: requested {requested} samples, {available} available")]
    NoData { requested: usize, available: usize },

    /// A read was issued while a previous read is still unacknowledged
    #[error("Subscription {0} already has an unacknowledged read")]
    ReadPending(SubscriptionId),

    /// Acknowledgement without a matching read
    #[error("Subscription {0} acknowledged without a prior read")]
    AckWithoutRead(SubscriptionId),

    /// Acknowledged count differs from the count that was read
    #[error("Subscription {id} acknowledged {acked} frames but read {read}")]
    AckMismatch { id: SubscriptionId, read: usize, acked: usize },
}

/// Errors raised by a hardware FIFO source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("FIFO overflow in sensor")]
    FifoOverflow,

    #[error("Sensor bus error: {0}")]
    Bus(String),
}

/// Hardware FIFO drained by the buffer service on every data-ready interrupt.
///
/// Implementations must not block or allocate: they run in the producer
/// (interrupt) path.
pub trait FifoSource: Send {
    /// Copy up to `dst.len()` samples from the sensor FIFO, returning how many
    /// were written.
    fn read_fifo(&mut self, dst: &mut [u16]) -> Result<usize, SourceError>;
}

/// Handle identifying one consumer of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub usize);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a single producer-side `feed` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// One frame was appended
    Buffered,
    /// The store was full: it was reset, then the new frame appended
    Overflow,
    /// Store was locked by a consumer; this slot was skipped
    Deferred,
    /// The FIFO returned fewer samples than a frame; nothing appended
    ShortRead(usize),
    /// The FIFO source reported an error; nothing appended
    SourceFault,
}

/// Counters exposed for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferStats {
    /// Frames appended by `feed`
    pub frames_fed: u64,
    /// Frames released after every subscriber acknowledged them
    pub frames_consumed: u64,
    /// Store resets caused by a slow consumer
    pub overflows: u64,
    /// Feeds skipped because a consumer held the store
    pub deferred: u64,
    /// Short reads and source errors
    pub source_faults: u64,
}
