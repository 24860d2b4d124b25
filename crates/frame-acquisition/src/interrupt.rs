//! Data-ready interrupt handler

use radar_buffer::{FeedOutcome, RadarDataManager};
use std::sync::Arc;

/// Handler bound to the sensor's data-ready line.
///
/// Only runs the buffer service producer path: no blocking, no allocation,
/// no logging.
#[derive(Clone)]
pub struct DataReadyInterrupt {
    manager: Arc<RadarDataManager>,
}

impl DataReadyInterrupt {
    pub fn new(manager: Arc<RadarDataManager>) -> Self {
        Self { manager }
    }

    /// Service one data-ready event
    pub fn fire(&self) -> FeedOutcome {
        self.manager.feed(true)
    }
}
