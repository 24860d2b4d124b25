//! Acquisition task: buffer service consumer

use crate::exchange::FrameExchange;
use crate::frame::{FrameGeometry, PlanarFrame};
use crate::AcquisitionError;
use radar_buffer::{BufferError, RadarDataManager, SubscriptionId};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Frames drained per wake
const FRAMES_PER_READ: usize = 1;

/// Drains one frame per wake, reshapes it, and hands it to processing
pub struct AcquisitionTask {
    manager: Arc<RadarDataManager>,
    subscription: SubscriptionId,
    wake: Arc<Notify>,
    exchange: Arc<FrameExchange>,
    /// Planar buffer being filled; swapped out on publish
    scratch: PlanarFrame,
    sequence: u64,
    seen_overflows: u64,
}

impl AcquisitionTask {
    /// Subscribe to the buffer service and pre-allocate the scratch frame
    pub fn new(
        manager: Arc<RadarDataManager>,
        exchange: Arc<FrameExchange>,
        geometry: &FrameGeometry,
    ) -> Result<Self, AcquisitionError> {
        geometry.validate()?;
        if manager.frame_len() != geometry.frame_len() {
            return Err(AcquisitionError::Geometry(format!(
                "buffer frames hold {} samples, geometry expects {}",
                manager.frame_len(),
                geometry.frame_len()
            )));
        }

        let wake = Arc::new(Notify::new());
        let subscription = manager.subscribe(wake.clone())?;
        let seen_overflows = manager.stats().overflows;

        Ok(Self {
            manager,
            subscription,
            wake,
            exchange,
            scratch: PlanarFrame::new(geometry),
            sequence: 0,
            seen_overflows,
        })
    }

    /// Run forever. Only returns on a fatal buffer or layout fault.
    pub async fn run(mut self) -> Result<Infallible, AcquisitionError> {
        info!("Acquisition task started (subscription {})", self.subscription);

        loop {
            self.wake.notified().await;
            self.cycle()?;
        }
    }

    /// One read → reshape → ack → publish pass. An empty buffer is not an error.
    pub fn cycle(&mut self) -> Result<(), AcquisitionError> {
        self.report_overflows();

        {
            let raw = match self.manager.read(self.subscription, FRAMES_PER_READ) {
                Ok(raw) => raw,
                Err(BufferError::NoData { available, .. }) => {
                    // Wake left over from a frame a reset already dropped
                    debug!("Spurious wake: {} samples buffered, nothing to read", available);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            self.scratch.fill_from_interleaved(&raw, self.sequence)?;
        }
        self.manager.ack(self.subscription, FRAMES_PER_READ)?;

        if self.exchange.publish(&mut self.scratch) {
            debug!("Processing behind: frame {} replaced an untaken frame", self.sequence);
        }
        self.sequence += 1;
        Ok(())
    }

    /// Frames acquired so far
    pub fn frames_acquired(&self) -> u64 {
        self.sequence
    }

    fn report_overflows(&mut self) {
        let overflows = self.manager.stats().overflows;
        if overflows > self.seen_overflows {
            warn!(
                "Radar buffer overflow: store reset {} time(s), buffered frames dropped",
                overflows - self.seen_overflows
            );
            self.seen_overflows = overflows;
        }
    }
}
