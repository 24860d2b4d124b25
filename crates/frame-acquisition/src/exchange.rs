//! Frame hand-off between the acquisition and processing tasks
//!
//! Buffers are swapped, never copied: the producer publishes its filled
//! scratch frame and gets the previous pending buffer back as its next
//! scratch; the consumer swaps its working frame with the pending one.

use crate::frame::{FrameGeometry, PlanarFrame};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

struct Slot {
    frame: PlanarFrame,
    fresh: bool,
}

/// Latest-frame-wins exchange with a wake signal for the consumer
pub struct FrameExchange {
    slot: Mutex<Slot>,
    ready: Notify,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl FrameExchange {
    pub fn new(geometry: &FrameGeometry) -> Self {
        Self {
            slot: Mutex::new(Slot {
                frame: PlanarFrame::new(geometry),
                fresh: false,
            }),
            ready: Notify::new(),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a filled frame to the consumer and wake it.
    ///
    /// Returns `true` when an untaken frame was overwritten.
    pub fn publish(&self, frame: &mut PlanarFrame) -> bool {
        let dropped = {
            let mut slot = self.lock();
            std::mem::swap(&mut slot.frame, frame);
            std::mem::replace(&mut slot.fresh, true)
        };

        self.published.fetch_add(1, Ordering::Relaxed);
        if dropped {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.ready.notify_one();
        dropped
    }

    /// Swap the pending frame into `frame`. Returns `false` if nothing new
    /// was published since the last take.
    pub fn take(&self, frame: &mut PlanarFrame) -> bool {
        let mut slot = self.lock();
        if !slot.fresh {
            return false;
        }
        std::mem::swap(&mut slot.frame, frame);
        slot.fresh = false;
        true
    }

    /// Wait for the next publish. A publish that happened before the call
    /// completes it immediately.
    pub async fn ready(&self) {
        self.ready.notified().await;
    }

    /// Frames published so far
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Frames overwritten before the consumer took them
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn geometry() -> FrameGeometry {
        FrameGeometry {
            samples_per_chirp: 2,
            chirps_per_frame: 1,
            rx_antennas: 2,
        }
    }

    fn filled(sequence: u64) -> PlanarFrame {
        let mut frame = PlanarFrame::new(&geometry());
        let v = sequence as u16;
        frame.fill_from_interleaved(&[v, v, v, v], sequence).unwrap();
        frame
    }

    #[test]
    fn test_take_before_publish() {
        let exchange = FrameExchange::new(&geometry());
        let mut working = PlanarFrame::new(&geometry());
        assert!(!exchange.take(&mut working));
    }

    #[test]
    fn test_publish_then_take() {
        let exchange = FrameExchange::new(&geometry());
        let mut scratch = filled(1);
        let mut working = PlanarFrame::new(&geometry());

        assert!(!exchange.publish(&mut scratch));
        assert!(exchange.take(&mut working));
        assert_eq!(working.sequence(), 1);

        // Same frame is never delivered twice
        assert!(!exchange.take(&mut working));
    }

    #[test]
    fn test_latest_frame_wins() {
        let exchange = FrameExchange::new(&geometry());
        let mut working = PlanarFrame::new(&geometry());

        exchange.publish(&mut filled(1));
        assert!(exchange.publish(&mut filled(2)));

        assert!(exchange.take(&mut working));
        assert_eq!(working.sequence(), 2);
        assert_eq!(exchange.published(), 2);
        assert_eq!(exchange.dropped(), 1);
    }

    #[test]
    fn test_publish_returns_spare_buffer() {
        let exchange = FrameExchange::new(&geometry());
        let mut scratch = filled(5);
        exchange.publish(&mut scratch);

        // Producer now holds the slot's previous (empty) buffer
        assert_eq!(scratch.sequence(), 0);
        assert_eq!(scratch.len(), 4);
    }

    #[tokio::test]
    async fn test_ready_after_publish() {
        let exchange = FrameExchange::new(&geometry());
        exchange.publish(&mut filled(1));

        tokio::time::timeout(Duration::from_secs(1), exchange.ready())
            .await
            .expect("publish did not wake consumer");
    }
}
