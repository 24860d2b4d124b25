//! Radar Data Manager Implementation

use crate::{BufferError, BufferStats, FeedOutcome, FifoSource, SubscriptionId};
use std::ops::{Deref, Range};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tokio::sync::Notify;
use tracing::{debug, info};

/// Maximum number of concurrent subscribers
pub const MAX_SUBSCRIBERS: usize = 4;

/// Per-subscriber read accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Idle,
    Outstanding(usize),
    Acked(usize),
    /// The store was reset while a read was outstanding
    Stale,
}

struct Subscriber {
    waker: Arc<Notify>,
    read: ReadState,
}

struct Store {
    samples: Box<[u16]>,
    head: usize,
    tail: usize,
    subscribers: [Option<Subscriber>; MAX_SUBSCRIBERS],
    source: Box<dyn FifoSource>,
}

impl Store {
    fn available(&self) -> usize {
        self.tail - self.head
    }

    fn subscriber_mut(&mut self, id: SubscriptionId) -> Result<&mut Subscriber, BufferError> {
        self.subscribers
            .get_mut(id.0.wrapping_sub(1))
            .and_then(Option::as_mut)
            .ok_or(BufferError::UnknownSubscription(id))
    }

    /// Wake every subscriber that is free to read
    fn wake_idle(&self) {
        for sub in self.subscribers.iter().flatten() {
            if sub.read == ReadState::Idle {
                sub.waker.notify_one();
            }
        }
    }

    fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        for sub in self.subscribers.iter_mut().flatten() {
            sub.read = match sub.read {
                ReadState::Outstanding(_) => ReadState::Stale,
                ReadState::Acked(_) => ReadState::Idle,
                other => other,
            };
        }
    }

    /// Drop the acknowledged frames once every subscriber has acked.
    /// Returns the number of frames released.
    fn release_acked(&mut self, frame_len: usize) -> usize {
        let mut frames: Option<usize> = None;
        for sub in self.subscribers.iter().flatten() {
            match sub.read {
                ReadState::Acked(n) => frames = Some(frames.map_or(n, |m| m.min(n))),
                _ => return 0,
            }
        }
        let Some(frames) = frames else {
            return 0;
        };

        let advance = (frames * frame_len).min(self.available());
        self.head += advance;
        self.samples.copy_within(self.head..self.tail, 0);
        self.tail -= self.head;
        self.head = 0;

        for sub in self.subscribers.iter_mut().flatten() {
            sub.read = ReadState::Idle;
        }
        advance / frame_len
    }
}

#[derive(Default)]
struct Counters {
    frames_fed: AtomicU64,
    frames_consumed: AtomicU64,
    overflows: AtomicU64,
    deferred: AtomicU64,
    source_faults: AtomicU64,
}

/// Buffer service between the radar FIFO and the consumer tasks
pub struct RadarDataManager {
    store: Mutex<Store>,
    /// Samples per frame (the fill level that triggers a notification)
    frame_len: usize,
    capacity_frames: usize,
    counters: Counters,
}

/// Borrowed view of buffered frames, valid until dropped.
///
/// Holds the store lock: drop it before calling [`RadarDataManager::ack`].
pub struct FrameRead<'a> {
    store: MutexGuard<'a, Store>,
    range: Range<usize>,
}

impl Deref for FrameRead<'_> {
    type Target = [u16];

    fn deref(&self) -> &[u16] {
        &self.store.samples[self.range.clone()]
    }
}

impl RadarDataManager {
    /// Create a manager holding up to `capacity_frames` frames of `frame_len` samples
    pub fn new(
        source: Box<dyn FifoSource>,
        frame_len: usize,
        capacity_frames: usize,
    ) -> Result<Self, BufferError> {
        if frame_len == 0 || capacity_frames == 0 {
            return Err(BufferError::InvalidGeometry { frame_len, capacity_frames });
        }

        info!(
            "Creating radar data manager: frame_len={}, capacity={} frames",
            frame_len, capacity_frames
        );

        Ok(Self {
            store: Mutex::new(Store {
                samples: vec![0u16; frame_len * capacity_frames].into_boxed_slice(),
                head: 0,
                tail: 0,
                subscribers: Default::default(),
                source,
            }),
            frame_len,
            capacity_frames,
            counters: Counters::default(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a consumer. The waker is notified whenever a frame is ready.
    ///
    /// Subscribing the same waker twice returns the existing id.
    pub fn subscribe(&self, waker: Arc<Notify>) -> Result<SubscriptionId, BufferError> {
        let mut store = self.lock();

        if let Some(idx) = store
            .subscribers
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| Arc::ptr_eq(&s.waker, &waker)))
        {
            return Ok(SubscriptionId(idx + 1));
        }

        let idx = store
            .subscribers
            .iter()
            .position(Option::is_none)
            .ok_or(BufferError::NoFreeSubscription(MAX_SUBSCRIBERS))?;

        if store.available() >= self.frame_len {
            waker.notify_one();
        }
        store.subscribers[idx] = Some(Subscriber { waker, read: ReadState::Idle });

        let id = SubscriptionId(idx + 1);
        info!("Subscriber {} registered", id);
        Ok(id)
    }

    /// Release a subscription
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BufferError> {
        let mut store = self.lock();
        store.subscriber_mut(id)?;
        store.subscribers[id.0 - 1] = None;

        let released = store.release_acked(self.frame_len);
        self.counters.frames_consumed.fetch_add(released as u64, Ordering::Relaxed);
        info!("Subscriber {} removed", id);
        Ok(())
    }

    /// Producer path, called from the data-ready interrupt.
    ///
    /// With `from_isr` set the call never blocks: a store held by a consumer
    /// makes this slot a [`FeedOutcome::Deferred`]. No logging happens here.
    pub fn feed(&self, from_isr: bool) -> FeedOutcome {
        let mut store = if from_isr {
            match self.store.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::WouldBlock) => {
                    self.counters.deferred.fetch_add(1, Ordering::Relaxed);
                    return FeedOutcome::Deferred;
                }
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            }
        } else {
            self.lock()
        };

        let mut outcome = FeedOutcome::Buffered;
        if store.tail + self.frame_len > store.samples.len() {
            // Consumer too slow: drop everything buffered
            store.reset();
            self.counters.overflows.fetch_add(1, Ordering::Relaxed);
            outcome = FeedOutcome::Overflow;
        }

        let Store { samples, tail, source, .. } = &mut *store;
        let slot = &mut samples[*tail..*tail + self.frame_len];
        match source.read_fifo(slot) {
            Ok(n) if n == self.frame_len => {
                *tail += n;
                self.counters.frames_fed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(n) => {
                self.counters.source_faults.fetch_add(1, Ordering::Relaxed);
                return FeedOutcome::ShortRead(n);
            }
            Err(_) => {
                self.counters.source_faults.fetch_add(1, Ordering::Relaxed);
                return FeedOutcome::SourceFault;
            }
        }

        if store.available() >= self.frame_len {
            store.wake_idle();
        }
        outcome
    }

    /// Borrow `count` frames from the head of the buffer
    pub fn read(&self, id: SubscriptionId, count: usize) -> Result<FrameRead<'_>, BufferError> {
        let mut store = self.lock();
        let requested = count * self.frame_len;
        let available = store.available();

        let sub = store.subscriber_mut(id)?;
        if sub.read != ReadState::Idle {
            return Err(BufferError::ReadPending(id));
        }
        if count == 0 || available < requested {
            return Err(BufferError::NoData { requested, available });
        }
        sub.read = ReadState::Outstanding(count);

        let start = store.head;
        Ok(FrameRead { store, range: start..start + requested })
    }

    /// Acknowledge the frames returned by the previous `read`
    pub fn ack(&self, id: SubscriptionId, count: usize) -> Result<(), BufferError> {
        let mut store = self.lock();
        let sub = store.subscriber_mut(id)?;

        match sub.read {
            ReadState::Outstanding(read) if read == count => sub.read = ReadState::Acked(count),
            ReadState::Outstanding(read) => {
                return Err(BufferError::AckMismatch { id, read, acked: count })
            }
            ReadState::Stale => {
                debug!("Subscriber {} acked frames dropped by a buffer reset", id);
                sub.read = ReadState::Idle;
            }
            ReadState::Idle | ReadState::Acked(_) => return Err(BufferError::AckWithoutRead(id)),
        }

        let released = store.release_acked(self.frame_len);
        self.counters.frames_consumed.fetch_add(released as u64, Ordering::Relaxed);

        if store.available() >= self.frame_len {
            store.wake_idle();
        }
        Ok(())
    }

    /// Samples per frame
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Capacity in frames
    pub fn capacity_frames(&self) -> usize {
        self.capacity_frames
    }

    /// Number of complete frames currently buffered
    pub fn buffered_frames(&self) -> usize {
        self.lock().available() / self.frame_len
    }

    /// Fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.buffered_frames() as f64 / self.capacity_frames as f64
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            frames_fed: self.counters.frames_fed.load(Ordering::Relaxed),
            frames_consumed: self.counters.frames_consumed.load(Ordering::Relaxed),
            overflows: self.counters.overflows.load(Ordering::Relaxed),
            deferred: self.counters.deferred.load(Ordering::Relaxed),
            source_faults: self.counters.source_faults.load(Ordering::Relaxed),
        }
    }
}
