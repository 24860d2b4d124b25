//! State shared between the pipeline and the console

use crate::DetectionMask;
use gesture_engine::{GestureClass, InferenceResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use tracing::info;

/// Console session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Detection running, console waiting for ENTER
    Passive,
    /// Operator is editing settings; detection suspended
    Settings,
}

/// Cross-task state.
///
/// Every field is a single atomic word: writers replace a value as a whole
/// and readers never observe a half-written one.
#[derive(Debug)]
pub struct SharedState {
    mask: AtomicU8,
    verbose: AtomicBool,
    settings: AtomicBool,
    last_event_ms: AtomicU32,
    /// Class index in the high half, confidence bits in the low half
    last_result: AtomicU64,
}

/// Point-in-time copy of [`SharedState`] for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub mode: SessionMode,
    pub verbose: bool,
    pub mask: DetectionMask,
    pub last_result: InferenceResult,
    pub last_event_ms: u32,
}

impl SharedState {
    pub fn new(mask: DetectionMask, verbose: bool) -> Self {
        Self {
            mask: AtomicU8::new(mask.bits()),
            verbose: AtomicBool::new(verbose),
            settings: AtomicBool::new(false),
            last_event_ms: AtomicU32::new(0),
            last_result: AtomicU64::new(pack(InferenceResult::default())),
        }
    }

    pub fn mask(&self) -> DetectionMask {
        DetectionMask::from_bits(self.mask.load(Ordering::Acquire))
    }

    /// Swap in a complete mask, returning the previous one
    pub fn replace_mask(&self, mask: DetectionMask) -> DetectionMask {
        let previous = DetectionMask::from_bits(self.mask.swap(mask.bits(), Ordering::AcqRel));
        info!("Detection mask: [{}] -> [{}]", previous, mask);
        previous
    }

    pub fn verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    pub fn mode(&self) -> SessionMode {
        if self.settings.load(Ordering::Acquire) {
            SessionMode::Settings
        } else {
            SessionMode::Passive
        }
    }

    pub fn set_mode(&self, mode: SessionMode) {
        self.settings.store(mode == SessionMode::Settings, Ordering::Release);
    }

    pub fn last_event_ms(&self) -> u32 {
        self.last_event_ms.load(Ordering::Relaxed)
    }

    pub fn record_event_ms(&self, timestamp_ms: u32) {
        self.last_event_ms.store(timestamp_ms, Ordering::Relaxed);
    }

    pub fn last_result(&self) -> InferenceResult {
        unpack(self.last_result.load(Ordering::Relaxed))
    }

    pub fn record_result(&self, result: InferenceResult) {
        self.last_result.store(pack(result), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            mode: self.mode(),
            verbose: self.verbose(),
            mask: self.mask(),
            last_result: self.last_result(),
            last_event_ms: self.last_event_ms(),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(DetectionMask::default(), false)
    }
}

fn pack(result: InferenceResult) -> u64 {
    (u64::from(result.class.index()) << 32) | u64::from(result.confidence.to_bits())
}

fn unpack(word: u64) -> InferenceResult {
    let class = GestureClass::try_from((word >> 32) as u8).unwrap_or_default();
    InferenceResult::new(class, f32::from_bits(word as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_defaults() {
        let state = SharedState::default();
        assert_eq!(state.mode(), SessionMode::Passive);
        assert!(!state.verbose());
        assert_eq!(state.mask(), DetectionMask::default());
        assert_eq!(state.last_result(), InferenceResult::default());
        assert_eq!(state.last_event_ms(), 0);
    }

    #[test]
    fn test_last_result_round_trip() {
        let state = SharedState::default();
        let result = InferenceResult::new(GestureClass::SwipeDown, 0.8125);
        state.record_result(result);
        assert_eq!(state.last_result(), result);
        assert_eq!(state.snapshot().last_result, result);
    }

    #[test]
    fn test_mode_transitions() {
        let state = SharedState::default();
        state.set_mode(SessionMode::Settings);
        assert_eq!(state.mode(), SessionMode::Settings);
        state.set_mode(SessionMode::Passive);
        assert_eq!(state.mode(), SessionMode::Passive);
    }

    #[test]
    fn test_mask_replacement_is_atomic() {
        let state = Arc::new(SharedState::new(DetectionMask::empty(), false));

        let mut push_up = DetectionMask::empty();
        push_up.insert(GestureClass::Push);
        push_up.insert(GestureClass::SwipeUp);
        let mut left_right_down = DetectionMask::empty();
        left_right_down.insert(GestureClass::SwipeLeft);
        left_right_down.insert(GestureClass::SwipeRight);
        left_right_down.insert(GestureClass::SwipeDown);

        let writer = {
            let state = state.clone();
            thread::spawn(move || {
                for i in 0..10_000 {
                    state.replace_mask(if i % 2 == 0 { push_up } else { left_right_down });
                }
            })
        };

        let allowed = [DetectionMask::empty(), push_up, left_right_down];
        for _ in 0..10_000 {
            let seen = state.mask();
            assert!(allowed.contains(&seen), "torn mask {:#010b}", seen.bits());
        }
        writer.join().unwrap();
    }
}
