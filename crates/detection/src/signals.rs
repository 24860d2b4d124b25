//! Visible signal outputs

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use tracing::debug;

/// Mutually exclusive signal level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indication {
    /// Waiting for a gesture (green)
    Searching,
    /// Gesture detected and held (red)
    Active,
    /// Console in settings mode (blue)
    Settings,
}

impl Indication {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Indication::Active,
            2 => Indication::Settings,
            _ => Indication::Searching,
        }
    }

    pub fn colour(self) -> &'static str {
        match self {
            Indication::Searching => "green",
            Indication::Active => "red",
            Indication::Settings => "blue",
        }
    }
}

/// Output device for the detection and console state
pub trait SignalPanel: Send + Sync {
    /// Show exactly one level, clearing the others
    fn indicate(&self, indication: Indication);

    /// Flip the heartbeat output
    fn toggle_heartbeat(&self);
}

/// RGB + heartbeat LED model.
///
/// Levels live in atomics so the pipeline, console, and heartbeat timer can
/// drive it without a lock. Transitions are logged at debug level.
#[derive(Debug)]
pub struct LedPanel {
    level: AtomicU8,
    heartbeat: AtomicBool,
    transitions: AtomicU64,
}

impl LedPanel {
    pub fn new() -> Self {
        Self {
            level: AtomicU8::new(Indication::Searching as u8),
            heartbeat: AtomicBool::new(false),
            transitions: AtomicU64::new(0),
        }
    }

    /// Level currently shown
    pub fn current(&self) -> Indication {
        Indication::from_u8(self.level.load(Ordering::Acquire))
    }

    pub fn heartbeat(&self) -> bool {
        self.heartbeat.load(Ordering::Relaxed)
    }

    /// Number of level changes since start
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }
}

impl Default for LedPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalPanel for LedPanel {
    fn indicate(&self, indication: Indication) {
        let previous = Indication::from_u8(self.level.swap(indication as u8, Ordering::AcqRel));
        if previous != indication {
            self.transitions.fetch_add(1, Ordering::Relaxed);
            debug!("LED {} -> {}", previous.colour(), indication.colour());
        }
    }

    fn toggle_heartbeat(&self) {
        self.heartbeat.fetch_xor(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_searching() {
        let panel = LedPanel::new();
        assert_eq!(panel.current(), Indication::Searching);
        assert_eq!(panel.transitions(), 0);
    }

    #[test]
    fn test_transitions_counted_once() {
        let panel = LedPanel::new();
        panel.indicate(Indication::Active);
        panel.indicate(Indication::Active);
        panel.indicate(Indication::Settings);
        assert_eq!(panel.current(), Indication::Settings);
        assert_eq!(panel.transitions(), 2);
    }

    #[test]
    fn test_heartbeat_toggles() {
        let panel = LedPanel::new();
        panel.toggle_heartbeat();
        assert!(panel.heartbeat());
        panel.toggle_heartbeat();
        assert!(!panel.heartbeat());
    }
}
