//! Gesture Detection
//!
//! Turns per-frame inference results into debounced gesture events. Holds
//! the operator-configurable detection mask, the state shared between the
//! pipeline and the console, and the visible signal outputs.

mod logic;
mod mask;
mod signals;
mod state;

pub use logic::{DetectionConfig, DetectionLogic, GestureEvent, HoldPhase, Step};
pub use mask::DetectionMask;
pub use signals::{Indication, LedPanel, SignalPanel};
pub use state::{SessionMode, SharedState, StatusSnapshot};

use thiserror::Error;

/// Startup validation errors for detection settings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionConfigError {
    #[error("Threshold {0} outside 0.0..1.0")]
    Threshold(f32),

    #[error("Hold duration must be at least one cycle")]
    HoldCycles,
}
