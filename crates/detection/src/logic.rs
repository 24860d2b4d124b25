//! Hold/debounce state machine
//!
//! Converts noisy per-frame classifications into one event per gesture. A
//! qualifying result arms the hold counter and emits; the counter then runs
//! for `hold_cycles` further in-mask cycles before the logic re-arms.

use crate::{DetectionConfigError, Indication, SessionMode, SharedState, SignalPanel};
use gesture_engine::{GestureClass, InferenceResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Detection configuration, fixed for the lifetime of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Confidence a result must exceed to trigger (default: 0.7)
    pub threshold: f32,
    /// Cycles a detection is held before re-arming (default: 10)
    pub hold_cycles: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            hold_cycles: 10,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), DetectionConfigError> {
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(DetectionConfigError::Threshold(self.threshold));
        }
        if self.hold_cycles == 0 {
            return Err(DetectionConfigError::HoldCycles);
        }
        Ok(())
    }
}

/// Position of the hold counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    /// Armed, waiting for a qualifying result
    Idle,
    /// Event just emitted
    Rising,
    /// Holding after an event
    Held,
}

/// One emitted gesture
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GestureEvent {
    pub class: GestureClass,
    pub score: f32,
    /// Present when verbose output was on at emission time
    pub timestamp_ms: Option<u32>,
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp_ms {
            Some(ms) => write!(f, "[INFO][GESTURE] {} {:.6} {}", self.class, self.score, ms),
            None => write!(f, "[INFO]\"class\": \"{}\", \"score\": {:.6}", self.class, self.score),
        }
    }
}

/// Outcome of one detection cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Settings mode: nothing changed
    Suppressed,
    /// Class not in the mask: signal set to searching
    Filtered,
    /// Qualifying result while armed
    Detected(GestureEvent),
    /// Counter advanced within the hold window
    Holding,
    /// Hold window ended
    Rearmed,
    /// Armed, confidence not above threshold
    BelowThreshold,
}

/// Per-cycle detection state machine
pub struct DetectionLogic {
    config: DetectionConfig,
    state: Arc<SharedState>,
    panel: Arc<dyn SignalPanel>,
    hold: u32,
    epoch: Instant,
    events: u64,
}

impl DetectionLogic {
    /// Validate the configuration and build an armed state machine
    pub fn new(
        config: DetectionConfig,
        state: Arc<SharedState>,
        panel: Arc<dyn SignalPanel>,
    ) -> Result<Self, DetectionConfigError> {
        config.validate()?;
        info!(
            "Detection logic: threshold={} hold_cycles={}",
            config.threshold, config.hold_cycles
        );
        Ok(Self {
            config,
            state,
            panel,
            hold: 0,
            epoch: Instant::now(),
            events: 0,
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn phase(&self) -> HoldPhase {
        match self.hold {
            0 => HoldPhase::Idle,
            1 => HoldPhase::Rising,
            _ => HoldPhase::Held,
        }
    }

    /// Raw hold counter
    pub fn hold_count(&self) -> u32 {
        self.hold
    }

    /// Events emitted since start
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Milliseconds since the logic was created, wrapping at `u32::MAX`
    pub fn elapsed_ms(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }

    /// Run one cycle for `result`
    pub fn step(&mut self, result: &InferenceResult) -> Step {
        self.state.record_result(*result);

        if self.state.mode() == SessionMode::Settings {
            return Step::Suppressed;
        }

        if !self.state.mask().contains(result.class) {
            self.panel.indicate(Indication::Searching);
            return Step::Filtered;
        }

        let mut step = Step::BelowThreshold;
        if self.hold > 0 {
            self.hold += 1;
            step = Step::Holding;
        }

        if self.hold == 0 && result.confidence > self.config.threshold {
            self.panel.indicate(Indication::Active);
            self.hold = 1;
            self.events += 1;
            step = Step::Detected(self.event_for(result));
        }

        if self.hold > self.config.hold_cycles {
            self.hold = 0;
            self.panel.indicate(Indication::Searching);
            debug!("Hold window over, re-armed");
            step = Step::Rearmed;
        }

        step
    }

    fn event_for(&self, result: &InferenceResult) -> GestureEvent {
        let timestamp_ms = if self.state.verbose() {
            let ms = self.elapsed_ms();
            self.state.record_event_ms(ms);
            Some(ms)
        } else {
            None
        };
        info!("Gesture {} ({:.2})", result.class, result.confidence);
        GestureEvent {
            class: result.class,
            score: result.confidence,
            timestamp_ms,
        }
    }
}
