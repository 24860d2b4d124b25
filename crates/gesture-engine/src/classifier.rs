//! Classifier call boundary
//!
//! Processing hands each planar frame to a [`Classifier`] and receives one
//! [`InferenceResult`]. The real gesture network is out of scope for host
//! builds; `EnergyClassifier` is the rule-based stand-in.

use crate::{GestureClass, InferenceResult};
use frame_acquisition::PlanarFrame;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Per-frame gesture classifier.
///
/// Called once per frame from the processing task. Implementations must
/// not block and should not allocate per call.
pub trait Classifier: Send {
    fn classify(&mut self, frame: &PlanarFrame) -> InferenceResult;
}

/// Thresholds for the energy classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Idle ADC level
    pub midscale: f32,
    /// Mean deviation below which the frame is background
    pub floor: f32,
    /// Mean deviation mapped to full confidence
    pub full_scale: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            midscale: 2048.0,
            floor: 80.0,
            full_scale: 600.0,
        }
    }
}

/// Gesture per (antenna, polarity); antenna index taken modulo 3
const CLASS_TABLE: [(GestureClass, GestureClass); 3] = [
    (GestureClass::Push, GestureClass::Push),
    (GestureClass::SwipeLeft, GestureClass::SwipeUp),
    (GestureClass::SwipeRight, GestureClass::SwipeDown),
];

/// Confidence reported for quiet frames
const BACKGROUND_CONFIDENCE: f32 = 0.95;

/// Rule-based classifier on per-antenna mean offset.
///
/// The antenna with the strongest mean deviation from mid-scale picks the
/// gesture, its sign picks between the two gestures bound to that antenna,
/// and the magnitude sets the confidence.
pub struct EnergyClassifier {
    config: EnergyConfig,
    frames: u64,
}

impl EnergyClassifier {
    pub fn new(config: EnergyConfig) -> Self {
        info!(
            "Creating energy classifier: floor={} full_scale={}",
            config.floor, config.full_scale
        );
        Self { config, frames: 0 }
    }

    /// Frames classified so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn mean_offset(&self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum: f32 = samples.iter().map(|&s| s - self.config.midscale).sum();
        sum / samples.len() as f32
    }
}

impl Default for EnergyClassifier {
    fn default() -> Self {
        Self::new(EnergyConfig::default())
    }
}

impl Classifier for EnergyClassifier {
    fn classify(&mut self, frame: &PlanarFrame) -> InferenceResult {
        self.frames += 1;

        let strongest = (0..frame.channels())
            .filter_map(|c| frame.channel(c).map(|samples| (c, self.mean_offset(samples))))
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()));

        let Some((channel, offset)) = strongest else {
            return InferenceResult::new(GestureClass::Background, BACKGROUND_CONFIDENCE);
        };

        let magnitude = offset.abs();
        if magnitude < self.config.floor {
            return InferenceResult::new(GestureClass::Background, BACKGROUND_CONFIDENCE);
        }

        let (positive, negative) = CLASS_TABLE[channel % CLASS_TABLE.len()];
        let class = if offset >= 0.0 { positive } else { negative };
        let confidence = 0.5 + 0.5 * (magnitude / self.config.full_scale.max(f32::EPSILON)).min(1.0);

        debug!(
            "Frame {}: rx{} offset {:.1} -> {} ({:.2})",
            frame.sequence(),
            channel,
            offset,
            class,
            confidence
        );
        InferenceResult::new(class, confidence)
    }
}

/// Replays a fixed list of results, then reports background
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: VecDeque<InferenceResult>,
    calls: usize,
}

impl ScriptedClassifier {
    pub fn new(script: impl IntoIterator<Item = InferenceResult>) -> Self {
        Self {
            script: script.into_iter().collect(),
            calls: 0,
        }
    }

    /// Number of `classify` calls made
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&mut self, _frame: &PlanarFrame) -> InferenceResult {
        self.calls += 1;
        self.script.pop_front().unwrap_or_default()
    }
}
