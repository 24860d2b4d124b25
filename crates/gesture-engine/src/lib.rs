//! Gesture Inference
//!
//! Defines the gesture class enumeration, the per-frame inference result, and
//! the classifier call boundary. The gesture algorithm itself is opaque: the
//! crate ships a signal-energy mock and a scripted classifier for tests.

mod class;
mod classifier;

pub use class::{GestureClass, GestureSelector, InferenceResult};
pub use classifier::{Classifier, EnergyClassifier, EnergyConfig, ScriptedClassifier};

use thiserror::Error;

/// Errors converting wire values into gesture classes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassError {
    #[error("Unknown gesture index {0}")]
    UnknownIndex(u8),

    #[error("Unknown gesture name '{0}'")]
    UnknownName(String),
}
