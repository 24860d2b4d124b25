//! Gesture classes and inference results

use crate::ClassError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gesture class reported by the classifier.
///
/// Discriminants are the wire indices. `Unknown1`/`Unknown2` are reserved
/// slots: they serialize and parse but are never selectable for detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum GestureClass {
    /// No gesture
    #[default]
    #[serde(rename = "BACKGROUND")]
    Background = 0,
    #[serde(rename = "PUSH")]
    Push = 1,
    #[serde(rename = "SWIPE_LEFT")]
    SwipeLeft = 2,
    #[serde(rename = "SWIPE_RIGHT")]
    SwipeRight = 3,
    #[serde(rename = "UNKNOWN_1")]
    Unknown1 = 4,
    #[serde(rename = "UNKNOWN_2")]
    Unknown2 = 5,
    #[serde(rename = "SWIPE_UP")]
    SwipeUp = 6,
    #[serde(rename = "SWIPE_DOWN")]
    SwipeDown = 7,
}

impl GestureClass {
    /// Every class in wire order
    pub const ALL: [GestureClass; 8] = [
        GestureClass::Background,
        GestureClass::Push,
        GestureClass::SwipeLeft,
        GestureClass::SwipeRight,
        GestureClass::Unknown1,
        GestureClass::Unknown2,
        GestureClass::SwipeUp,
        GestureClass::SwipeDown,
    ];

    /// Classes an operator may enable, in console listing order
    pub const SELECTABLE: [GestureClass; 5] = [
        GestureClass::Push,
        GestureClass::SwipeLeft,
        GestureClass::SwipeRight,
        GestureClass::SwipeUp,
        GestureClass::SwipeDown,
    ];

    /// Wire index
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Console / log name
    pub fn as_str(self) -> &'static str {
        match self {
            GestureClass::Background => "BACKGROUND",
            GestureClass::Push => "PUSH",
            GestureClass::SwipeLeft => "SWIPE_LEFT",
            GestureClass::SwipeRight => "SWIPE_RIGHT",
            GestureClass::Unknown1 => "UNKNOWN_1",
            GestureClass::Unknown2 => "UNKNOWN_2",
            GestureClass::SwipeUp => "SWIPE_UP",
            GestureClass::SwipeDown => "SWIPE_DOWN",
        }
    }

    /// Reserved slot, never asserted as detected
    pub fn is_reserved(self) -> bool {
        matches!(self, GestureClass::Unknown1 | GestureClass::Unknown2)
    }

    /// Can be switched on in the detection mask
    pub fn is_selectable(self) -> bool {
        self != GestureClass::Background && !self.is_reserved()
    }
}

impl fmt::Display for GestureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for GestureClass {
    type Error = ClassError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        GestureClass::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(ClassError::UnknownIndex(index))
    }
}

impl FromStr for GestureClass {
    type Err = ClassError;

    /// Case-insensitive name lookup
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureClass::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ClassError::UnknownName(s.to_string()))
    }
}

/// Configuration-side class selector: a concrete class or "match any".
///
/// `Any` is never produced by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSelector {
    Class(GestureClass),
    Any,
}

impl FromStr for GestureSelector {
    type Err = ClassError;

    /// Accepts `ALL` or `ANY` (any case) for the pseudo-class
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("any") {
            return Ok(GestureSelector::Any);
        }
        s.parse().map(GestureSelector::Class)
    }
}

/// One classifier output
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Detected class
    pub class: GestureClass,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,
}

impl InferenceResult {
    /// Build a result, clamping confidence into 0.0..=1.0
    pub fn new(class: GestureClass, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self { class, confidence }
    }
}
