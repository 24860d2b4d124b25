//! Detection mask

use gesture_engine::{GestureClass, GestureSelector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Set of gesture classes acted upon.
///
/// One bit per wire index. Only selectable classes can ever be set, so
/// background and the reserved slots are always clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<GestureClass>", into = "Vec<GestureClass>")]
pub struct DetectionMask(u8);

impl DetectionMask {
    const SELECTABLE_BITS: u8 = (1 << 1) | (1 << 2) | (1 << 3) | (1 << 6) | (1 << 7);

    /// No class enabled
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every selectable class enabled
    pub const fn all() -> Self {
        Self(Self::SELECTABLE_BITS)
    }

    /// Rebuild from a raw word, dropping non-selectable bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::SELECTABLE_BITS)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, class: GestureClass) -> bool {
        self.0 & (1 << class.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Enable a class. Returns false for classes that cannot be selected.
    pub fn insert(&mut self, class: GestureClass) -> bool {
        if !class.is_selectable() {
            return false;
        }
        self.0 |= 1 << class.index();
        true
    }

    /// Apply a console selector. Returns false if nothing could be enabled.
    pub fn select(&mut self, selector: GestureSelector) -> bool {
        match selector {
            GestureSelector::Any => {
                self.0 = Self::SELECTABLE_BITS;
                true
            }
            GestureSelector::Class(class) => self.insert(class),
        }
    }

    /// Enabled classes in wire order
    pub fn iter(self) -> impl Iterator<Item = GestureClass> {
        GestureClass::ALL.into_iter().filter(move |class| self.contains(*class))
    }
}

impl Default for DetectionMask {
    /// Every selectable class; reserved slots off
    fn default() -> Self {
        Self::all()
    }
}

impl From<Vec<GestureClass>> for DetectionMask {
    fn from(classes: Vec<GestureClass>) -> Self {
        let mut mask = Self::empty();
        for class in classes {
            mask.insert(class);
        }
        mask
    }
}

impl From<DetectionMask> for Vec<GestureClass> {
    fn from(mask: DetectionMask) -> Self {
        mask.iter().collect()
    }
}

impl fmt::Display for DetectionMask {
    /// Space-separated class names
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for class in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(class.as_str())?;
            first = false;
        }
        Ok(())
    }
}
