//! Row patterns: which grid slots in a row hold products and which hold text.

use core::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing or validating layout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutConfigError {
    #[error("row pattern is empty")]
    EmptyPattern,

    #[error("invalid slot code {slot:?} in row pattern {pattern:?} (expected P or S)")]
    InvalidSlot { pattern: String, slot: char },

    #[error("patterned layout needs at least one row pattern")]
    NoRows,

    #[error("row pattern {row} has {found} slots, expected {expected}")]
    WidthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row patterns contain no product slot")]
    NoProductSlots,
}

/// One slot of a row pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// `P`: holds the next product.
    Product,
    /// `S`: holds the next text snippet.
    Spacer,
}

impl SlotKind {
    /// Single-character code used in pattern strings.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Product => 'P',
            Self::Spacer => 'S',
        }
    }

    const fn from_code(code: char) -> Option<Self> {
        match code {
            'P' => Some(Self::Product),
            'S' => Some(Self::Spacer),
            _ => None,
        }
    }
}

/// A parsed row pattern such as `S P P S`.
///
/// Whitespace between codes is optional, so `"SPPS"` parses the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowPattern(Vec<SlotKind>);

impl RowPattern {
    /// Build a pattern from slots.
    ///
    /// # Errors
    ///
    /// Returns `LayoutConfigError::EmptyPattern` if `slots` is empty.
    pub fn new(slots: Vec<SlotKind>) -> Result<Self, LayoutConfigError> {
        if slots.is_empty() {
            return Err(LayoutConfigError::EmptyPattern);
        }
        Ok(Self(slots))
    }

    /// Slots from left to right.
    #[must_use]
    pub fn slots(&self) -> &[SlotKind] {
        &self.0
    }

    /// Number of slots, which is the grid's column count.
    #[must_use]
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Number of product slots in the row.
    #[must_use]
    pub fn product_slots(&self) -> usize {
        self.0
            .iter()
            .filter(|slot| **slot == SlotKind::Product)
            .count()
    }
}

impl FromStr for RowPattern {
    type Err = LayoutConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slots = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| {
                SlotKind::from_code(c).ok_or_else(|| LayoutConfigError::InvalidSlot {
                    pattern: s.to_owned(),
                    slot: c,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(slots)
    }
}

impl fmt::Display for RowPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slot) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", slot.code())?;
        }
        Ok(())
    }
}
