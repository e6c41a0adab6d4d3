//! Persisted form of the cart and the storage seam.
//!
//! The cart belongs to the client session. Where it is kept (a JSON file for
//! the CLI, memory in tests) is the caller's decision, expressed by
//! implementing [`CartStorage`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CartLineItem;
use crate::types::CheckoutSessionId;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised by cart storage backends.
#[derive(Debug, Error)]
pub enum CartStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported cart snapshot version {found} (expected at most {SNAPSHOT_VERSION})")]
    UnsupportedVersion { found: u32 },
}

/// Saved cart state. Totals are derived on load and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub version: u32,
    pub items: Vec<CartLineItem>,
    /// Checkout sessions whose completion already cleared this cart.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_checkouts: Vec<CheckoutSessionId>,
    pub saved_at: DateTime<Utc>,
}

impl CartSnapshot {
    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `CartStorageError::Malformed` if serialization fails.
    pub fn to_json(&self) -> Result<String, CartStorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot from JSON, rejecting newer format versions.
    ///
    /// # Errors
    ///
    /// Returns `CartStorageError::Malformed` for invalid JSON and
    /// `CartStorageError::UnsupportedVersion` for a version this build does
    /// not understand.
    pub fn from_json(json: &str) -> Result<Self, CartStorageError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(CartStorageError::UnsupportedVersion {
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}

/// Durable client-local storage for the cart.
pub trait CartStorage {
    /// Load the saved snapshot, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or holds bad data.
    fn load(&self) -> Result<Option<CartSnapshot>, CartStorageError>;

    /// Replace the saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), CartStorageError>;
}

/// In-memory storage, for tests and for sessions that should not persist.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    snapshot: Option<CartSnapshot>,
    saves: usize,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            snapshot: None,
            saves: 0,
        }
    }

    /// Create storage that already holds a snapshot.
    #[must_use]
    pub const fn with_snapshot(snapshot: CartSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            saves: 0,
        }
    }

    /// The last saved snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&CartSnapshot> {
        self.snapshot.as_ref()
    }

    /// Number of successful saves.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<CartSnapshot>, CartStorageError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), CartStorageError> {
        self.snapshot = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::CartItem;

    fn snapshot(version: u32) -> CartSnapshot {
        CartSnapshot {
            version,
            items: vec![CartLineItem {
                item: CartItem::new("cuff-3", "Brass Cuff", Decimal::new(6000, 2)),
                quantity: 1,
            }],
            completed_checkouts: Vec::new(),
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let original = snapshot(SNAPSHOT_VERSION);
        let json = original.to_json().unwrap();
        assert!(!json.contains("completed_checkouts"));
        assert_eq!(CartSnapshot::from_json(&json).unwrap(), original);
    }

    #[test]
    fn test_snapshot_rejects_future_version() {
        let json = snapshot(SNAPSHOT_VERSION + 1).to_json().unwrap();
        let err = CartSnapshot::from_json(&json).unwrap_err();
        assert!(matches!(err, CartStorageError::UnsupportedVersion { found: 2 }));
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        let err = CartSnapshot::from_json("{not json").unwrap_err();
        assert!(matches!(err, CartStorageError::Malformed(_)));
    }

    #[test]
    fn test_memory_storage_counts_saves() {
        let mut storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.save(&snapshot(SNAPSHOT_VERSION)).unwrap();
        storage.save(&snapshot(SNAPSHOT_VERSION)).unwrap();

        assert_eq!(storage.saves(), 2);
        assert!(storage.snapshot().is_some());
    }
}
