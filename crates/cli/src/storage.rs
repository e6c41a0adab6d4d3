//! JSON file backend for the local cart.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use atelier_core::cart::{CartSnapshot, CartStorage, CartStorageError};

/// Keeps the cart snapshot in one JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<CartSnapshot>, CartStorageError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => CartSnapshot::from_json(&json).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), CartStorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, snapshot.to_json()?)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), lines = snapshot.items.len(), "cart saved");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::cart::{CartItem, CartStore, SNAPSHOT_VERSION};
    use rust_decimal::Decimal;

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("cart.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".atelier").join("cart.json");

        let mut store = CartStore::open(JsonFileStorage::new(&path));
        store.add_item(CartItem::new("e1", "Pearl Drops", Decimal::new(3250, 2)), 2);

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        let snapshot = JsonFileStorage::new(&path).load().unwrap().unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity, 2);
    }

    #[test]
    fn test_cart_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");

        {
            let mut store = CartStore::open(JsonFileStorage::new(&path));
            store.add_item(
                CartItem::new("r1", "Moon Ring", Decimal::new(4800, 2)).with_size("6"),
                1,
            );
        }

        let store = CartStore::open(JsonFileStorage::new(&path));
        assert_eq!(store.total_items(), 1);
        assert_eq!(store.lines()[0].item.size.as_deref(), Some("6"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = JsonFileStorage::new(&path);
        assert!(matches!(storage.load(), Err(CartStorageError::Malformed(_))));

        // The store treats it as an empty cart.
        let store = CartStore::open(storage);
        assert!(store.cart().is_empty());
    }
}
