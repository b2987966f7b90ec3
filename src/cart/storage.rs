//! Durable cart snapshot: a single JSON document in a versioned envelope,
//! read once at startup and overwritten wholesale after every mutation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::model::UnifiedCart;

/// Version written into every snapshot envelope. Bump on incompatible
/// schema changes; older or unknown versions load as an empty cart.
pub const CART_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access cart snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode cart snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unsupported cart snapshot version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Deserialize)]
struct CartEnvelope {
    version: u32,
    cart: UnifiedCart,
}

#[derive(Debug, Serialize)]
struct CartEnvelopeRef<'a> {
    version: u32,
    cart: &'a UnifiedCart,
}

#[derive(Clone, Debug)]
pub struct CartStorage {
    path: PathBuf,
}

impl CartStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted cart. A missing file is a normal first run;
    /// unreadable or outdated snapshots are discarded with a warning and
    /// the session starts from an empty cart.
    pub fn load(&self) -> UnifiedCart {
        match self.try_load() {
            Ok(Some(cart)) => cart,
            Ok(None) => UnifiedCart::default(),
            Err(err) => {
                warn!(%err, path = %self.path.display(), "discarding unreadable cart snapshot");
                UnifiedCart::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<UnifiedCart>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let envelope: CartEnvelope = serde_json::from_str(&raw)?;
        if envelope.version != CART_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion(envelope.version));
        }
        Ok(Some(envelope.cart))
    }

    /// Overwrites the snapshot with the full cart state.
    pub fn save(&self, cart: &UnifiedCart) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let envelope = CartEnvelopeRef {
            version: CART_SCHEMA_VERSION,
            cart,
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&envelope)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::model::{cart_item_id, CartItem};
    use crate::catalog::{Platform, ProductKey, UnifiedProduct};
    use rust_decimal_macros::dec;

    fn storage_in(dir: &tempfile::TempDir) -> CartStorage {
        CartStorage::new(dir.path().join("cart.json"))
    }

    fn cart_with_one_item() -> UnifiedCart {
        let product = UnifiedProduct {
            id: ProductKey::new(Platform::Printify, "42"),
            name: "Tee".to_string(),
            description: None,
            images: Vec::new(),
            variants: Vec::new(),
            tags: Vec::new(),
            platform: Platform::Printify,
            original: serde_json::Value::Null,
        };
        let mut cart = UnifiedCart::default();
        cart.printify.items.push(CartItem {
            id: cart_item_id(&product.id, None),
            product,
            quantity: 2,
            selected_variant: Some(super::super::model::SelectedVariant {
                id: "7".to_string(),
                title: "Large".to_string(),
                price: dec!(25.00),
            }),
        });
        cart.recompute_totals();
        cart
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let cart = storage.load();
        assert!(!cart.has_items());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let cart = cart_with_one_item();
        storage.save(&cart).unwrap();

        let loaded = storage.load();
        assert_eq!(loaded.total_items, 2);
        assert_eq!(loaded.total_value, dec!(50.00));
        assert_eq!(loaded.printify.items[0].id, "printify-42");
    }

    #[test]
    fn corrupt_snapshot_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), b"{not json").unwrap();
        assert!(!storage.load().has_items());
    }

    #[test]
    fn future_version_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        fs::write(
            storage.path(),
            serde_json::json!({"version": 99, "cart": {}}).to_string(),
        )
        .unwrap();
        assert!(!storage.load().has_items());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CartStorage::new(dir.path().join("nested/deeper/cart.json"));
        storage.save(&UnifiedCart::default()).unwrap();
        assert!(storage.path().exists());
    }
}
