use std::sync::Mutex;

use super::{decode_products, LocalStore, StoreError};
use crate::models::Product;

/// In-memory product store.
///
/// Holds the serialized blob rather than the decoded list so that it goes
/// through the same encoding as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given raw blob.
    pub fn with_raw(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    /// Returns a copy of the raw stored blob, if any.
    pub fn raw(&self) -> Option<String> {
        self.blob.lock().map(|b| b.clone()).unwrap_or(None)
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> Vec<Product> {
        match self.blob.lock() {
            Ok(blob) => blob
                .as_deref()
                .map(|b| decode_products(b, "memory store"))
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn save(&self, products: &[Product]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(products)?;
        // A poisoned lock still guards a plain string; take it over
        let mut blob = self.blob.lock().unwrap_or_else(|e| e.into_inner());
        *blob = Some(encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductFields, ProductId, Unit};

    #[test]
    fn test_empty_store_loads_empty() {
        let store = MemoryStore::new();
        assert!(store.load().is_empty());
        assert!(store.raw().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let products = vec![Product::from_fields(
            ProductId::Remote("abc".to_string()),
            ProductFields::new("A", "C", "Leche", "M", Unit::Unidad, 4200.0),
        )];

        store.save(&products).unwrap();

        assert_eq!(store.load(), products);
        assert!(store.raw().unwrap().contains("\"abc\""));
    }

    #[test]
    fn test_malformed_raw_loads_empty() {
        let store = MemoryStore::with_raw("[{\"broken\":");
        assert!(store.load().is_empty());
    }
}
