//! Local persistence of the product list.
//!
//! The whole list is stored as one JSON blob under a single well-known key.
//! Reads never fail: a missing or unreadable blob is an empty list, so corrupt
//! local state can never block the application.

mod file;
mod memory;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::Product;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key under which the product list is stored.
pub const PRODUCTS_KEY: &str = "products";

/// Synchronous full-replace storage for the product list.
pub trait LocalStore {
    /// Returns the stored list, or an empty list if nothing usable is stored.
    fn load(&self) -> Vec<Product>;

    /// Overwrites the stored list.
    fn save(&self, products: &[Product]) -> Result<(), StoreError>;
}

impl<S: LocalStore + ?Sized> LocalStore for &S {
    fn load(&self) -> Vec<Product> {
        (**self).load()
    }

    fn save(&self, products: &[Product]) -> Result<(), StoreError> {
        (**self).save(products)
    }
}

/// Errors that can occur while writing the product list.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error for {0}: {1}")]
    Io(PathBuf, #[source] io::Error),

    #[error("Failed to serialize products: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Decodes a stored blob, degrading to an empty list on malformed data.
pub(crate) fn decode_products(blob: &str, origin: &str) -> Vec<Product> {
    match serde_json::from_str::<Vec<Product>>(blob) {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!("Discarding unreadable product list in {}: {}", origin, e);
            Vec::new()
        }
    }
}
