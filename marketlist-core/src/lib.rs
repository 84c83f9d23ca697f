//! marketlist core library
//!
//! Product model, local single-blob storage and the replace-all sync engine
//! shared by the marketlist CLI and server.

pub mod catalog;
pub mod models;
pub mod remote;
pub mod store;
pub mod sync;

pub use catalog::{CatalogError, ProductCatalog};
pub use models::{Product, ProductError, ProductFields, ProductId, Unit, MAX_PRICE};
pub use remote::{
    check_server, HttpCollection, InMemoryCollection, RemoteCollection, RemoteDocument,
    RemoteError,
};
pub use store::{FileStore, LocalStore, MemoryStore, StoreError, PRODUCTS_KEY};
pub use sync::{DroppedProduct, SyncEngine, SyncError, SyncOptions, SyncReport};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
