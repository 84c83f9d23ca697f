//! Local/remote synchronization.
//!
//! The engine implements a destructive replace-all strategy: the user's
//! remote collection is cleared, every local product is inserted as a new
//! document, and the collection is read back as the canonical list. The caller
//! then overwrites local state with that list.

mod engine;
mod error;
mod report;

pub use engine::{SyncEngine, SyncOptions, DEFAULT_MAX_IN_FLIGHT};
pub use error::SyncError;
pub use report::{DroppedProduct, SyncReport};
