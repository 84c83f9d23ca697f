use super::error::SyncError;
use crate::models::Product;
use crate::remote::RemoteError;

/// A local product whose insert failed during a sync.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedProduct {
    pub product: Product,
    pub reason: RemoteError,
}

/// Outcome of a successful synchronization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncReport {
    /// Canonical list read back from the remote store, with remote ids.
    pub products: Vec<Product>,
    /// Number of documents deleted in the clear phase.
    pub cleared: usize,
    /// Number of products inserted.
    pub inserted: usize,
    /// Products whose insert failed, in their original order.
    pub dropped: Vec<DroppedProduct>,
}

impl SyncReport {
    /// True if every local product reached the remote store.
    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }

    /// Returns the canonical list, or `PartialInsertFailure` if anything was dropped.
    pub fn into_complete(self) -> Result<Vec<Product>, SyncError> {
        if self.dropped.is_empty() {
            Ok(self.products)
        } else {
            Err(SyncError::PartialInsertFailure {
                dropped: self.dropped,
            })
        }
    }
}
