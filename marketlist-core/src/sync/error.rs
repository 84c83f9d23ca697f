//! Sync error types.

use thiserror::Error;

use super::report::DroppedProduct;
use crate::remote::RemoteError;

/// Errors that can occur while synchronizing with the remote collection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Empty user id; nothing was sent to the remote store.
    #[error("User id cannot be empty")]
    InvalidUser,

    /// Listing or deleting existing documents failed; nothing was inserted.
    #[error("Failed to clear remote collection: {0}")]
    ClearFailed(#[source] RemoteError),

    /// Some products could not be inserted after the collection was cleared.
    #[error("{} product(s) could not be uploaded", .dropped.len())]
    PartialInsertFailure { dropped: Vec<DroppedProduct> },

    /// The final listing failed, so canonical ids are unknown.
    #[error("Failed to read back remote collection: {0}")]
    ReadBackFailed(#[source] RemoteError),
}
