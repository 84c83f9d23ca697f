//! The per-user remote document collection.
//!
//! Documents are addressed by `(user_id, item_id)`; the store assigns item ids
//! on insert. Only the three primitives needed by the sync engine exist here.

mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Product, ProductFields, ProductId};

pub use http::{check_server, HealthResponse, HttpCollection, InsertResponse, MeResponse};
pub use memory::InMemoryCollection;

/// A document as stored remotely: its assigned id plus the product fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: ProductFields,
}

impl RemoteDocument {
    pub fn new(id: impl Into<String>, fields: ProductFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn into_product(self) -> Product {
        Product::from_fields(ProductId::Remote(self.id), self.fields)
    }
}

/// Errors reported by a remote collection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Remote store error: {0}")]
    Backend(String),
}

/// Remote per-user document collection.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Lists every document in the user's collection.
    async fn list(&self, user_id: &str) -> Result<Vec<RemoteDocument>, RemoteError>;

    /// Inserts a new document, returning the id the store assigned to it.
    async fn insert(&self, user_id: &str, fields: &ProductFields) -> Result<String, RemoteError>;

    /// Deletes one document.
    async fn delete(&self, user_id: &str, item_id: &str) -> Result<(), RemoteError>;
}

#[async_trait]
impl<R: RemoteCollection + ?Sized> RemoteCollection for Arc<R> {
    async fn list(&self, user_id: &str) -> Result<Vec<RemoteDocument>, RemoteError> {
        (**self).list(user_id).await
    }

    async fn insert(&self, user_id: &str, fields: &ProductFields) -> Result<String, RemoteError> {
        (**self).insert(user_id, fields).await
    }

    async fn delete(&self, user_id: &str, item_id: &str) -> Result<(), RemoteError> {
        (**self).delete(user_id, item_id).await
    }
}
