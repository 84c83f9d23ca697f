use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RemoteCollection, RemoteDocument, RemoteError};
use crate::models::ProductFields;

/// Remote collection held in process memory.
///
/// Item ids are fresh UUIDs, so a re-inserted product never gets its old id
/// back.
#[derive(Debug, Default)]
pub struct InMemoryCollection {
    /// user_id -> (item_id -> fields)
    users: RwLock<HashMap<String, BTreeMap<String, ProductFields>>>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored for a user.
    pub async fn len(&self, user_id: &str) -> usize {
        self.users
            .read()
            .await
            .get(user_id)
            .map(|items| items.len())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, user_id: &str) -> bool {
        self.len(user_id).await == 0
    }
}

#[async_trait]
impl RemoteCollection for InMemoryCollection {
    async fn list(&self, user_id: &str) -> Result<Vec<RemoteDocument>, RemoteError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .map(|items| {
                items
                    .iter()
                    .map(|(id, fields)| RemoteDocument::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, user_id: &str, fields: &ProductFields) -> Result<String, RemoteError> {
        let id = Uuid::new_v4().simple().to_string();
        let mut users = self.users.write().await;
        users
            .entry(user_id.to_string())
            .or_default()
            .insert(id.clone(), fields.clone());
        Ok(id)
    }

    async fn delete(&self, user_id: &str, item_id: &str) -> Result<(), RemoteError> {
        let mut users = self.users.write().await;
        users
            .get_mut(user_id)
            .and_then(|items| items.remove(item_id))
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(item_id.to_string()))
    }
}
