//! HTTP client for the marketlist server's per-user item collection.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{RemoteCollection, RemoteDocument, RemoteError};
use crate::models::ProductFields;

/// Default timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for the reachability check.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Body returned when a document is inserted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsertResponse {
    pub id: String,
}

/// Body returned by `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeResponse {
    pub user_id: String,
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Remote collection served over HTTP by `marketlist-server`.
#[derive(Debug, Clone)]
pub struct HttpCollection {
    server_url: String,
    api_key: String,
    client: Client,
}

impl HttpCollection {
    /// Creates a collection client with the default request timeout.
    pub fn new(
        server_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        Self::with_timeout(server_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        server_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        Ok(Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Asks the server which user the API key belongs to.
    pub async fn fetch_identity(&self) -> Result<String, RemoteError> {
        let response = self
            .authorized(self.client.get(build_http_url(&self.server_url, "/me")))
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        let me: MeResponse = decode(check_status(response).await?).await?;
        Ok(me.user_id)
    }

    fn items_url(&self, user_id: &str) -> String {
        build_http_url(
            &self.server_url,
            &format!("/users/{}/items", urlencoding::encode(user_id)),
        )
    }

    fn item_url(&self, user_id: &str, item_id: &str) -> String {
        format!("{}/{}", self.items_url(user_id), urlencoding::encode(item_id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.api_key))
    }
}

#[async_trait]
impl RemoteCollection for HttpCollection {
    async fn list(&self, user_id: &str) -> Result<Vec<RemoteDocument>, RemoteError> {
        let response = self
            .authorized(self.client.get(self.items_url(user_id)))
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        decode(check_status(response).await?).await
    }

    async fn insert(&self, user_id: &str, fields: &ProductFields) -> Result<String, RemoteError> {
        let response = self
            .authorized(self.client.post(self.items_url(user_id)))
            .json(fields)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        let inserted: InsertResponse = decode(check_status(response).await?).await?;
        Ok(inserted.id)
    }

    async fn delete(&self, user_id: &str, item_id: &str) -> Result<(), RemoteError> {
        let response = self
            .authorized(self.client.delete(self.item_url(user_id, item_id)))
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(item_id.to_string()));
        }
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    response
        .json()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

/// Normalizes a configured server address into an HTTP base URL and appends `path`.
fn build_http_url(server_url: &str, path: &str) -> String {
    let base_url = if server_url.starts_with("ws://") {
        server_url.replacen("ws://", "http://", 1)
    } else if server_url.starts_with("wss://") {
        server_url.replacen("wss://", "https://", 1)
    } else if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
        format!("http://{}", server_url)
    } else {
        server_url.to_string()
    };

    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Returns true if the server answers its health check.
pub async fn check_server(server_url: &str) -> bool {
    let client = match Client::builder().timeout(HEALTH_TIMEOUT).build() {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client.get(build_http_url(server_url, "/health")).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::debug!("Health check for {} failed: {}", server_url, e);
            false
        }
    }
}
