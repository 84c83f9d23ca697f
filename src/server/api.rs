//! HTTP API for the marketlist server.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /me`: Returns the user the API key belongs to
//! - `GET /users/{user_id}/items`: Lists a user's items
//! - `POST /users/{user_id}/items`: Stores a new item, `201 { "id": ... }`
//! - `DELETE /users/{user_id}/items/{item_id}`: Deletes an item, `204`
//!
//! Every route except `/health` needs `Authorization: Bearer <key>`, and a key
//! only grants access to its own user's items.

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use marketlist_core::remote::{HealthResponse, InsertResponse, MeResponse};
use marketlist_core::{ProductFields, RemoteDocument};

use super::storage::{ItemStorage, ServerStorageError};

// ============================================================================
// Authentication
// ============================================================================

/// API key entry in config
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyEntry {
    pub key: String,
    pub user_id: String,
}

/// Config file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    api_keys: Vec<ApiKeyEntry>,
}

/// Authenticated user info, added to request extensions after auth
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// API key store - maps key -> AuthUser
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashMap<String, AuthUser>,
}

impl ApiKeyStore {
    pub fn from_entries(entries: impl IntoIterator<Item = ApiKeyEntry>) -> Self {
        let keys = entries
            .into_iter()
            .map(|entry| {
                (
                    entry.key,
                    AuthUser {
                        user_id: entry.user_id,
                    },
                )
            })
            .collect();
        Self { keys }
    }

    /// Load API keys from config file
    pub fn load(config_path: &FsPath) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
                Ok(config) => {
                    let store = Self::from_entries(config.api_keys);
                    tracing::info!("Loaded {} API key(s)", store.len());
                    store
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
                tracing::warn!("No API keys loaded - all authenticated requests will fail");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Validate an API key and return the associated user
    pub fn validate(&self, key: &str) -> Option<AuthUser> {
        self.keys.get(key).cloned()
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    api_keys: Arc<ApiKeyStore>,
    storage: Arc<RwLock<ItemStorage>>,
}

impl AppState {
    pub fn new(api_keys: ApiKeyStore, storage: ItemStorage) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
            storage: Arc::new(RwLock::new(storage)),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

/// Authentication middleware
async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(key) => key,
            None => {
                return error_response(
                    StatusCode::UNAUTHORIZED,
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                );
            }
        },
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authorization header required",
            );
        }
    };

    match state.api_keys.validate(api_key) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => error_response(StatusCode::UNAUTHORIZED, "invalid_key", "Invalid API key"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Errors returned by item handlers
#[derive(Debug)]
pub enum ApiError {
    Forbidden(String),
    InvalidProduct(String),
    NotFound(String),
    Storage(ServerStorageError),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Forbidden(user_id) => {
                write!(f, "API key does not grant access to user {}", user_id)
            }
            ApiError::InvalidProduct(msg) => write!(f, "Invalid product: {}", msg),
            ApiError::NotFound(item_id) => write!(f, "Item not found: {}", item_id),
            ApiError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServerStorageError> for ApiError {
    fn from(e: ServerStorageError) -> Self {
        ApiError::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::Forbidden(_) => error_response(StatusCode::FORBIDDEN, "forbidden", message),
            ApiError::InvalidProduct(_) => {
                error_response(StatusCode::BAD_REQUEST, "invalid_product", message)
            }
            ApiError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Storage(ServerStorageError::InvalidId(_)) => {
                error_response(StatusCode::BAD_REQUEST, "invalid_id", message)
            }
            ApiError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "Failed to access storage",
                )
            }
        }
    }
}

fn authorize(user: &AuthUser, user_id: &str) -> Result<(), ApiError> {
    if user.user_id != user_id {
        tracing::warn!(
            "User {} attempted to access items of {}",
            user.user_id,
            user_id
        );
        return Err(ApiError::Forbidden(user_id.to_string()));
    }
    Ok(())
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get current user info (auth required)
async fn me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
    })
}

async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RemoteDocument>>, ApiError> {
    authorize(&user, &user_id)?;

    let docs = state.storage.read().await.list(&user_id)?;
    tracing::debug!("Listed {} item(s) for {}", docs.len(), user_id);
    Ok(Json(docs))
}

async fn insert_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(fields): Json<ProductFields>,
) -> Result<(StatusCode, Json<InsertResponse>), ApiError> {
    authorize(&user, &user_id)?;
    fields
        .validate()
        .map_err(|e| ApiError::InvalidProduct(e.to_string()))?;

    let id = state.storage.write().await.insert(&user_id, &fields)?;
    tracing::debug!("Inserted item {} for {}", id, user_id);
    Ok((StatusCode::CREATED, Json(InsertResponse { id })))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((user_id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    authorize(&user, &user_id)?;

    if state.storage.write().await.delete(&user_id, &item_id)? {
        tracing::debug!("Deleted item {} for {}", item_id, user_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(item_id))
    }
}

/// Builds the server's router.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/me", get(me))
        .route("/users/{user_id}/items", get(list_items).post(insert_item))
        .route("/users/{user_id}/items/{item_id}", delete(delete_item))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
