//! Server-side modules for the marketlist sync server.

pub mod api;
pub mod storage;

pub use api::{router, ApiError, ApiKeyEntry, ApiKeyStore, AppState, AuthUser};
pub use storage::{ItemStorage, ServerStorageError};
