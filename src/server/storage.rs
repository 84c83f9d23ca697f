//! Server-side product document storage.
//!
//! Stores one JSON document per item, grouped by user:
//! ```text
//! <DATA_DIR>/
//!   <user_id>/
//!     <item_id>.json
//! ```
//!
//! Writes go through a temp file and a rename, so a reader never sees a
//! half-written document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use marketlist_core::{ProductFields, RemoteDocument};

const ITEM_EXTENSION: &str = "json";
const CORRUPT_EXTENSION: &str = "corrupt";

/// Errors that can occur during server storage operations.
#[derive(Debug)]
pub enum ServerStorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Error serializing a document.
    SerializeError(serde_json::Error),
    /// Invalid user or item ID (e.g., contains path separators).
    InvalidId(String),
}

impl std::fmt::Display for ServerStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            ServerStorageError::SerializeError(e) => {
                write!(f, "Failed to serialize document: {}", e)
            }
            ServerStorageError::InvalidId(id) => {
                write!(f, "Invalid ID: {}", id)
            }
        }
    }
}

impl std::error::Error for ServerStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerStorageError::IoError(_, e) => Some(e),
            ServerStorageError::SerializeError(e) => Some(e),
            ServerStorageError::InvalidId(_) => None,
        }
    }
}

/// Per-user item collections on disk.
#[derive(Debug, Clone)]
pub struct ItemStorage {
    data_dir: PathBuf,
}

impl ItemStorage {
    /// Creates a new storage instance rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Validates a user or item ID to prevent path traversal attacks.
    pub fn validate_id(id: &str) -> Result<(), ServerStorageError> {
        if id.is_empty()
            || id.contains('/')
            || id.contains('\\')
            || id.contains("..")
            || id.starts_with('.')
        {
            return Err(ServerStorageError::InvalidId(id.to_string()));
        }
        Ok(())
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.data_dir.join(user_id)
    }

    fn item_path(&self, user_id: &str, item_id: &str) -> PathBuf {
        self.user_dir(user_id)
            .join(format!("{}.{}", item_id, ITEM_EXTENSION))
    }

    /// Lists every item of a user, ordered by item id.
    ///
    /// Item ids are time-ordered, so this is the order in which inserts
    /// arrived. Unreadable documents are renamed to `<id>.corrupt` so they
    /// drop out of the collection and stay on disk for inspection.
    pub fn list(&self, user_id: &str) -> Result<Vec<RemoteDocument>, ServerStorageError> {
        Self::validate_id(user_id)?;

        let dir = self.user_dir(user_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ServerStorageError::IoError(dir, e)),
        };

        let mut docs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ServerStorageError::IoError(dir.clone(), e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ITEM_EXTENSION) {
                continue;
            }
            let Some(item_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ServerStorageError::IoError(path, e)),
            };

            match serde_json::from_str::<ProductFields>(&contents) {
                Ok(fields) => docs.push(RemoteDocument::new(item_id, fields)),
                Err(e) => {
                    tracing::warn!("Moving aside corrupt item {}: {}", path.display(), e);
                    Self::quarantine(&path)?;
                }
            }
        }

        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    fn quarantine(path: &Path) -> Result<(), ServerStorageError> {
        let target = path.with_extension(CORRUPT_EXTENSION);
        match fs::rename(path, &target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServerStorageError::IoError(path.to_path_buf(), e)),
        }
    }

    /// Stores a new item for a user and returns its freshly assigned id.
    pub fn insert(
        &self,
        user_id: &str,
        fields: &ProductFields,
    ) -> Result<String, ServerStorageError> {
        Self::validate_id(user_id)?;

        let user_dir = self.user_dir(user_id);
        fs::create_dir_all(&user_dir)
            .map_err(|e| ServerStorageError::IoError(user_dir.clone(), e))?;

        let item_id = Uuid::now_v7().simple().to_string();
        let path = self.item_path(user_id, &item_id);
        let bytes = serde_json::to_vec(fields).map_err(ServerStorageError::SerializeError)?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &bytes)
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path).map_err(|e| ServerStorageError::IoError(path, e))?;

        Ok(item_id)
    }

    /// Deletes an item. Returns `false` if it did not exist.
    pub fn delete(&self, user_id: &str, item_id: &str) -> Result<bool, ServerStorageError> {
        Self::validate_id(user_id)?;
        Self::validate_id(item_id)?;

        let path = self.item_path(user_id, item_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ServerStorageError::IoError(path, e)),
        }
    }
}
