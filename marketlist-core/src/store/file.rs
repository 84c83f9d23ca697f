use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{decode_products, LocalStore, StoreError, PRODUCTS_KEY};
use crate::models::Product;

/// File-backed product store.
///
/// The blob lives at `<data_dir>/products.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the path of the stored blob.
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", PRODUCTS_KEY))
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }
}

impl LocalStore for FileStore {
    fn load(&self) -> Vec<Product> {
        let path = self.path();

        match fs::read_to_string(&path) {
            Ok(contents) => decode_products(&contents, &path.display().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    fn save(&self, products: &[Product]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StoreError::Io(self.data_dir.clone(), e))?;

        let path = self.path();
        let contents = serde_json::to_string(products)?;

        // Write to a sibling temp file, then rename over the blob
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents).map_err(|e| StoreError::Io(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path).map_err(|e| StoreError::Io(path, e))?;

        tracing::debug!("Saved {} product(s) to {}", products.len(), self.data_dir.display());

        Ok(())
    }
}
