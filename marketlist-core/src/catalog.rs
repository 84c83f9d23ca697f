//! Product lifecycle operations over a [`LocalStore`].
//!
//! Every mutating operation reads the stored list, applies the change and
//! writes the whole list back before returning.

use chrono::Utc;
use thiserror::Error;

use crate::models::{Product, ProductError, ProductFields, ProductId};
use crate::store::{LocalStore, StoreError};
use crate::sync::SyncReport;

/// Errors returned by catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid product: {0}")]
    Invalid(#[from] ProductError),

    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error("No local product id left after {0}")]
    IdsExhausted(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Local product catalog backed by a single-blob store.
pub struct ProductCatalog<S> {
    store: S,
}

impl<S: LocalStore> ProductCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn list(&self) -> Vec<Product> {
        self.store.load()
    }

    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.store.load().into_iter().find(|p| &p.id == id)
    }

    /// Creates a product with a fresh local id and appends it to the list.
    pub fn create(&self, mut fields: ProductFields) -> Result<Product, CatalogError> {
        fields.validate()?;

        let mut products = self.store.load();
        let now = Utc::now();
        if fields.creacion.is_none() {
            fields.creacion = Some(now);
        }

        let id = next_local_id(&products, now.timestamp_millis())?;
        let product = Product::from_fields(id, fields);
        products.push(product.clone());
        self.store.save(&products)?;

        tracing::debug!("Created product {} ({})", product.id, product.nombre);
        Ok(product)
    }

    /// Overwrites all fields of the product with the given id.
    pub fn update(&self, id: &ProductId, fields: ProductFields) -> Result<Product, CatalogError> {
        fields.validate()?;

        let mut products = self.store.load();
        let product = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        product.overwrite(fields);
        let updated = product.clone();
        self.store.save(&products)?;

        tracing::debug!("Updated product {}", id);
        Ok(updated)
    }

    /// Removes the product with the given id, returning it.
    pub fn delete(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let mut products = self.store.load();
        let index = products
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        let removed = products.remove(index);
        self.store.save(&products)?;

        tracing::debug!("Deleted product {}", id);
        Ok(removed)
    }

    /// Replaces the whole local list, e.g. with a canonical list after a sync.
    pub fn replace_all(&self, products: &[Product]) -> Result<(), CatalogError> {
        self.store.save(products)?;
        Ok(())
    }

    /// Stores the outcome of a sync: the canonical list, followed by any
    /// dropped products under their old ids so the next sync retries them.
    pub fn apply_sync(&self, report: &SyncReport) -> Result<Vec<Product>, CatalogError> {
        let mut products = report.products.clone();
        products.extend(report.dropped.iter().map(|d| d.product.clone()));
        self.store.save(&products)?;
        Ok(products)
    }
}

/// Timestamp-derived local id, bumped past existing local ids when the clock
/// has not moved on since the last creation.
fn next_local_id(products: &[Product], now_millis: i64) -> Result<ProductId, CatalogError> {
    let highest = products
        .iter()
        .filter_map(|p| match p.id {
            ProductId::Local(id) => Some(id),
            ProductId::Remote(_) => None,
        })
        .max();

    match highest {
        Some(highest) if highest >= now_millis => highest
            .checked_add(1)
            .map(ProductId::Local)
            .ok_or(CatalogError::IdsExhausted(highest)),
        _ => Ok(ProductId::Local(now_millis)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;
    use crate::remote::RemoteError;
    use crate::store::MemoryStore;
    use crate::sync::DroppedProduct;

    fn fields(nombre: &str) -> ProductFields {
        ProductFields::new("Tienda", "Verduras", nombre, "Marca", Unit::Kg, 1500.0)
    }

    #[test]
    fn test_create_appends_and_persists() {
        let catalog = ProductCatalog::new(MemoryStore::new());

        let papa = catalog.create(fields("Papa")).unwrap();
        let yuca = catalog.create(fields("Yuca")).unwrap();

        let stored = catalog.list();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], papa);
        assert_eq!(stored[1], yuca);
        assert!(papa.creacion.is_some());
    }

    #[test]
    fn test_create_assigns_unique_local_ids() {
        let catalog = ProductCatalog::new(MemoryStore::new());

        let ids: Vec<ProductId> = (0..5)
            .map(|i| catalog.create(fields(&format!("P{}", i))).unwrap().id)
            .collect();

        for (i, id) in ids.iter().enumerate() {
            assert!(matches!(id, ProductId::Local(_)));
            assert!(!ids[i + 1..].contains(id));
        }
    }

    #[test]
    fn test_create_rejects_invalid() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let mut bad = fields("Papa");
        bad.tienda = String::new();

        let result = catalog.create(bad);

        assert!(matches!(
            result,
            Err(CatalogError::Invalid(ProductError::MissingField("tienda")))
        ));
        assert!(catalog.list().is_empty());
    }

    #[test]
    fn test_next_local_id_bumps_past_future_ids() {
        let existing = vec![Product::from_fields(ProductId::Local(5_000), fields("Papa"))];
        assert_eq!(next_local_id(&existing, 1_000).unwrap(), ProductId::Local(5_001));
        assert_eq!(next_local_id(&existing, 9_000).unwrap(), ProductId::Local(9_000));
        assert_eq!(next_local_id(&[], 42).unwrap(), ProductId::Local(42));
    }

    #[test]
    fn test_create_after_max_local_id_fails_cleanly() {
        let blob = format!(
            r#"[{{"id":{},"tienda":"A","categoria":"C","nombre":"N","marca":"M","unidad":"kg","precio":1.0}}]"#,
            i64::MAX
        );
        let catalog = ProductCatalog::new(MemoryStore::with_raw(blob));

        let result = catalog.create(fields("Papa"));

        assert!(matches!(result, Err(CatalogError::IdsExhausted(i64::MAX))));
        assert_eq!(catalog.list().len(), 1);
    }

    #[test]
    fn test_update_overwrites_fields() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let papa = catalog.create(fields("Papa")).unwrap();

        let mut changed = fields("Papa criolla");
        changed.precio = 2100.0;
        changed.unidad = Unit::Lb;
        let updated = catalog.update(&papa.id, changed).unwrap();

        assert_eq!(updated.id, papa.id);
        assert_eq!(updated.nombre, "Papa criolla");
        assert_eq!(updated.unidad, Unit::Lb);
        assert_eq!(catalog.get(&papa.id).unwrap(), updated);
    }

    #[test]
    fn test_update_missing_product() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let result = catalog.update(&ProductId::Local(1), fields("Papa"));
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_delete_removes_and_persists() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let papa = catalog.create(fields("Papa")).unwrap();
        let yuca = catalog.create(fields("Yuca")).unwrap();

        let removed = catalog.delete(&papa.id).unwrap();

        assert_eq!(removed, papa);
        assert_eq!(catalog.list(), vec![yuca]);
        assert!(matches!(
            catalog.delete(&papa.id),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_replace_all() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        catalog.create(fields("Papa")).unwrap();

        let canonical = vec![Product::from_fields(
            ProductId::Remote("r-1".to_string()),
            fields("Papa"),
        )];
        catalog.replace_all(&canonical).unwrap();

        assert_eq!(catalog.list(), canonical);
    }

    #[test]
    fn test_apply_sync_keeps_dropped_products() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let papa = catalog.create(fields("Papa")).unwrap();
        let yuca = catalog.create(fields("Yuca")).unwrap();

        let report = SyncReport {
            products: vec![Product::from_fields(
                ProductId::Remote("r-1".to_string()),
                papa.fields(),
            )],
            cleared: 0,
            inserted: 1,
            dropped: vec![DroppedProduct {
                product: yuca.clone(),
                reason: RemoteError::Backend("timeout".to_string()),
            }],
        };

        let stored = catalog.apply_sync(&report).unwrap();

        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, ProductId::Remote("r-1".to_string()));
        assert_eq!(stored[1], yuca);
        assert_eq!(catalog.list(), stored);
    }
}
