//! Full-replace synchronization of a product list with the remote collection.

use futures::stream::{self, StreamExt, TryStreamExt};

use super::error::SyncError;
use super::report::{DroppedProduct, SyncReport};
use crate::models::Product;
use crate::remote::{RemoteCollection, RemoteError};

/// Default number of concurrent remote requests within a phase.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Tuning for a [`SyncEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Upper bound on concurrent requests within one phase. `0` means 1.
    pub max_in_flight: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Mirrors a local product list into a user's remote collection.
///
/// A sync runs three phases, each joined before the next starts:
/// 1. clear: delete every remote document of the user
/// 2. insert: upload every local product as a new document
/// 3. read-back: list the collection, which becomes the canonical list
///
/// The remote store assigns new ids on insert, so the canonical list is the
/// only source of ids after a sync. Clear and insert are not atomic: a crash
/// in between leaves the remote collection empty until the next sync.
pub struct SyncEngine<R> {
    remote: R,
    options: SyncOptions,
}

impl<R: RemoteCollection> SyncEngine<R> {
    pub fn new(remote: R) -> Self {
        Self::with_options(remote, SyncOptions::default())
    }

    pub fn with_options(remote: R, options: SyncOptions) -> Self {
        Self { remote, options }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Replaces the user's remote collection with `local_products` and returns
    /// the canonical list. Surrounding whitespace in `user_id` is ignored.
    ///
    /// An empty `local_products` leaves the remote collection untouched and
    /// only reads it back. Insert failures do not abort the sync; they are
    /// listed in [`SyncReport::dropped`].
    pub async fn synchronize(
        &self,
        user_id: &str,
        local_products: &[Product],
    ) -> Result<SyncReport, SyncError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(SyncError::InvalidUser);
        }

        let mut report = SyncReport::default();

        if !local_products.is_empty() {
            report.cleared = self.clear(user_id).await?;

            let dropped = self.insert_all(user_id, local_products).await;
            report.inserted = local_products.len() - dropped.len();
            report.dropped = dropped;
        }

        report.products = self.read_back(user_id).await?;

        tracing::info!(
            "Synchronized {} product(s) for {}: {} cleared, {} inserted, {} dropped",
            report.products.len(),
            user_id,
            report.cleared,
            report.inserted,
            report.dropped.len()
        );

        Ok(report)
    }

    fn max_in_flight(&self) -> usize {
        self.options.max_in_flight.max(1)
    }

    /// Deletes every document of the user. A document that is already gone
    /// counts as deleted; any other failure aborts the sync.
    async fn clear(&self, user_id: &str) -> Result<usize, SyncError> {
        let docs = self
            .remote
            .list(user_id)
            .await
            .map_err(SyncError::ClearFailed)?;

        let count = docs.len();
        tracing::debug!("Clearing {} remote document(s) for {}", count, user_id);

        stream::iter(docs)
            .map(|doc| async move {
                match self.remote.delete(user_id, &doc.id).await {
                    Err(RemoteError::NotFound(id)) => {
                        tracing::debug!("Remote document {} already deleted", id);
                        Ok(())
                    }
                    result => result,
                }
            })
            .buffer_unordered(self.max_in_flight())
            .try_collect::<Vec<()>>()
            .await
            .map_err(|e| {
                tracing::warn!("Clear phase failed for {}: {}", user_id, e);
                SyncError::ClearFailed(e)
            })?;

        Ok(count)
    }

    /// Inserts every product, returning those whose insert failed.
    async fn insert_all(&self, user_id: &str, products: &[Product]) -> Vec<DroppedProduct> {
        let mut failures: Vec<(usize, DroppedProduct)> = stream::iter(products.iter().enumerate())
            .map(|(index, product)| async move {
                let fields = product.fields();
                let result = self.remote.insert(user_id, &fields).await;
                (index, product, result)
            })
            .buffer_unordered(self.max_in_flight())
            .filter_map(|(index, product, result)| async move {
                match result {
                    Ok(item_id) => {
                        tracing::debug!("Inserted {} as {}", product.id, item_id);
                        None
                    }
                    Err(reason) => {
                        tracing::warn!(
                            "Failed to insert {} ({}): {}",
                            product.id,
                            product.nombre,
                            reason
                        );
                        Some((
                            index,
                            DroppedProduct {
                                product: product.clone(),
                                reason,
                            },
                        ))
                    }
                }
            })
            .collect()
            .await;

        failures.sort_by_key(|(index, _)| *index);
        failures.into_iter().map(|(_, dropped)| dropped).collect()
    }

    /// Lists the collection as the canonical product list.
    async fn read_back(&self, user_id: &str) -> Result<Vec<Product>, SyncError> {
        let docs = self.remote.list(user_id).await.map_err(|e| {
            tracing::warn!("Read-back failed for {}: {}", user_id, e);
            SyncError::ReadBackFailed(e)
        })?;

        Ok(docs.into_iter().map(|doc| doc.into_product()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductFields, ProductId, Unit};
    use crate::remote::InMemoryCollection;

    fn local(id: i64, nombre: &str, precio: f64) -> Product {
        Product::from_fields(
            ProductId::Local(id),
            ProductFields::new("A", "C1", nombre, "M1", Unit::Kg, precio),
        )
    }

    #[tokio::test]
    async fn test_synchronize_replaces_ids() {
        let engine = SyncEngine::new(InMemoryCollection::new());
        let products = vec![local(1, "Papa", 1000.0), local(2, "Yuca", 800.0)];

        let report = engine.synchronize("u1", &products).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.inserted, 2);
        assert_eq!(report.products.len(), 2);
        assert!(report.products.iter().all(|p| p.id.is_remote()));
    }

    #[tokio::test]
    async fn test_blank_user_rejected() {
        let engine = SyncEngine::new(InMemoryCollection::new());
        let result = engine.synchronize("   ", &[local(1, "Papa", 1.0)]).await;
        assert_eq!(result, Err(SyncError::InvalidUser));
        assert!(engine.remote().is_empty("   ").await);
    }

    #[tokio::test]
    async fn test_user_id_is_trimmed_before_use() {
        let engine = SyncEngine::new(InMemoryCollection::new());

        engine
            .synchronize(" u1 ", &[local(1, "Papa", 1.0)])
            .await
            .unwrap();

        assert_eq!(engine.remote().len("u1").await, 1);
        assert!(engine.remote().is_empty(" u1 ").await);
    }

    #[tokio::test]
    async fn test_empty_input_only_reads_back() {
        let remote = InMemoryCollection::new();
        remote
            .insert("u1", &local(1, "Papa", 1.0).fields())
            .await
            .unwrap();
        let engine = SyncEngine::new(remote);

        let report = engine.synchronize("u1", &[]).await.unwrap();

        assert_eq!(report.cleared, 0);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].nombre, "Papa");
    }

    #[tokio::test]
    async fn test_zero_max_in_flight_still_progresses() {
        let engine = SyncEngine::with_options(
            InMemoryCollection::new(),
            SyncOptions { max_in_flight: 0 },
        );
        let products = vec![local(1, "Papa", 1.0), local(2, "Yuca", 2.0)];

        let report = engine.synchronize("u1", &products).await.unwrap();
        assert_eq!(report.products.len(), 2);
    }
}
