// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use marketlist_core::{
    InMemoryCollection, Product, ProductFields, ProductId, RemoteCollection, RemoteDocument,
    RemoteError, Unit,
};
use std::collections::HashSet;
use std::sync::Mutex;

/// One observed remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(String),
    InsertStarted(String),
    Inserted(String),
    DeleteStarted(String),
    Deleted(String),
}

/// What the recording collection should fail on.
#[derive(Debug, Default)]
pub struct Faults {
    /// Fail the n-th `list` call (0-based).
    pub fail_list_call: Option<usize>,
    /// Fail every delete.
    pub fail_deletes: bool,
    /// Fail inserts of products with these names.
    pub fail_inserts_named: HashSet<String>,
    /// Ids reported by the first `list` call that no longer exist.
    pub stale_in_first_list: Vec<String>,
}

/// Remote collection that records every call and can inject failures.
#[derive(Debug, Default)]
pub struct RecordingCollection {
    inner: InMemoryCollection,
    calls: Mutex<Vec<Call>>,
    faults: Mutex<Faults>,
    list_calls: Mutex<usize>,
}

impl RecordingCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            faults: Mutex::new(faults),
            ..Self::default()
        }
    }

    pub fn set_faults(&self, faults: Faults) {
        *self.faults.lock().unwrap() = faults;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn inner(&self) -> &InMemoryCollection {
        &self.inner
    }

    /// Inserts straight into the backing store without recording.
    pub async fn seed(&self, user_id: &str, fields: &ProductFields) -> String {
        self.inner.insert(user_id, fields).await.unwrap()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteCollection for RecordingCollection {
    async fn list(&self, user_id: &str) -> Result<Vec<RemoteDocument>, RemoteError> {
        self.record(Call::List(user_id.to_string()));

        let call_index = {
            let mut count = self.list_calls.lock().unwrap();
            let index = *count;
            *count += 1;
            index
        };
        if self.faults.lock().unwrap().fail_list_call == Some(call_index) {
            return Err(RemoteError::Backend("list unavailable".to_string()));
        }

        let mut docs = self.inner.list(user_id).await?;
        if call_index == 0 {
            let stale = self.faults.lock().unwrap().stale_in_first_list.clone();
            let gone = fields("Z", "Gone", "M0", Unit::Kg, 1.0);
            docs.extend(
                stale
                    .into_iter()
                    .map(|id| RemoteDocument::new(id, gone.clone())),
            );
        }
        Ok(docs)
    }

    async fn insert(&self, user_id: &str, fields: &ProductFields) -> Result<String, RemoteError> {
        self.record(Call::InsertStarted(fields.nombre.clone()));
        tokio::task::yield_now().await;

        if self
            .faults
            .lock()
            .unwrap()
            .fail_inserts_named
            .contains(&fields.nombre)
        {
            return Err(RemoteError::Backend(format!("rejected {}", fields.nombre)));
        }

        let id = self.inner.insert(user_id, fields).await?;
        self.record(Call::Inserted(id.clone()));
        Ok(id)
    }

    async fn delete(&self, user_id: &str, item_id: &str) -> Result<(), RemoteError> {
        self.record(Call::DeleteStarted(item_id.to_string()));
        tokio::task::yield_now().await;

        if self.faults.lock().unwrap().fail_deletes {
            return Err(RemoteError::Backend("delete refused".to_string()));
        }

        self.inner.delete(user_id, item_id).await?;
        self.record(Call::Deleted(item_id.to_string()));
        Ok(())
    }
}

pub fn fields(tienda: &str, nombre: &str, marca: &str, unidad: Unit, precio: f64) -> ProductFields {
    ProductFields::new(tienda, "C1", nombre, marca, unidad, precio)
}

pub fn local_product(id: i64, nombre: &str, precio: f64) -> Product {
    Product::from_fields(
        ProductId::Local(id),
        fields("A", nombre, "M1", Unit::Kg, precio),
    )
}

/// Sorted field values of a product list, ignoring ids.
pub fn field_values(products: &[Product]) -> Vec<String> {
    let mut values: Vec<String> = products
        .iter()
        .map(|p| serde_json::to_string(&p.fields()).unwrap())
        .collect();
    values.sort();
    values
}

pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
