//! Raw document persistence.

use crate::error::{DocumentError, DocumentResult};
use async_trait::async_trait;
use bytes::Bytes;
use saycheese_storage::ObjectStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Named JSON blobs, read and replaced whole.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Load a document body. `None` when it was never written.
    async fn load(&self, name: &str) -> DocumentResult<Option<Bytes>>;

    /// Replace a document body atomically.
    async fn save(&self, name: &str, body: Bytes) -> DocumentResult<()>;

    /// Check that the underlying store is reachable.
    async fn health_check(&self) -> DocumentResult<()>;
}

/// Stores each document as `<prefix>/<name>.json` in an object store.
pub struct ObjectDocumentStore {
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
}

impl ObjectDocumentStore {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<String>) -> Self {
        let prefix = prefix
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());
        Self { store, prefix }
    }

    fn key(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{name}.json"),
            None => format!("{name}.json"),
        }
    }
}

#[async_trait]
impl DocumentStore for ObjectDocumentStore {
    async fn load(&self, name: &str) -> DocumentResult<Option<Bytes>> {
        match self.store.get(&self.key(name)).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, name: &str, body: Bytes) -> DocumentResult<()> {
        self.store.put(&self.key(name), body).await?;
        Ok(())
    }

    async fn health_check(&self) -> DocumentResult<()> {
        self.store.health_check().await?;
        Ok(())
    }
}

/// Load and decode a document.
pub(crate) async fn read_json<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    name: &str,
) -> DocumentResult<Option<T>> {
    let Some(body) = store.load(name).await? else {
        return Ok(None);
    };
    serde_json::from_slice(&body)
        .map(Some)
        .map_err(|source| DocumentError::Corrupt {
            name: name.to_string(),
            source,
        })
}

/// Encode a document as 2-space indented JSON and save it.
pub(crate) async fn write_json<T: Serialize + ?Sized>(
    store: &dyn DocumentStore,
    name: &str,
    value: &T,
) -> DocumentResult<()> {
    let body = serde_json::to_vec_pretty(value).map_err(|source| DocumentError::Serialize {
        name: name.to_string(),
        source,
    })?;
    store.save(name, Bytes::from(body)).await
}
