//! JSON document persistence for SayCheese.
//!
//! This crate owns the mutable application state:
//! - The gallery ledger of uploaded photos
//! - The background, names and heading settings shown on the guest page
//!
//! Every document is a flat JSON file kept behind a [`DocumentStore`], which
//! by default writes through the object store abstraction.

pub mod error;
pub mod ledger;
pub mod settings;
pub mod store;

pub use error::{DocumentError, DocumentResult};
pub use ledger::Ledger;
pub use settings::{ConfigDocument, DocumentKind};
pub use store::{DocumentStore, ObjectDocumentStore};

use saycheese_core::config::DocumentsConfig;
use saycheese_core::{BackgroundConfig, HeadingConfig, NamesConfig};
use saycheese_storage::{FilesystemBackend, ObjectStore};
use std::sync::Arc;
use tracing::info;

/// All documents of one deployment.
pub struct Documents {
    pub gallery: Ledger,
    pub background: ConfigDocument<BackgroundConfig>,
    pub names: ConfigDocument<NamesConfig>,
    pub heading: ConfigDocument<HeadingConfig>,
    store: Arc<dyn DocumentStore>,
}

impl Documents {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            gallery: Ledger::new(store.clone()),
            background: ConfigDocument::new(store.clone()),
            names: ConfigDocument::new(store.clone()),
            heading: ConfigDocument::new(store.clone()),
            store,
        }
    }

    /// Create every missing document with its default value.
    ///
    /// Returns the names of the documents that were created.
    pub async fn ensure_defaults(&self) -> DocumentResult<Vec<&'static str>> {
        let mut created = Vec::new();
        if self.gallery.ensure_exists().await? {
            created.push(ledger::GALLERY_DOCUMENT);
        }
        if self.background.ensure_exists().await? {
            created.push(BackgroundConfig::NAME);
        }
        if self.names.ensure_exists().await? {
            created.push(NamesConfig::NAME);
        }
        if self.heading.ensure_exists().await? {
            created.push(HeadingConfig::NAME);
        }
        Ok(created)
    }

    pub async fn health_check(&self) -> DocumentResult<()> {
        self.store.health_check().await
    }
}

/// Create a document store from configuration.
///
/// `storage` is the media object store, used when documents are configured
/// to live next to the uploads.
pub async fn from_config(
    config: &DocumentsConfig,
    storage: Arc<dyn ObjectStore>,
) -> DocumentResult<Arc<dyn DocumentStore>> {
    match config {
        DocumentsConfig::Filesystem { path } => {
            info!(path = %path.display(), "Storing documents on the local filesystem");
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(ObjectDocumentStore::new(Arc::new(backend), None)))
        }
        DocumentsConfig::Storage { prefix } => {
            info!(
                backend = storage.backend_name(),
                prefix = %prefix,
                "Storing documents in the object store"
            );
            Ok(Arc::new(ObjectDocumentStore::new(
                storage,
                Some(prefix.clone()),
            )))
        }
    }
}
