//! Application state shared across handlers.

use crate::auth::AdminCredentials;
use crate::gateway::{FetchError, StorageGateway};
use saycheese_core::config::AppConfig;
use saycheese_documents::{DocumentStore, Documents};
use saycheese_storage::ObjectStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend holding uploaded images.
    pub storage: Arc<dyn ObjectStore>,
    /// Gallery ledger and settings documents.
    pub documents: Arc<Documents>,
    /// Upload/fetch front of the object store.
    pub gateway: Arc<StorageGateway>,
    /// Digest of the configured admin credential.
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Fails only if the outbound HTTP client cannot be built.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        document_store: Arc<dyn DocumentStore>,
    ) -> Result<Self, FetchError> {
        let gateway = StorageGateway::new(storage.clone(), &config.media)?;
        let admin = AdminCredentials::from_config(&config.admin);

        Ok(Self {
            config: Arc::new(config),
            storage,
            documents: Arc::new(Documents::new(document_store)),
            gateway: Arc::new(gateway),
            admin: Arc::new(admin),
        })
    }
}
