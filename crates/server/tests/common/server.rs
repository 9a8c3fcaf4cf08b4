//! Server test utilities.

use saycheese_core::config::{AppConfig, DocumentsConfig, StorageConfig};
use saycheese_server::bootstrap::ensure_documents;
use saycheese_server::{AppState, create_router};
use std::path::PathBuf;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = AppConfig::for_testing();
        config.storage = StorageConfig::Filesystem {
            path: temp_dir.path().join("uploads"),
        };
        config.documents = DocumentsConfig::Filesystem {
            path: temp_dir.path().join("documents"),
        };
        config.media.staging_dir = Some(temp_dir.path().join("staging"));

        // Apply user modifications
        modifier(&mut config);

        let storage = saycheese_storage::from_config(&config.storage)
            .await
            .expect("Failed to create storage backend");
        let document_store = saycheese_documents::from_config(&config.documents, storage.clone())
            .await
            .expect("Failed to create document store");

        let state = AppState::new(config, storage, document_store).expect("Failed to build state");
        ensure_documents(&state.documents)
            .await
            .expect("Failed to initialize documents");

        let router = create_router(state.clone());

        Self {
            router,
            state,
            temp_dir,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Number of files left behind in the upload staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.path("staging"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
