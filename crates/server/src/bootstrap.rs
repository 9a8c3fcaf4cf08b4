//! Startup initialization of persisted state.

use anyhow::{Context, Result};
use saycheese_documents::Documents;

/// Make sure every document exists, writing defaults for the missing ones.
///
/// Existing documents are never touched, so restarts keep the gallery and
/// settings intact.
pub async fn ensure_documents(documents: &Documents) -> Result<()> {
    let created = documents
        .ensure_defaults()
        .await
        .context("failed to initialize documents")?;

    if created.is_empty() {
        tracing::debug!("All documents already exist");
    } else {
        tracing::info!(documents = ?created, "Created missing documents with defaults");
    }

    // Surface a corrupt ledger at startup rather than on the first upload.
    let photos = documents
        .gallery
        .list()
        .await
        .context("failed to read gallery ledger")?;
    tracing::info!(photos = photos.len(), "Gallery ledger loaded");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use saycheese_documents::ObjectDocumentStore;
    use saycheese_storage::FilesystemBackend;
    use std::sync::Arc;

    async fn documents(dir: &tempfile::TempDir) -> Documents {
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();
        Documents::new(Arc::new(ObjectDocumentStore::new(Arc::new(backend), None)))
    }

    #[tokio::test]
    async fn ensure_documents_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        ensure_documents(&documents(&dir).await).await.unwrap();

        let gallery = std::fs::read_to_string(dir.path().join("gallery.json")).unwrap();
        assert_eq!(gallery, "[]");
        let names = std::fs::read_to_string(dir.path().join("names.json")).unwrap();
        assert!(names.contains("\"showAndSymbol\": true"));
    }

    #[tokio::test]
    async fn ensure_documents_keeps_existing_state() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("heading.json"),
            r#"{"title":"Lina & Omar","subtitle":"","font":"Amiri"}"#,
        )
        .unwrap();

        let documents = documents(&dir).await;
        ensure_documents(&documents).await.unwrap();

        let heading = documents.heading.get().await.unwrap();
        assert_eq!(heading.title, "Lina & Omar");
        assert_eq!(heading.font, "Amiri");
    }

    #[tokio::test]
    async fn ensure_documents_rejects_corrupt_ledger() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gallery.json"), "{oops").unwrap();

        let err = ensure_documents(&documents(&dir).await).await.unwrap_err();
        assert!(format!("{err:#}").contains("gallery"));
    }
}
