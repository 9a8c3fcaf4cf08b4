//! Singleton settings documents.

use crate::error::DocumentResult;
use crate::store::{DocumentStore, read_json, write_json};
use saycheese_core::{BackgroundConfig, HeadingConfig, NamesConfig};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// A settings type persisted as its own document.
pub trait DocumentKind:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    /// Document name, also the stem of its JSON file.
    const NAME: &'static str;
}

impl DocumentKind for BackgroundConfig {
    const NAME: &'static str = "background";
}

impl DocumentKind for NamesConfig {
    const NAME: &'static str = "names";
}

impl DocumentKind for HeadingConfig {
    const NAME: &'static str = "heading";
}

/// Handle to one settings document. Reads never fail for a missing document;
/// they return the default instead.
pub struct ConfigDocument<T> {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: DocumentKind> ConfigDocument<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            _kind: PhantomData,
        }
    }

    /// Stored value, or the default when never written.
    pub async fn get(&self) -> DocumentResult<T> {
        Ok(read_json(self.store.as_ref(), T::NAME)
            .await?
            .unwrap_or_default())
    }

    /// Replace the document wholesale.
    #[instrument(skip(self, value), fields(document = T::NAME))]
    pub async fn set(&self, value: &T) -> DocumentResult<()> {
        let _guard = self.write_lock.lock().await;
        write_json(self.store.as_ref(), T::NAME, value).await
    }

    /// Reset the document to its default.
    pub async fn reset(&self) -> DocumentResult<T> {
        let value = T::default();
        self.set(&value).await?;
        Ok(value)
    }

    /// Replace the document, handing back the value it held before.
    #[instrument(skip(self, value), fields(document = T::NAME))]
    pub async fn replace(&self, value: &T) -> DocumentResult<T> {
        let _guard = self.write_lock.lock().await;
        let previous = self.get().await?;
        write_json(self.store.as_ref(), T::NAME, value).await?;
        Ok(previous)
    }

    /// Write the default if the document does not exist yet.
    pub(crate) async fn ensure_exists(&self) -> DocumentResult<bool> {
        let _guard = self.write_lock.lock().await;
        if self.store.load(T::NAME).await?.is_some() {
            return Ok(false);
        }
        write_json(self.store.as_ref(), T::NAME, &T::default()).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectDocumentStore;
    use saycheese_core::NameFont;
    use saycheese_storage::FilesystemBackend;

    async fn store(dir: &tempfile::TempDir) -> Arc<dyn DocumentStore> {
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();
        Arc::new(ObjectDocumentStore::new(Arc::new(backend), None))
    }

    #[tokio::test]
    async fn test_get_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let names = ConfigDocument::<NamesConfig>::new(store(&dir).await);
        assert_eq!(names.get().await.unwrap(), NamesConfig::default());
    }

    #[tokio::test]
    async fn test_set_then_get_returns_submitted_value() {
        let dir = tempfile::tempdir().unwrap();
        let names = ConfigDocument::<NamesConfig>::new(store(&dir).await);

        let value = NamesConfig {
            top_name: "Lina".to_string(),
            bottom_name: "Omar".to_string(),
            font: NameFont::Amiri,
            show_and_symbol: false,
        };
        names.set(&value).await.unwrap();
        assert_eq!(names.get().await.unwrap(), value);
        assert!(dir.path().join("names.json").exists());
    }

    #[tokio::test]
    async fn test_reset_clears_background() {
        let dir = tempfile::tempdir().unwrap();
        let background = ConfigDocument::<BackgroundConfig>::new(store(&dir).await);

        background
            .set(&BackgroundConfig {
                url: "https://cdn.example/bg.jpg".to_string(),
            })
            .await
            .unwrap();
        let reset = background.reset().await.unwrap();

        assert!(!reset.is_set());
        assert_eq!(background.get().await.unwrap().url, "");
    }

    #[tokio::test]
    async fn test_replace_returns_previous() {
        let dir = tempfile::tempdir().unwrap();
        let background = ConfigDocument::<BackgroundConfig>::new(store(&dir).await);

        let first = BackgroundConfig {
            url: "a".to_string(),
        };
        background.set(&first).await.unwrap();
        let previous = background
            .replace(&BackgroundConfig {
                url: "b".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(previous, first);
        assert_eq!(background.get().await.unwrap().url, "b");
    }

    #[tokio::test]
    async fn test_ensure_exists_keeps_stored_value() {
        let dir = tempfile::tempdir().unwrap();
        let heading = ConfigDocument::<HeadingConfig>::new(store(&dir).await);

        assert!(heading.ensure_exists().await.unwrap());
        let custom = HeadingConfig {
            title: "Say cheese".to_string(),
            ..HeadingConfig::default()
        };
        heading.set(&custom).await.unwrap();

        assert!(!heading.ensure_exists().await.unwrap());
        assert_eq!(heading.get().await.unwrap(), custom);
    }
}
