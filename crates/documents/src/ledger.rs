//! The gallery ledger: every uploaded photo, in upload order.

use crate::error::{DocumentError, DocumentResult};
use crate::store::{DocumentStore, read_json, write_json};
use saycheese_core::{PhotoId, PhotoRecord};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Document name of the ledger.
pub const GALLERY_DOCUMENT: &str = "gallery";

/// Ordered photo records persisted as a single JSON array.
///
/// Every mutation is a read-modify-write of the whole array under one lock,
/// so concurrent uploads and deletes never lose each other's changes.
pub struct Ledger {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Current records in insertion order.
    pub async fn list(&self) -> DocumentResult<Vec<PhotoRecord>> {
        Ok(read_json(self.store.as_ref(), GALLERY_DOCUMENT)
            .await?
            .unwrap_or_default())
    }

    /// Append a record. Fails if its id is already present.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn append(&self, record: PhotoRecord) -> DocumentResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.list().await?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(DocumentError::DuplicateId(record.id));
        }
        records.push(record);
        self.persist(&records).await
    }

    /// Record a freshly uploaded photo, allocating the next free id.
    #[instrument(skip(self))]
    pub async fn record_upload(
        &self,
        url: &str,
        now: OffsetDateTime,
    ) -> DocumentResult<PhotoRecord> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.list().await?;

        let newest = records
            .iter()
            .map(|r| &r.id)
            .filter(|id| id.as_millis().is_some())
            .max_by_key(|id| id.as_millis());
        let record = PhotoRecord::new(PhotoId::next(now, newest), url, now);

        records.push(record.clone());
        self.persist(&records).await?;
        debug!(id = %record.id, "photo recorded");
        Ok(record)
    }

    /// Remove the record with `id`. Returns `None` and leaves the ledger
    /// untouched when no such record exists.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn remove(&self, id: &PhotoId) -> DocumentResult<Option<PhotoRecord>> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.list().await?;
        let Some(pos) = records.iter().position(|r| &r.id == id) else {
            return Ok(None);
        };
        let removed = records.remove(pos);
        self.persist(&records).await?;
        Ok(Some(removed))
    }

    /// Empty the ledger, returning what it held.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> DocumentResult<Vec<PhotoRecord>> {
        let _guard = self.write_lock.lock().await;
        let records = self.list().await?;
        self.persist(&[]).await?;
        Ok(records)
    }

    /// Write an empty ledger if none exists yet.
    pub(crate) async fn ensure_exists(&self) -> DocumentResult<bool> {
        let _guard = self.write_lock.lock().await;
        if self.store.load(GALLERY_DOCUMENT).await?.is_some() {
            return Ok(false);
        }
        self.persist(&[]).await?;
        Ok(true)
    }

    async fn persist(&self, records: &[PhotoRecord]) -> DocumentResult<()> {
        write_json(self.store.as_ref(), GALLERY_DOCUMENT, records).await
    }
}
