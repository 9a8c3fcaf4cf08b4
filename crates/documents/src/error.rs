//! Document store error types.

use saycheese_core::PhotoId;
use saycheese_storage::StorageError;
use thiserror::Error;

/// Document store operation errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("document {name} is corrupt: {source}")]
    Corrupt {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize document {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("photo id already recorded: {0}")]
    DuplicateId(PhotoId),
}

/// Result type for document operations.
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
