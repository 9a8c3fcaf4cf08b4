//! Object storage abstraction and backends for SayCheese.
//!
//! Guest photos, background images and (optionally) the JSON documents all
//! live behind [`ObjectStore`]. Two backends are provided: a local
//! filesystem directory and an S3-compatible bucket.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{
    filesystem::FilesystemBackend,
    s3::{S3Backend, S3Options},
};
pub use error::{StorageError, StorageResult};
pub use traits::{ByteStream, ObjectMeta, ObjectStore};

use saycheese_core::config::StorageConfig;
use std::sync::Arc;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
        } => {
            let backend = S3Backend::new(S3Options {
                bucket: bucket.clone(),
                endpoint: endpoint.clone(),
                region: region.clone(),
                prefix: prefix.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                force_path_style: *force_path_style,
            })
            .await?;
            Ok(Arc::new(backend))
        }
    }
}
