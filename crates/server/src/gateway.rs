//! Storage gateway: turns uploaded bytes into permanent URLs and back.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use saycheese_core::UPLOADS_ROUTE_PREFIX;
use saycheese_core::config::MediaConfig;
use saycheese_storage::{ObjectStore, StorageError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

const USER_AGENT: &str = concat!("saycheese/", env!("CARGO_PKG_VERSION"));

/// Failure to stage or store an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("uploaded file is empty")]
    Empty,

    #[error("failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("object store rejected {key}: {source}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },
}

impl UploadError {
    /// Whether the request body itself was over the transport limit.
    pub fn is_body_limit(&self) -> bool {
        matches!(self, Self::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE)
    }
}

/// Failure to read back a photo by URL.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to read {url} from storage: {source}")]
    Storage {
        url: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to download {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unsupported photo url: {0}")]
    UnsupportedUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// An upload written to a local temporary file.
///
/// The file is deleted when this value is dropped, whether or not it was
/// ever stored.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    size: u64,
    extension: String,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Extension including the leading dot, or empty.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Stores uploaded images and resolves their URLs.
pub struct StorageGateway {
    store: Arc<dyn ObjectStore>,
    url_base: String,
    staging_dir: PathBuf,
    max_upload_bytes: u64,
    http: reqwest::Client,
}

impl StorageGateway {
    pub fn new(store: Arc<dyn ObjectStore>, media: &MediaConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            store,
            url_base: media.url_base(),
            staging_dir: media
                .staging_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            max_upload_bytes: media.max_upload_bytes,
            http,
        })
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Directory for temporary upload and export files.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Stream an upload body into a temporary file, enforcing the size limit.
    pub async fn stage<S, E>(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        body: S,
    ) -> Result<StagedUpload, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        UploadError: From<E>,
    {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let temp = tempfile::Builder::new()
            .prefix(".saycheese-upload-")
            .tempfile_in(&self.staging_dir)?;
        let (file, path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut body = std::pin::pin!(body);
        let mut size: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            if size > self.max_upload_bytes {
                return Err(UploadError::TooLarge {
                    limit: self.max_upload_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if size == 0 {
            return Err(UploadError::Empty);
        }

        Ok(StagedUpload {
            path,
            size,
            extension: extension_for(file_name, content_type),
        })
    }

    /// Store a staged upload under `folder` and return its permanent URL.
    ///
    /// The staged file is removed before returning, on success and failure.
    #[instrument(skip(self, staged), fields(size = staged.size))]
    pub async fn upload_staged(
        &self,
        staged: StagedUpload,
        folder: &str,
    ) -> Result<String, UploadError> {
        let data = tokio::fs::read(staged.path()).await?;
        let result = self
            .upload(Bytes::from(data), folder, staged.extension())
            .await;

        if let Err(e) = staged.path.close() {
            warn!(error = %e, "failed to remove staged upload");
        }
        result
    }

    /// Store `data` under `folder` and return its permanent URL.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(
        &self,
        data: Bytes,
        folder: &str,
        extension: &str,
    ) -> Result<String, UploadError> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }

        let key = object_key(folder, extension, OffsetDateTime::now_utc());
        self.store
            .put(&key, data)
            .await
            .map_err(|source| UploadError::Storage {
                key: key.clone(),
                source,
            })?;

        debug!(key = %key, "object stored");
        Ok(self.url_for(&key))
    }

    /// Read the bytes behind a photo URL.
    ///
    /// URLs this gateway handed out are read from the object store; anything
    /// else is downloaded over HTTP(S).
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        if let Some(key) = self.key_for_url(url) {
            return self
                .store
                .get(&key)
                .await
                .map_err(|source| FetchError::Storage {
                    url: url.to_string(),
                    source,
                });
        }

        if !is_http_url(url) {
            return Err(FetchError::UnsupportedUrl(url.to_string()));
        }

        let http_err = |source: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?;
        response.bytes().await.map_err(http_err)
    }

    /// Best-effort removal of the object behind `url`.
    ///
    /// Returns whether an object was deleted. Foreign URLs and missing
    /// objects are skipped.
    #[instrument(skip(self))]
    pub async fn discard(&self, url: &str) -> bool {
        let Some(key) = self.key_for_url(url) else {
            debug!("url not owned by this gateway, leaving it alone");
            return false;
        };

        match self.store.delete(&key).await {
            Ok(()) => true,
            Err(e) if e.is_not_found() => {
                debug!(key = %key, "object already gone");
                false
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to delete object");
                false
            }
        }
    }

    /// Object key behind a URL this gateway produced.
    pub fn key_for_url(&self, url: &str) -> Option<String> {
        let url = url.split(['?', '#']).next().unwrap_or_default();
        let rest = url
            .strip_prefix(self.url_base.as_str())
            .or_else(|| url.strip_prefix(UPLOADS_ROUTE_PREFIX))?;
        let key = rest.strip_prefix('/')?;
        (!key.is_empty()).then(|| key.to_string())
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.url_base, key)
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// `<folder>/<unix-millis>-<random><ext>`
fn object_key(folder: &str, extension: &str, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{folder}/{millis}-{}{extension}", &suffix[..8])
}

fn extension_for(file_name: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase());

    from_name
        .or_else(|| {
            content_type
                .and_then(extension_for_content_type)
                .map(str::to_string)
        })
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

/// Content type to serve a stored object with, from its key's extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let ext = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
