//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Answer cross-origin requests from any origin, so a separately hosted
    /// guest page can call the API (default: true).
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_cors_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
            cors_enabled: default_cors_enabled(),
        }
    }
}

/// Shared admin credential.
///
/// One username/password pair guards every admin route. There are no
/// per-user accounts.
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    /// WARNING: Prefer SAYCHEESE_ADMIN__PASSWORD over storing this in a file.
    pub password: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminConfig {
    /// Create a test configuration.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            username: "admin".to_string(),
            password: "test-password".to_string(),
        }
    }

    /// Validate that both halves of the credential are present.
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("admin.username must not be empty".to_string());
        }
        if self.password.is_empty() {
            return Err("admin.password must not be empty".to_string());
        }
        if self.username.contains(':') {
            return Err("admin.username must not contain ':' (reserved by Basic auth)".to_string());
        }
        Ok(())
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, R2, etc.).
        endpoint: Option<String>,
        /// AWS region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// AWS access key ID. Falls back to AWS_ACCESS_KEY_ID env var if not set.
        access_key_id: Option<String>,
        /// AWS secret access key. Falls back to AWS_SECRET_ACCESS_KEY env var if not set.
        secret_access_key: Option<String>,
        /// Force path-style URLs (`endpoint/bucket/key`). Required for MinIO.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/uploads"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::S3 {
                access_key_id,
                secret_access_key,
                ..
            } => match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                (Some(_), Some(_)) | (None, None) => Ok(()),
                _ => Err(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                ),
            },
            _ => Ok(()),
        }
    }
}

/// Where the gallery ledger and settings documents are kept.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentsConfig {
    /// Flat JSON files in a local directory.
    Filesystem {
        /// Directory holding `gallery.json`, `background.json`, ...
        path: PathBuf,
    },
    /// JSON objects inside the configured object store, under `prefix`.
    Storage {
        #[serde(default = "default_documents_prefix")]
        prefix: String,
    },
}

fn default_documents_prefix() -> String {
    "documents".to_string()
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/documents"),
        }
    }
}

/// Media upload and URL settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Externally reachable base URL of this server (no trailing slash).
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Base URL objects are publicly reachable under (public bucket or CDN).
    /// When unset, objects are served by this server under `/uploads/`.
    #[serde(default)]
    pub object_url_base: Option<String>,
    /// Maximum accepted size of one uploaded image in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Directory for staging uploads before they reach storage.
    /// Defaults to the system temp directory.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

fn default_public_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_max_upload_bytes() -> u64 {
    crate::DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            object_url_base: None,
            max_upload_bytes: default_max_upload_bytes(),
            staging_dir: None,
        }
    }
}

impl MediaConfig {
    /// Base URL under which stored objects are addressed, without trailing slash.
    pub fn url_base(&self) -> String {
        match &self.object_url_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!(
                "{}{}",
                self.public_base_url.trim_end_matches('/'),
                crate::UPLOADS_ROUTE_PREFIX
            ),
        }
    }

    /// Validate media configuration.
    pub fn validate(&self) -> Result<(), String> {
        let check_url = |name: &str, url: &str| {
            let lower = url.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                Ok(())
            } else {
                Err(format!("media.{name} must be an http(s) URL, got {url:?}"))
            }
        };
        check_url("public_base_url", &self.public_base_url)?;
        if let Some(base) = &self.object_url_base {
            check_url("object_url_base", base)?;
        }
        if self.max_upload_bytes == 0 {
            return Err("media.max_upload_bytes must be greater than 0".to_string());
        }
        if self.max_upload_bytes > crate::MAX_UPLOAD_BYTES_LIMIT {
            return Err(format!(
                "media.max_upload_bytes {} exceeds limit {}",
                self.max_upload_bytes,
                crate::MAX_UPLOAD_BYTES_LIMIT
            ));
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    /// Admin credential (required).
    pub admin: AdminConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem storage and documents and a
    /// fixed admin credential.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            documents: DocumentsConfig::default(),
            admin: AdminConfig::for_testing(),
            media: MediaConfig::default(),
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.admin.validate()?;
        self.storage.validate()?;
        self.media.validate()?;
        Ok(())
    }

    /// Apply a `PORT` value as provided by hosting platforms.
    ///
    /// Binds all interfaces on that port. Non-numeric values are rejected.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<(), String> {
        let Some(port) = port.map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        let port: u16 = port
            .parse()
            .map_err(|_| format!("PORT must be a number between 0 and 65535, got {port:?}"))?;
        self.server.bind = format!("0.0.0.0:{port}");
        Ok(())
    }
}
