//! S3-compatible storage backend using AWS SDK.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectMeta, ObjectStore};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::future::ProvideCredentials as ProvideCredentialsFuture;
use aws_sdk_s3::Client;
use aws_smithy_http_client::Builder as SmithyHttpClientBuilder;
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::io::ReaderStream;
use tracing::instrument;

const DEFAULT_REGION: &str = "us-east-1";
const HEALTH_CHECK_KEY: &str = ".saycheese-health-check";
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Marker included in lazy-credentials errors so they surface as config
/// errors instead of generic S3 transport failures.
const CREDENTIALS_ERROR_MARKER: &str = "saycheese-s3-lazy-credentials";

/// Connection settings for [`S3Backend`].
#[derive(Clone, Default)]
pub struct S3Options {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub prefix: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Use `endpoint/bucket/key` URLs. Needed for MinIO and most
    /// self-hosted S3-compatible services.
    pub force_path_style: bool,
}

impl std::fmt::Debug for S3Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Options")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("prefix", &self.prefix)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "[REDACTED]"))
            .field("force_path_style", &self.force_path_style)
            .finish_non_exhaustive()
    }
}

/// Resolves the AWS default credentials chain on the first signed request.
///
/// Building the chain eagerly touches TLS roots, which some minimal
/// containers do not ship.
#[derive(Debug)]
struct LazyDefaultCredentialsProvider {
    region: String,
    chain: OnceCell<aws_config::default_provider::credentials::DefaultCredentialsChain>,
}

impl LazyDefaultCredentialsProvider {
    fn new(region: String) -> Self {
        Self {
            region,
            chain: OnceCell::new(),
        }
    }

    async fn credentials(&self) -> aws_credential_types::provider::Result {
        let region = aws_config::Region::new(self.region.clone());
        let chain = self
            .chain
            .get_or_try_init(|| async move {
                tokio::task::spawn(async move {
                    aws_config::default_provider::credentials::DefaultCredentialsChain::builder()
                        .region(region)
                        .build()
                        .await
                })
                .await
                .map_err(|join_err| {
                    CredentialsError::provider_error(format!(
                        "{CREDENTIALS_ERROR_MARKER}: failed to initialize AWS credential chain: {join_err}"
                    ))
                })
            })
            .await?;

        chain.provide_credentials().await.map_err(|err| {
            CredentialsError::provider_error(format!(
                "{CREDENTIALS_ERROR_MARKER}: AWS credentials resolution failed: {err}"
            ))
        })
    }
}

impl ProvideCredentials for LazyDefaultCredentialsProvider {
    fn provide_credentials<'a>(&'a self) -> ProvideCredentialsFuture<'a>
    where
        Self: 'a,
    {
        ProvideCredentialsFuture::new(self.credentials())
    }
}

fn map_s3_operation_error<E>(err: aws_sdk_s3::error::SdkError<E>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    if err.to_string().contains(CREDENTIALS_ERROR_MARKER) {
        return StorageError::Config(
            "S3 credential initialization failed. Configure access_key_id/secret_access_key or provide ambient AWS credentials."
                .to_string(),
        );
    }

    StorageError::S3(Box::new(err))
}

fn is_not_found<E>(err: &aws_sdk_s3::error::SdkError<E>) -> bool {
    matches!(
        err,
        aws_sdk_s3::error::SdkError::ServiceError(service_err)
            if service_err.raw().status().as_u16() == 404
    )
}

/// Prepend `http://` to bare `host:port` endpoints such as `minio:9000`.
fn normalize_endpoint(endpoint: &str) -> String {
    let lower = endpoint.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

/// S3-compatible object store.
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    endpoint: Option<String>,
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl S3Backend {
    /// Create a new S3 backend. No request is sent until the first operation.
    pub async fn new(options: S3Options) -> StorageResult<Self> {
        let S3Options {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
        } = options;

        if bucket.trim().is_empty() {
            return Err(StorageError::Config("s3 bucket must not be empty".to_string()));
        }

        let region = region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()));

        builder = match (access_key_id, secret_access_key) {
            (Some(key_id), Some(secret)) => {
                let credentials = aws_sdk_s3::config::Credentials::new(
                    key_id,
                    secret,
                    None,
                    None,
                    "saycheese-config",
                );
                builder.credentials_provider(credentials)
            }
            (None, None) => {
                builder.credentials_provider(LazyDefaultCredentialsProvider::new(region))
            }
            _ => {
                return Err(StorageError::Config(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                ));
            }
        };

        let endpoint = endpoint.as_deref().map(normalize_endpoint);
        if let Some(url) = &endpoint {
            builder = builder.endpoint_url(url);

            // Plain HTTP endpoints (local MinIO) do not need native trust roots.
            if url.to_ascii_lowercase().starts_with("http://") {
                builder = builder.http_client(SmithyHttpClientBuilder::new().build_http());
            }
        }

        if force_path_style {
            builder = builder.force_path_style(true);
        }

        let prefix = prefix
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket,
            prefix,
            endpoint,
        })
    }

    /// Get the full object key for a key (applies prefix if configured).
    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn map_sdk_error<E>(err: aws_sdk_s3::error::SdkError<E>, key: &str) -> StorageError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        if is_not_found(&err) {
            return StorageError::NotFound(key.to_string());
        }
        map_s3_operation_error(err)
    }
}

#[async_trait]
impl ObjectStore for S3Backend {
    #[instrument(skip(self), fields(backend = "s3"))]
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(e, key))?;

        let last_modified = output
            .last_modified()
            .and_then(|dt| time::OffsetDateTime::from_unix_timestamp(dt.secs()).ok());

        Ok(ObjectMeta {
            size: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified,
            content_type: output.content_type().map(|s| s.to_string()),
        })
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(e, key))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(Box::new(e)))?
            .into_bytes();

        Ok(bytes)
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        use futures::StreamExt;

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(e, key))?;

        let stream = ReaderStream::new(output.body.into_async_read())
            .map(|result| result.map_err(StorageError::Io));

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self, data), fields(backend = "s3", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .body(data.into())
            .send()
            .await
            .map_err(map_s3_operation_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        // delete_object succeeds on missing keys, so probe first to report NotFound.
        self.head(key).await?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(map_s3_operation_error)?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn health_check(&self) -> StorageResult<()> {
        let marker_key = self.full_key(HEALTH_CHECK_KEY);

        let probe = async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&marker_key)
                .body(Bytes::from_static(b"health-check").into())
                .send()
                .await
                .map_err(map_s3_operation_error)?;

            match self
                .client
                .delete_object()
                .bucket(&self.bucket)
                .key(&marker_key)
                .send()
                .await
            {
                Ok(_) => Ok(()),
                Err(e) if is_not_found(&e) => Ok(()),
                Err(e) => Err(map_s3_operation_error(e)),
            }
        };

        tokio::time::timeout(HEALTH_CHECK_TIMEOUT, probe)
            .await
            .map_err(|_| {
                StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "S3 health check timed out after 10 seconds",
                ))
            })?
    }
}
