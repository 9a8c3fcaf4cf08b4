//! HTTP request handlers.

pub mod health;
pub mod login;
pub mod media;
pub mod photos;
pub mod settings;

pub use health::*;
pub use login::*;
pub use media::*;
pub use photos::*;
pub use settings::*;

use crate::error::{ApiError, ApiResult};
use crate::gateway::{StagedUpload, StorageGateway, UploadError};
use axum::extract::Multipart;

/// Stage the multipart field called `name`, ignoring any other fields.
pub(crate) async fn stage_field(
    gateway: &StorageGateway,
    mut multipart: Multipart,
    name: &str,
) -> ApiResult<StagedUpload> {
    while let Some(field) = multipart.next_field().await.map_err(UploadError::from)? {
        if field.name() != Some(name) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let staged = gateway
            .stage(file_name.as_deref(), content_type.as_deref(), field)
            .await?;
        return Ok(staged);
    }

    Err(ApiError::BadRequest(format!(
        "missing multipart field `{name}`"
    )))
}
