//! Gallery endpoints.

use super::stage_field;
use crate::error::ApiResult;
use crate::export::{ARCHIVE_FILE_NAME, build_archive};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::IntoResponse;
use saycheese_core::{PHOTOS_FOLDER, PhotoId, PhotoRecord};
use serde::Serialize;
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Multipart field carrying a guest photo.
pub const PHOTO_FIELD: &str = "photo";

/// Response for a stored upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Response for gallery deletions.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Number of records removed.
    pub deleted: usize,
}

/// POST /api/upload - Store a guest photo and add it to the gallery.
pub async fn upload_photo(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let staged = match stage_field(&state.gateway, multipart, PHOTO_FIELD).await {
        Ok(staged) => staged,
        Err(e) => {
            metrics::record_upload_error(e.code());
            return Err(e);
        }
    };
    let size = staged.size();

    let url = state
        .gateway
        .upload_staged(staged, PHOTOS_FOLDER)
        .await
        .inspect_err(|_| metrics::record_upload_error("storage"))?;

    let record = match state
        .documents
        .gallery
        .record_upload(&url, OffsetDateTime::now_utc())
        .await
    {
        Ok(record) => record,
        Err(e) => {
            // Without a ledger entry the object is unreachable; drop it.
            state.gateway.discard(&url).await;
            metrics::record_upload_error("ledger");
            return Err(e.into());
        }
    };

    metrics::PHOTOS_UPLOADED.inc();
    metrics::BYTES_UPLOADED.inc_by(size);
    info!(id = %record.id, size, "photo uploaded");

    Ok(Json(UploadResponse { url: record.url }))
}

/// GET /api/photos - List the gallery in upload order.
pub async fn list_photos(State(state): State<AppState>) -> ApiResult<Json<Vec<PhotoRecord>>> {
    Ok(Json(state.documents.gallery.list().await?))
}

/// DELETE /api/photos/{id} - Remove one photo.
///
/// Unknown ids are not an error; the gallery is left unchanged. Malformed
/// ids can never be in the ledger and count as unknown.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = match PhotoId::parse(&id) {
        Ok(id) => id,
        Err(e) => {
            info!(error = %e, "delete requested for malformed photo id");
            return Ok(Json(DeleteResponse { deleted: 0 }));
        }
    };

    let Some(record) = state.documents.gallery.remove(&id).await? else {
        info!(id = %id, "delete requested for unknown photo");
        return Ok(Json(DeleteResponse { deleted: 0 }));
    };

    state.gateway.discard(&record.url).await;
    metrics::PHOTOS_DELETED.inc();
    info!(id = %id, "photo deleted");

    Ok(Json(DeleteResponse { deleted: 1 }))
}

/// DELETE /api/photos - Remove every photo.
pub async fn clear_photos(State(state): State<AppState>) -> ApiResult<Json<DeleteResponse>> {
    let removed = state.documents.gallery.clear().await?;

    for record in &removed {
        state.gateway.discard(&record.url).await;
    }
    metrics::PHOTOS_DELETED.inc_by(removed.len() as u64);
    info!(count = removed.len(), "gallery cleared");

    Ok(Json(DeleteResponse {
        deleted: removed.len(),
    }))
}

/// GET /api/photos/download-zip - Download every photo as one zip archive.
pub async fn download_zip(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let records = state.documents.gallery.list().await?;
    let started = Instant::now();

    let archive = match build_archive(&state.gateway, &records).await {
        Ok(archive) => archive,
        Err(e) => {
            warn!(error = %e, "export failed");
            metrics::record_export("failed");
            return Err(e.into());
        }
    };

    metrics::EXPORT_DURATION.observe(started.elapsed().as_secs_f64());
    metrics::record_export("ok");
    info!(photos = records.len(), bytes = archive.size(), "gallery exported");

    Ok((
        [
            (CONTENT_TYPE, "application/zip".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
            ),
            (CONTENT_LENGTH, archive.size().to_string()),
        ],
        archive.into_body(),
    ))
}
