//! Guest page settings endpoints.
//!
//! Updates replace a document wholesale: fields missing from the request
//! body fall back to their defaults.

use super::stage_field;
use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Multipart, State};
use saycheese_core::{BACKGROUNDS_FOLDER, BackgroundConfig, HeadingConfig, NamesConfig};
use tracing::info;

/// Multipart field carrying a background image.
pub const BACKGROUND_FIELD: &str = "background";

/// GET /api/background - Current background.
pub async fn get_background(State(state): State<AppState>) -> ApiResult<Json<BackgroundConfig>> {
    Ok(Json(state.documents.background.get().await?))
}

/// POST /api/background - Point the background at a URL.
pub async fn set_background(
    State(state): State<AppState>,
    Json(background): Json<BackgroundConfig>,
) -> ApiResult<Json<BackgroundConfig>> {
    let previous = state.documents.background.replace(&background).await?;
    discard_replaced_background(&state, &previous, &background).await;
    info!(url = %background.url, "background updated");
    Ok(Json(background))
}

/// DELETE /api/background - Clear the background.
pub async fn delete_background(
    State(state): State<AppState>,
) -> ApiResult<Json<BackgroundConfig>> {
    let cleared = BackgroundConfig::default();
    let previous = state.documents.background.replace(&cleared).await?;
    discard_replaced_background(&state, &previous, &cleared).await;
    info!("background cleared");
    Ok(Json(cleared))
}

/// POST /api/background/upload - Store a background image and use it.
pub async fn upload_background(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<BackgroundConfig>> {
    let staged = stage_field(&state.gateway, multipart, BACKGROUND_FIELD).await?;
    let size = staged.size();
    let url = state
        .gateway
        .upload_staged(staged, BACKGROUNDS_FOLDER)
        .await?;
    metrics::BYTES_UPLOADED.inc_by(size);

    let background = BackgroundConfig { url };
    let previous = match state.documents.background.replace(&background).await {
        Ok(previous) => previous,
        Err(e) => {
            state.gateway.discard(&background.url).await;
            return Err(e.into());
        }
    };
    discard_replaced_background(&state, &previous, &background).await;

    info!(url = %background.url, size, "background uploaded");
    Ok(Json(background))
}

/// Drop a previously uploaded background image once nothing points at it.
///
/// Only images in the backgrounds folder are removed; a background that
/// reused a gallery photo URL leaves the photo alone.
async fn discard_replaced_background(
    state: &AppState,
    previous: &BackgroundConfig,
    current: &BackgroundConfig,
) {
    if !previous.is_set() || previous.url == current.url {
        return;
    }
    let owned_background = state
        .gateway
        .key_for_url(&previous.url)
        .is_some_and(|key| key.starts_with(&format!("{BACKGROUNDS_FOLDER}/")));
    if owned_background {
        state.gateway.discard(&previous.url).await;
    }
}

/// GET /api/names - Couple names.
pub async fn get_names(State(state): State<AppState>) -> ApiResult<Json<NamesConfig>> {
    Ok(Json(state.documents.names.get().await?))
}

/// POST /api/names - Replace the couple names.
pub async fn set_names(
    State(state): State<AppState>,
    Json(names): Json<NamesConfig>,
) -> ApiResult<Json<NamesConfig>> {
    state.documents.names.set(&names).await?;
    info!(font = %names.font, "names updated");
    Ok(Json(names))
}

/// GET /api/heading - Page heading.
pub async fn get_heading(State(state): State<AppState>) -> ApiResult<Json<HeadingConfig>> {
    Ok(Json(state.documents.heading.get().await?))
}

/// POST /api/heading - Replace the page heading.
pub async fn set_heading(
    State(state): State<AppState>,
    Json(heading): Json<HeadingConfig>,
) -> ApiResult<Json<HeadingConfig>> {
    state.documents.heading.set(&heading).await?;
    info!("heading updated");
    Ok(Json(heading))
}
