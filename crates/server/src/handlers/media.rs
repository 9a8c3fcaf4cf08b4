//! Serving stored images.

use crate::error::{ApiError, ApiResult};
use crate::gateway::content_type_for_key;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use saycheese_core::{BACKGROUNDS_FOLDER, PHOTOS_FOLDER};
use saycheese_storage::ObjectMeta;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Object keys are unique per upload, so responses never change.
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Folders holding images meant for the guest page.
const PUBLIC_FOLDERS: [&str; 2] = [PHOTOS_FOLDER, BACKGROUNDS_FOLDER];

/// Whether `key` names an uploaded image rather than internal state such as
/// documents kept in the same store.
pub fn is_public_key(key: &str) -> bool {
    PUBLIC_FOLDERS.iter().any(|folder| {
        key.strip_prefix(folder)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|name| !name.is_empty())
    })
}

/// GET /uploads/{*key} - Stream a stored image.
pub async fn get_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    if !is_public_key(&key) {
        return Err(ApiError::NotFound(format!("no media at {key}")));
    }

    let meta = state.storage.head(&key).await?;
    let stream = state.storage.get_stream(&key).await?;

    let mut response = (
        [
            (CONTENT_TYPE, content_type(&key, &meta)),
            (CONTENT_LENGTH, meta.size.to_string()),
            (CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response();

    if let Some(value) = meta.last_modified.and_then(http_date) {
        response.headers_mut().insert(LAST_MODIFIED, value);
    }
    Ok(response)
}

/// Prefer the extension; fall back to what the backend recorded.
fn content_type(key: &str, meta: &ObjectMeta) -> String {
    match content_type_for_key(key) {
        FALLBACK_CONTENT_TYPE => meta
            .content_type
            .clone()
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string()),
        known => known.to_string(),
    }
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn http_date(at: OffsetDateTime) -> Option<HeaderValue> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    let formatted = at.to_offset(UtcOffset::UTC).format(format).ok()?;
    HeaderValue::from_str(&formatted).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_public_keys() {
        assert!(is_public_key("photos/1717243200123-ab12cd34.jpg"));
        assert!(is_public_key("backgrounds/1717243200123-ab12cd34.png"));

        assert!(!is_public_key("documents/gallery.json"));
        assert!(!is_public_key("gallery.json"));
        assert!(!is_public_key("photos/"));
        assert!(!is_public_key("photosx/a.jpg"));
        assert!(!is_public_key(".saycheese-health-check"));
    }

    #[test]
    fn test_content_type_prefers_extension() {
        let meta = ObjectMeta {
            size: 1,
            last_modified: None,
            content_type: Some("binary/octet-stream".to_string()),
        };
        assert_eq!(content_type("photos/a.jpg", &meta), "image/jpeg");
        assert_eq!(content_type("photos/a", &meta), "binary/octet-stream");

        let bare = ObjectMeta {
            content_type: None,
            ..meta
        };
        assert_eq!(content_type("photos/a", &bare), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_http_date_format() {
        let value = http_date(datetime!(1994-11-06 08:49:37 UTC)).unwrap();
        assert_eq!(value, "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
