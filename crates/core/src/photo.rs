//! Gallery photo records and their identifiers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Maximum accepted length for a photo id.
const MAX_ID_LEN: usize = 64;

/// Identifier of a gallery photo.
///
/// Ids are the decimal Unix time in milliseconds at which the photo was
/// recorded. They sort in upload order and stay unique within a ledger
/// because [`PhotoId::next`] never hands out a value at or below the last one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(String);

impl PhotoId {
    /// Create an id from the millisecond timestamp of `at`.
    pub fn from_timestamp(at: OffsetDateTime) -> Self {
        Self(unix_millis(at).to_string())
    }

    /// Allocate the id for a photo recorded at `now`, given the newest id
    /// already present in the ledger.
    ///
    /// Two uploads landing in the same millisecond get consecutive ids.
    pub fn next(now: OffsetDateTime, last: Option<&PhotoId>) -> Self {
        let now_ms = unix_millis(now);
        match last.and_then(PhotoId::as_millis) {
            Some(last_ms) if last_ms >= now_ms => Self((last_ms + 1).to_string()),
            _ => Self(now_ms.to_string()),
        }
    }

    /// Parse an id received from a client.
    ///
    /// Ids are opaque to clients; only obviously bogus values are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidPhotoId("id is empty".to_string()));
        }
        if s.len() > MAX_ID_LEN {
            return Err(Error::InvalidPhotoId(format!(
                "id longer than {MAX_ID_LEN} characters"
            )));
        }
        if !s.chars().all(|c| c.is_ascii_graphic()) {
            return Err(Error::InvalidPhotoId(format!(
                "id contains non-printable characters: {s:?}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The millisecond timestamp encoded in this id, if it is numeric.
    pub fn as_millis(&self) -> Option<i128> {
        self.0.parse().ok()
    }

    /// Borrow the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn unix_millis(at: OffsetDateTime) -> i128 {
    at.unix_timestamp_nanos() / 1_000_000
}

/// A single uploaded photo as stored in the gallery ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: PhotoId,
    /// Permanent URL returned by the storage gateway.
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
}

impl PhotoRecord {
    pub fn new(id: PhotoId, url: impl Into<String>, uploaded_at: OffsetDateTime) -> Self {
        Self {
            id,
            url: url.into(),
            uploaded_at,
        }
    }
}
