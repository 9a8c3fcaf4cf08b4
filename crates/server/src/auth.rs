//! Admin access gate.
//!
//! A single username/password pair from configuration protects every admin
//! route via HTTP Basic authentication.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use saycheese_core::config::AdminConfig;
use sha2::{Digest, Sha256};

type Digest32 = [u8; 32];

fn digest(value: &str) -> Digest32 {
    Sha256::digest(value.as_bytes()).into()
}

/// Compare two digests without short-circuiting on the first differing byte.
fn digests_match(a: &Digest32, b: &Digest32) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The configured admin credential, kept only as SHA-256 digests.
pub struct AdminCredentials {
    username: Digest32,
    password: Digest32,
}

impl AdminCredentials {
    pub fn from_config(config: &AdminConfig) -> Self {
        Self {
            username: digest(&config.username),
            password: digest(&config.password),
        }
    }

    /// Check a username/password pair. Both halves are always compared.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = digests_match(&self.username, &digest(username));
        let pass_ok = digests_match(&self.password, &digest(password));
        user_ok & pass_ok
    }
}

/// Credentials decoded from an `Authorization: Basic` header.
#[derive(Debug, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parse the `Authorization` header. The scheme is case-insensitive.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("malformed authorization header".to_string()))?;

        let encoded = value
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("basic"))
            .map(|(_, rest)| rest.trim())
            .ok_or_else(|| ApiError::Unauthorized("basic authentication required".to_string()))?;

        let decoded = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| ApiError::Unauthorized("malformed basic credentials".to_string()))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| ApiError::Unauthorized("malformed basic credentials".to_string()))?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Middleware guarding admin routes.
pub async fn admin_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = BasicCredentials::from_headers(req.headers())?;
    if !state
        .admin
        .verify(&credentials.username, &credentials.password)
    {
        tracing::warn!("rejected admin request with invalid credentials");
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    Ok(next.run(req).await)
}
