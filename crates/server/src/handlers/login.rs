//! Credential check for the admin page.

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
}

/// POST /api/login - Check the admin credential.
///
/// Only answers whether the pair is valid; admin routes still expect Basic
/// authentication on every request.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> (StatusCode, Json<LoginResponse>) {
    if state.admin.verify(&request.username, &request.password) {
        (StatusCode::OK, Json(LoginResponse { success: true }))
    } else {
        tracing::info!("admin login rejected");
        (StatusCode::UNAUTHORIZED, Json(LoginResponse { success: false }))
    }
}
