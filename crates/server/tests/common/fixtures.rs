//! Request builders and payload fixtures.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "saycheese-test-boundary";

/// Base URL the test server hands out for stored media.
pub const PUBLIC_BASE_URL: &str = "http://localhost:5000";

/// Generate deterministic test data based on a seed.
#[allow(dead_code)]
pub fn seeded_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    let mut state = seed;

    for chunk in data.chunks_mut(8) {
        // Simple LCG for deterministic data
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    data
}

/// `Authorization` value for the test admin credential.
#[allow(dead_code)]
pub fn admin_auth() -> String {
    basic_auth("admin", "test-password")
}

#[allow(dead_code)]
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// A multipart/form-data body holding one file part.
#[allow(dead_code)]
pub fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Send a request through the router and collect the whole response.
#[allow(dead_code)]
pub async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

/// Helper to make JSON requests.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let (status, _, body_bytes) = send(router, builder.body(body).unwrap()).await;

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// POST a single-file multipart upload.
#[allow(dead_code)]
pub async fn upload_request(
    router: &axum::Router,
    uri: &str,
    field: &str,
    file_name: &str,
    data: &[u8],
    auth: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri).header(
        "Content-Type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }

    let request = builder
        .body(Body::from(multipart_body(field, file_name, data)))
        .unwrap();
    let (status, _, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

/// Upload a guest photo and return its URL.
#[allow(dead_code)]
pub async fn upload_photo(router: &axum::Router, data: &[u8]) -> String {
    let (status, body) =
        upload_request(router, "/api/upload", "photo", "guest.jpg", data, None).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {body}");
    body["url"].as_str().unwrap().to_string()
}

/// GET a path and return status and raw body.
#[allow(dead_code)]
pub async fn get_raw(router: &axum::Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

/// Router-relative path of a URL handed out by the test server.
#[allow(dead_code)]
pub fn local_path(url: &str) -> &str {
    url.strip_prefix(PUBLIC_BASE_URL).unwrap_or(url)
}
