//! Tests for the background, names and heading documents over HTTP.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_settings_defaults_are_public() {
    let server = TestServer::new().await;

    let (status, background) =
        json_request(&server.router, "GET", "/api/background", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(background, json!({"url": ""}));

    let (status, names) = json_request(&server.router, "GET", "/api/names", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        names,
        json!({"topName": "", "bottomName": "", "font": "Arial", "showAndSymbol": true})
    );

    let (status, heading) = json_request(&server.router, "GET", "/api/heading", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(heading, json!({"title": "", "subtitle": "", "font": "Cairo"}));
}

#[tokio::test]
async fn test_settings_writes_require_credentials() {
    let server = TestServer::new().await;

    for uri in ["/api/background", "/api/names", "/api/heading"] {
        let (status, _) = json_request(&server.router, "POST", uri, Some(json!({})), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    let (status, _) = upload_request(
        &server.router,
        "/api/background/upload",
        "background",
        "bg.jpg",
        b"bg",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_names_set_and_get() {
    let server = TestServer::new().await;
    let auth = admin_auth();
    let names = json!({
        "topName": "Lina",
        "bottomName": "Omar",
        "font": "Great Vibes",
        "showAndSymbol": false
    });

    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/names",
        Some(names.clone()),
        Some(&auth),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, names);

    let (_, body) = json_request(&server.router, "GET", "/api/names", None, None).await;
    assert_eq!(body, names);
}

#[tokio::test]
async fn test_names_update_replaces_wholesale() {
    let server = TestServer::new().await;
    let auth = admin_auth();

    json_request(
        &server.router,
        "POST",
        "/api/names",
        Some(json!({"topName": "Lina", "bottomName": "Omar", "font": "Cairo"})),
        Some(&auth),
    )
    .await;

    json_request(
        &server.router,
        "POST",
        "/api/names",
        Some(json!({"topName": "Sara"})),
        Some(&auth),
    )
    .await;

    let (_, body) = json_request(&server.router, "GET", "/api/names", None, None).await;
    assert_eq!(body["topName"], "Sara");
    assert_eq!(body["bottomName"], "");
    assert_eq!(body["font"], "Arial");
    assert_eq!(body["showAndSymbol"], true);
}

#[tokio::test]
async fn test_names_unknown_font_rejected() {
    let server = TestServer::new().await;
    let auth = admin_auth();

    let (status, _) = json_request(
        &server.router,
        "POST",
        "/api/names",
        Some(json!({"topName": "Lina", "font": "Comic Sans"})),
        Some(&auth),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = json_request(&server.router, "GET", "/api/names", None, None).await;
    assert_eq!(body["topName"], "");
}

#[tokio::test]
async fn test_heading_set_and_get() {
    let server = TestServer::new().await;
    let auth = admin_auth();

    let (status, _) = json_request(
        &server.router,
        "POST",
        "/api/heading",
        Some(json!({"title": "Say cheese!", "subtitle": "June 2024"})),
        Some(&auth),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = json_request(&server.router, "GET", "/api/heading", None, None).await;
    assert_eq!(
        body,
        json!({"title": "Say cheese!", "subtitle": "June 2024", "font": "Cairo"})
    );
}

#[tokio::test]
async fn test_background_set_and_delete() {
    let server = TestServer::new().await;
    let auth = admin_auth();

    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/background",
        Some(json!({"url": "https://cdn.example/bg.jpg"})),
        Some(&auth),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://cdn.example/bg.jpg");

    let (_, body) = json_request(&server.router, "GET", "/api/background", None, None).await;
    assert_eq!(body["url"], "https://cdn.example/bg.jpg");

    let (status, body) =
        json_request(&server.router, "DELETE", "/api/background", None, Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "");

    let (_, body) = json_request(&server.router, "GET", "/api/background", None, None).await;
    assert_eq!(body["url"], "");
}

#[tokio::test]
async fn test_background_upload() {
    let server = TestServer::new().await;
    let auth = admin_auth();
    let data = seeded_bytes(7, 3000);

    let (status, body) = upload_request(
        &server.router,
        "/api/background/upload",
        "background",
        "bg.png",
        &data,
        Some(&auth),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("http://localhost:5000/uploads/backgrounds/"));

    let (_, current) = json_request(&server.router, "GET", "/api/background", None, None).await;
    assert_eq!(current["url"], url);

    let (status, headers, served) = get_raw(&server.router, local_path(&url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "image/png");
    assert_eq!(served.as_ref(), data.as_slice());

    // Background uploads never show up in the gallery.
    assert!(server.state.documents.gallery.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replaced_background_image_is_removed() {
    let server = TestServer::new().await;
    let auth = admin_auth();

    let (_, first) = upload_request(
        &server.router,
        "/api/background/upload",
        "background",
        "one.jpg",
        b"first",
        Some(&auth),
    )
    .await;
    let first_url = first["url"].as_str().unwrap().to_string();

    let (_, second) = upload_request(
        &server.router,
        "/api/background/upload",
        "background",
        "two.jpg",
        b"second",
        Some(&auth),
    )
    .await;
    let second_url = second["url"].as_str().unwrap().to_string();

    let (status, _, _) = get_raw(&server.router, local_path(&first_url)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    json_request(&server.router, "DELETE", "/api/background", None, Some(&auth)).await;
    let (status, _, _) = get_raw(&server.router, local_path(&second_url)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_background_pointing_at_photo_keeps_photo() {
    let server = TestServer::new().await;
    let auth = admin_auth();
    let photo_url = upload_photo(&server.router, b"gallery-photo").await;

    json_request(
        &server.router,
        "POST",
        "/api/background",
        Some(json!({ "url": photo_url })),
        Some(&auth),
    )
    .await;
    json_request(&server.router, "DELETE", "/api/background", None, Some(&auth)).await;

    let (status, _, body) = get_raw(&server.router, local_path(&photo_url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), b"gallery-photo");
}

#[tokio::test]
async fn test_background_upload_missing_field() {
    let server = TestServer::new().await;

    let (status, _) = upload_request(
        &server.router,
        "/api/background/upload",
        "photo",
        "bg.jpg",
        b"bg",
        Some(&admin_auth()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = json_request(&server.router, "GET", "/api/background", None, None).await;
    assert_eq!(body["url"], "");
}
