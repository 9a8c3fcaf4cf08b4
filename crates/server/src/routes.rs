//! Route configuration.

use crate::auth::admin_gate;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::trace::trace_id_middleware;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let admin = middleware::from_fn_with_state(state.clone(), admin_gate);
    let upload_limit = DefaultBodyLimit::max(
        usize::try_from(state.config.media.max_upload_bytes + MULTIPART_OVERHEAD_BYTES)
            .unwrap_or(usize::MAX),
    );

    let api_routes = Router::new()
        // Guest page
        .route(
            "/api/upload",
            post(handlers::upload_photo).layer(upload_limit),
        )
        .route("/api/login", post(handlers::login))
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/api/health", get(handlers::health_check))
        // Gallery management (admin only)
        .route(
            "/api/photos",
            get(handlers::list_photos)
                .delete(handlers::clear_photos)
                .route_layer(admin.clone()),
        )
        .route(
            "/api/photos/download-zip",
            get(handlers::download_zip).route_layer(admin.clone()),
        )
        .route(
            "/api/photos/{id}",
            delete(handlers::delete_photo).route_layer(admin.clone()),
        )
        // Settings: reads are public, writes are admin only
        .route(
            "/api/background",
            get(handlers::get_background).merge(
                post(handlers::set_background)
                    .delete(handlers::delete_background)
                    .route_layer(admin.clone()),
            ),
        )
        .route(
            "/api/background/upload",
            post(handlers::upload_background)
                .layer(upload_limit)
                .route_layer(admin.clone()),
        )
        .route(
            "/api/names",
            get(handlers::get_names)
                .merge(post(handlers::set_names).route_layer(admin.clone())),
        )
        .route(
            "/api/heading",
            get(handlers::get_heading).merge(post(handlers::set_heading).route_layer(admin)),
        );

    let media_routes = Router::new().route("/uploads/{*key}", get(handlers::get_media));

    let mut router = Router::new().merge(api_routes).merge(media_routes);

    // SECURITY: When enabled, this endpoint should be network-restricted
    // to the Prometheus scraper. See crate::metrics.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Middleware layers are applied in reverse order (outermost first).
    // Order of execution: TraceLayer -> CORS -> trace id span -> handler
    let mut router = router.layer(middleware::from_fn(trace_id_middleware));
    if state.config.server.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
