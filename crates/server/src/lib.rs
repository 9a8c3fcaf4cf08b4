//! HTTP API server for SayCheese.
//!
//! This crate provides:
//! - Guest photo upload and the public settings reads
//! - Admin gallery management and settings writes behind Basic auth
//! - Zip export of the whole gallery
//! - Serving of stored images

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod export;
pub mod gateway;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod trace;

pub use error::ApiError;
pub use gateway::StorageGateway;
pub use routes::create_router;
pub use state::AppState;
pub use trace::TraceId;
