//! Core domain types and shared configuration for SayCheese.
//!
//! This crate defines the data model used across all other crates:
//! - Gallery photo records and their ids
//! - Guest page settings (background, names, heading)
//! - Application configuration

pub mod config;
pub mod error;
pub mod photo;
pub mod settings;

pub use error::{Error, Result};
pub use photo::{PhotoId, PhotoRecord};
pub use settings::{BackgroundConfig, HeadingConfig, NameFont, NamesConfig};

/// Default maximum upload size: 20 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Hard ceiling for the configurable upload size: 256 MiB
pub const MAX_UPLOAD_BYTES_LIMIT: u64 = 256 * 1024 * 1024;

/// URL path prefix under which the server serves stored media.
pub const UPLOADS_ROUTE_PREFIX: &str = "/uploads";

/// Object store folder for guest photos.
pub const PHOTOS_FOLDER: &str = "photos";

/// Object store folder for background images.
pub const BACKGROUNDS_FOLDER: &str = "backgrounds";
