//! Foodgram Common Library
//!
//! Shared code for the Foodgram backend:
//! - Database entities and repository pattern
//! - Error types and HTTP mapping
//! - Configuration management
//! - Authentication primitives and request extractors
//! - Media storage boundary
//! - Shopping-list aggregation and report rendering
//! - Metrics registration

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod media;
pub mod metrics;
pub mod shopping;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use media::MediaStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
