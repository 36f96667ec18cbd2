//! Object storage adapter for uploaded media.
//!
//! Wraps Apache OpenDAL behind a small upload-and-return-URL surface.
//! Uploads are validated (image-only, bounded size) before any bytes
//! leave the process, and transient failures are retried internally.

pub mod config;
pub mod error;
pub mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::StorageService;
