//! Shared types, errors, and configuration for Inkpost.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - Session token signing and validation

pub mod config;
pub mod error;
pub mod token;

pub use config::{AppConfig, StorageSettings};
pub use error::{AppError, AppResult};
pub use token::{SessionClaims, SessionTokenService, TokenConfig, TokenError};
