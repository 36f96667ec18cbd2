//! Core business logic for Inkpost.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and persistence orchestration live here.
//!
//! # Modules
//!
//! - `identity` - Resolving OAuth identities into durable user records
//! - `session` - Session type and per-read enrichment
//! - `post` - Post persistence with media-aware mutations
//! - `storage` - Object storage adapter for thumbnail uploads

pub mod identity;
pub mod post;
pub mod session;
pub mod storage;
