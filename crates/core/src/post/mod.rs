//! Post persistence with media-aware mutations.

pub mod error;
pub mod service;
pub mod types;

pub use error::PostError;
pub use service::{PostRepository, PostService};
pub use types::{ImageUpload, NewPostRecord, Post, PostInput, PostStatus, PostUpdateRecord};
