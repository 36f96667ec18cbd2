//! Resolving OAuth-verified identities into durable user records.

pub mod error;
pub mod resolver;
pub mod types;

pub use error::IdentityError;
pub use resolver::{IdentityResolver, UserStore};
pub use types::{NewUser, UserRecord};
