//! Request middleware.

pub mod session;

pub use session::{CurrentUser, SessionUser, session_middleware};
