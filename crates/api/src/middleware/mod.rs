//! Request extractors for authentication.
//!
//! - [`auth::AuthUser`] -- requires a valid JWT Bearer token.
//! - [`auth::OptionalAuthUser`] -- accepts anonymous requests (public review
//!   links) but still rejects a malformed or expired token.

pub mod auth;
