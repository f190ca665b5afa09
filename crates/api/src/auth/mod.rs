//! Authentication primitives.
//!
//! - [`password`] -- Argon2id hashing for account and review-link passwords.
//! - [`jwt`] -- JWT access-token generation and validation.

pub mod jwt;
pub mod password;
