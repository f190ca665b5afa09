//! Screener domain logic.
//!
//! This crate has no I/O. It holds the rules shared by the database,
//! event, and API layers:
//!
//! - [`recipients`] -- who is a candidate for a comment notification.
//! - [`notification_policy`] -- whether and how each candidate is notified.
//! - [`workflow`] -- the revision-round step/track state machine.
//! - [`links`] -- `[LINK:n]` placeholder encoding for step text.
//! - [`comment`], [`review_link`], [`invitation`] -- input validation and
//!   access checks.

pub mod comment;
pub mod error;
pub mod identity;
pub mod invitation;
pub mod links;
pub mod notification_policy;
pub mod recipients;
pub mod review_link;
pub mod roles;
pub mod types;
pub mod workflow;
