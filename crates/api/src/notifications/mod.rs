//! Notification fan-out.
//!
//! The [`NotificationRouter`] consumes the event bus and turns comment and
//! invitation events into activity rows and emails.

pub mod router;

pub use router::{DispatchSummary, NotificationRouter};
