//! Screener event bus and outbound notification delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] -- the domain event envelope, with typed payloads
//!   for the events the notification fan-out consumes.
//! - [`delivery`] -- the [`Mailer`] port and its SMTP implementation.
//! - [`templates`] -- notification email bodies.

pub mod bus;
pub mod delivery;
pub mod templates;

pub use bus::{CommentCreated, EventBus, InvitationAccepted, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use delivery::{Mailer, OutgoingEmail};
