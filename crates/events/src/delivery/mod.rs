//! Outbound notification delivery.
//!
//! The [`Mailer`] trait is the port the notification fan-out sends through;
//! [`email::EmailDelivery`] is the SMTP implementation. Tests substitute an
//! in-memory recorder.

use async_trait::async_trait;

pub mod email;

use email::EmailError;

/// A fully rendered email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Sends rendered emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}
