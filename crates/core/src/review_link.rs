//! Public review link tokens and access checks.

use rand::Rng;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Length of a generated review link token.
pub const TOKEN_LENGTH: usize = 32;

/// Minimum length of a review link password.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Generate a fresh random token of [`TOKEN_LENGTH`] alphanumerics.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Cheap shape check before hitting the database.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Validate the expiry requested for a new link.
pub fn validate_expiry(expires_at: Option<Timestamp>, now: Timestamp) -> Result<(), CoreError> {
    match expires_at {
        Some(at) if at <= now => Err(CoreError::Validation(
            "expires_at must be in the future".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Validate the optional password for a new link.
pub fn validate_password(password: Option<&str>) -> Result<(), CoreError> {
    match password {
        Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => Err(CoreError::Validation(format!(
            "Review link password must be at least {MIN_PASSWORD_LENGTH} characters"
        ))),
        _ => Ok(()),
    }
}

/// Reject links that have passed their expiry.
pub fn ensure_not_expired(expires_at: Option<Timestamp>, now: Timestamp) -> Result<(), CoreError> {
    match expires_at {
        Some(at) if at <= now => Err(CoreError::Forbidden("Review link has expired".to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn generated_tokens_are_well_formed_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert!(is_well_formed_token(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_tokens_detected() {
        assert!(!is_well_formed_token("short"));
        assert!(!is_well_formed_token(&"-".repeat(TOKEN_LENGTH)));
    }

    #[test]
    fn expiry_checks() {
        let now = Utc::now();
        assert!(ensure_not_expired(None, now).is_ok());
        assert!(ensure_not_expired(Some(now + Duration::hours(1)), now).is_ok());
        assert_matches!(
            ensure_not_expired(Some(now - Duration::seconds(1)), now),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(validate_expiry(Some(now), now), Err(CoreError::Validation(_)));
    }

    #[test]
    fn short_password_rejected() {
        assert!(validate_password(None).is_ok());
        assert!(validate_password(Some("secret")).is_ok());
        assert_matches!(validate_password(Some("abc")), Err(CoreError::Validation(_)));
    }
}
