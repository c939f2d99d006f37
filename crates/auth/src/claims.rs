use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token expired at {0}")]
    Expired(NaiveDateTime),
}

/// Check a token's advertised expiry against the current (server-local) time.
///
/// The identity service reports `expiresAt` as a zone-less local timestamp.
/// Tokens without an expiry are accepted; the backend remains the authority
/// and answers 401 once it considers the token dead.
pub fn validate_expiry(
    expires_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Result<(), TokenValidationError> {
    match expires_at {
        Some(at) if now >= at => Err(TokenValidationError::Expired(at)),
        _ => Ok(()),
    }
}
