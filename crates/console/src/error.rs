//! Client-side failure taxonomy.

use thiserror::Error;

/// Failure of a call to the identity or management services.
///
/// Expected failures are values, never panics: the auth session converts all
/// of them into `false` or an implicit logout before they reach a view.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No response, or the connection broke mid-response.
    #[error("network error: {0}")]
    Network(String),

    /// An authenticated call was answered with 401; the session was discarded.
    #[error("session expired")]
    SessionExpired,

    /// Login was rejected (bad credentials, disabled account).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The identity service answered but reported `success: false`.
    #[error("identity service rejected the request: {0}")]
    Rejected(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ClientError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
