use std::collections::BTreeMap;
use thiserror::Error;

/// Structured discriminator decoded from the backend error body
///
/// The backend sends a machine-readable `code` next to the human-readable
/// `message`; callers switch on the kind, never on the prose. Responses from
/// older deployments carry only the message, so a narrow substring fallback
/// is kept for the verification case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmailNotVerified,
    InvalidCredentials,
    InvalidToken,
    Other,
}

pub(crate) fn classify(code: Option<&str>, message: &str) -> ErrorKind {
    match code {
        Some("EMAIL_NOT_VERIFIED") => ErrorKind::EmailNotVerified,
        Some("INVALID_CREDENTIALS") => ErrorKind::InvalidCredentials,
        Some("INVALID_TOKEN" | "TOKEN_EXPIRED") => ErrorKind::InvalidToken,
        Some(_) => ErrorKind::Other,
        None if message.to_lowercase().contains("verify your email") => {
            ErrorKind::EmailNotVerified
        }
        None => ErrorKind::Other,
    }
}

/// Session client errors
#[derive(Debug, Error)]
pub enum Error {
    /// The request never completed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response with a server-supplied message
    #[error("authentication failed ({status}): {message}")]
    Auth {
        kind: ErrorKind,
        status: u16,
        message: String,
    },

    /// Refresh failed; the session has been forced back to anonymous
    #[error("session expired")]
    SessionExpired,

    /// The operation requires an authenticated session
    #[error("not authenticated")]
    NotAuthenticated,

    /// 4xx with field-level messages echoed from the backend
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    /// The configured base URL cannot be turned into an endpoint
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

impl Error {
    /// True for a 401 on an authenticated request, the one case that
    /// triggers a refresh-and-retry
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth { status: 401, .. })
    }

    #[must_use]
    pub fn is_email_not_verified(&self) -> bool {
        matches!(
            self,
            Self::Auth {
                kind: ErrorKind::EmailNotVerified,
                ..
            }
        )
    }
}
