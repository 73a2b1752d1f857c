//! Unified error handling for the client.

use thiserror::Error;

/// Errors that can occur while talking to the Visit Panel backend.
///
/// Variants split into two groups. User-facing errors (`MissingField`,
/// `NotLoggedIn`, `InFlight`, `Rejected`) are alerted by the controllers
/// before being returned. Transport and local failures are only propagated.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (unreachable host, connection reset, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Reading or writing the local session store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The server answered but did not report success. Carries the raw payload.
    #[error("{0}")]
    Rejected(serde_json::Value),

    /// A required input was empty. No request was sent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// No stored session token. No request was sent.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The same non-idempotent action is already outstanding.
    #[error("Request already in progress: {0}")]
    InFlight(String),
}

impl ClientError {
    /// Whether the controllers should show this error to the user.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Rejected(_) | Self::MissingField(_) | Self::NotLoggedIn | Self::InFlight(_)
        )
    }

    /// Text shown in the alert for a user-facing error.
    ///
    /// Rejections echo the raw server payload unchanged.
    #[must_use]
    pub fn alert_text(&self) -> String {
        match self {
            Self::Rejected(payload) => payload.to_string(),
            Self::MissingField(field) => format!("fill {field}"),
            Self::NotLoggedIn => "login".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result alias used across the client.
pub type ClientResult<T> = Result<T, ClientError>;
