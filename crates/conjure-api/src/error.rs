use serde::Serialize;
use thiserror::Error;

/// Message used whenever the backend gives us nothing better.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Top-level error type for the `conjure-api` crate.
///
/// Covers every failure mode of the REST surface: transport, non-2xx
/// responses, undecodable bodies, and local token storage.
/// `conjure-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Building the HTTP client failed (bad TLS backend, invalid user agent).
    #[error("HTTP client setup failed: {0}")]
    ClientBuild(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response. `message` comes from the body when present.
    #[error("API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Session ─────────────────────────────────────────────────────
    /// An authenticated endpoint was called with no stored token.
    #[error("Not logged in")]
    MissingToken,

    /// Reading or writing the token store failed.
    #[error("Token storage error: {0}")]
    TokenStorage(String),
}

/// The uniform `{ message, status }` shape every failure collapses to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl Error {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the backend answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the backend rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403)) || matches!(self, Self::MissingToken)
    }

    /// Returns `true` if no response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(e) if e.status().is_none())
    }

    /// Collapse into the uniform error shape.
    ///
    /// Responses keep their status and body message; anything without a
    /// response becomes the generic message with status 500.
    pub fn api_error(&self) -> ApiError {
        match self {
            Self::Api { message, status } => ApiError {
                message: message.clone(),
                status: *status,
            },
            Self::MissingToken => ApiError {
                message: self.to_string(),
                status: 401,
            },
            _ => ApiError {
                message: GENERIC_ERROR_MESSAGE.into(),
                status: 500,
            },
        }
    }
}
