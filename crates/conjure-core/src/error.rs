// ── Core error types ──
//
// User-facing errors from conjure-core. Every failure from the API layer is
// translated here, and every variant can still be collapsed to the uniform
// `{ message, status }` shape through `api_error()`.

use conjure_api::{ApiError, error::GENERIC_ERROR_MESSAGE};
use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so a single failed fetch can be shared by every subscriber of
/// the same query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Not logged in")]
    AuthenticationRequired,

    // ── API errors ───────────────────────────────────────────────────
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Api { message: String, status: u16 },

    #[error("Unexpected response from the API: {message}")]
    InvalidResponse { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Token storage error: {0}")]
    TokenStorage(String),

    #[error("Dashboard has been shut down")]
    Cancelled,
}

impl CoreError {
    /// HTTP status, when the failure came from a backend response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::AuthenticationRequired => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Collapse into the uniform error shape. Anything without a backend
    /// status reads as a generic 500.
    pub fn api_error(&self) -> ApiError {
        match self {
            Self::Api { message, status } => ApiError {
                message: message.clone(),
                status: *status,
            },
            Self::NotFound { .. } | Self::AuthenticationRequired => ApiError {
                message: self.to_string(),
                status: self.status().unwrap_or(500),
            },
            _ => ApiError {
                message: GENERIC_ERROR_MESSAGE.to_owned(),
                status: 500,
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<conjure_api::Error> for CoreError {
    fn from(err: conjure_api::Error) -> Self {
        match err {
            conjure_api::Error::Api { message, status } => Self::Api { message, status },
            conjure_api::Error::Transport(ref e) => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            conjure_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            conjure_api::Error::ClientBuild(message) => Self::Config { message },
            conjure_api::Error::Deserialization { message, body: _ } => {
                Self::InvalidResponse { message }
            }
            conjure_api::Error::MissingToken => Self::AuthenticationRequired,
            conjure_api::Error::TokenStorage(msg) => Self::TokenStorage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_backend_message_and_status() {
        let err = CoreError::from(conjure_api::Error::Api {
            message: "Effect not found".into(),
            status: 404,
        });
        assert!(err.is_not_found());
        assert_eq!(
            err.api_error(),
            ApiError {
                message: "Effect not found".into(),
                status: 404
            }
        );
    }

    #[test]
    fn local_failures_collapse_to_generic_500() {
        let err = CoreError::InvalidResponse {
            message: "expected array".into(),
        };
        let shape = err.api_error();
        assert_eq!(shape.status, 500);
        assert_eq!(shape.message, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn missing_token_reads_as_unauthorized() {
        let err = CoreError::from(conjure_api::Error::MissingToken);
        assert!(err.is_unauthorized());
        assert_eq!(err.api_error().status, 401);
    }
}
