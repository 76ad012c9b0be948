// Session endpoints
//
// Login stores the issued bearer token; logout and failed verification
// destroy it. Everything else reads the token through the client.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::client::{ApiClient, Auth};
use crate::error::Error;
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, ResetPasswordRequest, User};

impl ApiClient {
    /// Authenticate and persist the issued token.
    ///
    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse, Error> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let resp: AuthResponse = self
            .post("/auth/login", &body, Auth::None)
            .await
            .inspect_err(|e| warn!(error = %e, "login failed"))?;

        if !resp.access_token.is_empty() {
            self.tokens()
                .save(&SecretString::from(resp.access_token.clone()))?;
        }
        info!(email, "logged in");
        Ok(resp)
    }

    /// Create an account. Does not log in.
    ///
    /// `POST /auth/register`
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, Error> {
        let body = RegisterRequest {
            email,
            password: password.expose_secret(),
            username,
        };
        self.post("/auth/register", &body, Auth::None)
            .await
            .inspect_err(|e| warn!(error = %e, "registration failed"))
    }

    /// End the session server-side, then forget the local token.
    ///
    /// The token is only removed once the backend accepts the logout.
    ///
    /// `POST /auth/logout`
    pub async fn logout(&self) -> Result<(), Error> {
        self.post_no_response("/auth/logout", &serde_json::json!({}), Auth::Required)
            .await
            .inspect_err(|e| warn!(error = %e, "logout failed"))?;
        self.tokens().clear()?;
        info!("logged out");
        Ok(())
    }

    /// The user the stored token belongs to.
    ///
    /// `GET /auth/me`
    pub async fn me(&self) -> Result<User, Error> {
        self.get("/auth/me", Auth::Required)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to get user info"))
    }

    /// `POST /auth/reset-password`
    pub async fn request_password_reset(&self, email: &str) -> Result<(), Error> {
        self.post_no_response(
            "/auth/reset-password",
            &ResetPasswordRequest { email },
            Auth::None,
        )
        .await
        .inspect_err(|e| warn!(error = %e, "password reset request failed"))
    }

    /// Check the stored token with the backend. Never fails.
    ///
    /// - no stored token: `false`, no request is made
    /// - backend answers `200 OK`: `true`; any other success status is `false`
    /// - backend rejects the token: `false`, and the token is removed
    /// - no response at all: `false`, the token is kept for a later retry
    ///
    /// `POST /auth/verify-token`
    pub async fn verify_token(&self) -> bool {
        if !self.has_token() {
            debug!("no stored token to verify");
            return false;
        }

        match self
            .post_for_status("/auth/verify-token", &serde_json::json!({}), Auth::Required)
            .await
        {
            Ok(StatusCode::OK) => true,
            Ok(status) => {
                debug!(status = status.as_u16(), "verification answered without OK");
                false
            }
            Err(Error::Api { status, .. }) => {
                debug!(status, "token rejected, clearing session");
                if let Err(e) = self.tokens().clear() {
                    warn!(error = %e, "failed to clear rejected token");
                }
                false
            }
            Err(e) => {
                debug!(error = %e, "token verification did not complete");
                false
            }
        }
    }
}
