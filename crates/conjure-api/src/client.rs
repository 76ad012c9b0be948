// REST API HTTP client
//
// Wraps `reqwest::Client` with base-URL path joining, bearer-token
// attachment, and uniform error mapping. Endpoint modules (effects,
// triggers, auth) are implemented as inherent methods in separate files
// to keep this module focused on transport mechanics.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, GENERIC_ERROR_MESSAGE};
use crate::token::TokenStore;
use crate::transport::TransportConfig;

/// Error body shape. Handlers send `message`; framework-level errors
/// (validation, raised HTTP exceptions) send `detail` instead.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Whether a request carries the stored bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Never attach a token (login, register, password reset).
    None,
    /// Attach the token when one is stored.
    Optional,
    /// Fail with [`Error::MissingToken`] when no token is stored.
    Required,
}

/// HTTP client for the effects/triggers backend.
///
/// Cheap to clone: the underlying `reqwest::Client` and token store are
/// both reference counted.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root (e.g. `http://localhost:8000`); endpoint
    /// paths such as `/api/triggers` are appended to it.
    pub fn new(
        base_url: Url,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, tokens))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The token store consulted for authenticated requests.
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Whether a bearer token is currently stored.
    pub fn has_token(&self) -> bool {
        self.tokens.load().is_some()
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL: `{base}{path}`, tolerating slashes on either side.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn builder(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let builder = self.http.request(method, url);
        match auth {
            Auth::None => Ok(builder),
            Auth::Optional => Ok(match self.tokens.load() {
                Some(token) => {
                    trace!("attaching bearer token");
                    builder.bearer_auth(token.expose_secret())
                }
                None => builder,
            }),
            Auth::Required => {
                let token = self.tokens.load().ok_or(Error::MissingToken)?;
                trace!("attaching bearer token");
                Ok(builder.bearer_auth(token.expose_secret()))
            }
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: Auth,
    ) -> Result<T, Error> {
        let resp = self.builder(Method::GET, path, auth)?.send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        auth: Auth,
    ) -> Result<T, Error> {
        trace!(?params, "query params");
        let resp = self
            .builder(Method::GET, path, auth)?
            .query(params)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
    ) -> Result<T, Error> {
        let resp = self
            .builder(Method::POST, path, auth)?
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// POST with an empty JSON object body, discarding the response body.
    pub(crate) async fn post_no_response<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
    ) -> Result<(), Error> {
        let resp = self
            .builder(Method::POST, path, auth)?
            .json(body)
            .send()
            .await?;
        self.handle_empty(resp).await
    }

    /// POST and report the success status, for endpoints that answer
    /// with nothing but a status code.
    pub(crate) async fn post_for_status<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
    ) -> Result<StatusCode, Error> {
        let resp = self
            .builder(Method::POST, path, auth)?
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            Ok(status)
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
    ) -> Result<T, Error> {
        let resp = self
            .builder(Method::PUT, path, auth)?
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str, auth: Auth) -> Result<(), Error> {
        let resp = self.builder(Method::DELETE, path, auth)?.send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        Error::Api {
            message: error_message(&raw),
            status: status.as_u16(),
        }
    }
}

/// Pull a human message out of an error body.
///
/// `message` wins, then a string `detail`; anything else (empty body,
/// HTML error page, structured validation detail) gets the generic text.
fn error_message(raw: &str) -> String {
    let Ok(body) = serde_json::from_str::<ErrorBody>(raw) else {
        return GENERIC_ERROR_MESSAGE.into();
    };
    if let Some(message) = body.message.filter(|m| !m.is_empty()) {
        return message;
    }
    match body.detail {
        Some(serde_json::Value::String(detail)) if !detail.is_empty() => detail,
        _ => GENERIC_ERROR_MESSAGE.into(),
    }
}
