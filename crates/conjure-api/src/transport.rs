// HTTP transport settings for the backend client.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::Error;

/// Connection-establishment limit, separate from the whole-request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the underlying `reqwest::Client` is built.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout, body included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: CONNECT_TIMEOUT,
            user_agent: concat!("conjure/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Set the request timeout. The connect timeout never exceeds it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }

    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_timeouts_cap_the_connect_timeout() {
        let cfg = TransportConfig::default().with_timeout(Duration::from_secs(3));
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(3));

        let cfg = TransportConfig::default().with_timeout(Duration::from_secs(60));
        assert_eq!(cfg.connect_timeout, CONNECT_TIMEOUT);
    }

    #[test]
    fn builds_a_client() {
        assert!(TransportConfig::default().build_client().is_ok());
    }
}
