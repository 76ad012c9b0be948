// ── Runtime dashboard configuration ──
//
// These types describe *how* to talk to the backend and how eagerly to
// revalidate. They never touch disk: the CLI builds a `DashboardConfig`
// from `conjure-config` and hands it in.

use std::time::Duration;

use url::Url;

use crate::query::{RevalidationPolicy, TRIGGERS_POLL_INTERVAL};
use crate::view::DEFAULT_PAGE_SIZE;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration for one backend connection.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API base URL (e.g., `http://localhost:8000`).
    pub api_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Revalidation for the effects list and per-effect queries.
    pub effects: RevalidationPolicy,
    /// Revalidation for the triggers list and per-trigger queries.
    pub triggers: RevalidationPolicy,
    /// Effects per page in list views.
    pub page_size: usize,
}

impl DashboardConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            ..Self::default()
        }
    }

    /// Turn off every background revalidation. One-shot CLI commands
    /// use this so nothing keeps running after the answer is printed.
    pub fn without_background_refresh(mut self) -> Self {
        self.effects = RevalidationPolicy::manual();
        self.triggers = RevalidationPolicy::manual();
        self
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: Duration::from_secs(30),
            effects: RevalidationPolicy::on_reconnect_only(),
            triggers: RevalidationPolicy::polling(TRIGGERS_POLL_INTERVAL),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
