//! CLI configuration: a thin wrapper around `conjure_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--api-url, --timeout, etc.).

use std::sync::Arc;
use std::time::Duration;

use conjure_api::TokenStore;
use conjure_core::DashboardConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use conjure_config::{
    Config, Profile, TokenStorage, config_path, load_config, save_config, token_path,
};

/// Everything a backend-bound command needs.
pub struct Resolved {
    pub profile_name: String,
    pub dashboard: DashboardConfig,
    pub tokens: Arc<dyn TokenStore>,
}

/// Resolve the active profile plus flag overrides.
///
/// Flag values beat environment values, which beat the profile.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config()?;
    let (profile_name, profile) = cfg.active_profile(global.profile.as_deref())?;

    let mut dashboard = conjure_config::profile_to_dashboard_config(&cfg, &profile)?;
    if let Some(ref raw) = global.api_url {
        dashboard.api_url = raw.parse().map_err(|e| CliError::Validation {
            field: "api-url".into(),
            reason: format!("invalid URL '{raw}': {e}"),
        })?;
    }
    if let Some(secs) = global.timeout {
        dashboard.timeout = Duration::from_secs(secs);
    }

    let tokens = conjure_config::token_store(&profile, &profile_name)?;
    tracing::debug!(
        profile = %profile_name,
        api_url = %dashboard.api_url,
        token_store = %profile.token_store,
        "configuration resolved"
    );

    Ok(Resolved {
        profile_name,
        dashboard,
        tokens,
    })
}
