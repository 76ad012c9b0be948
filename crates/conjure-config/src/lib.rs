//! Shared configuration for Conjure tools.
//!
//! TOML profiles merged with `CONJURE_*` environment overrides, token
//! storage selection (file or system keyring), and translation to
//! `conjure_core::DashboardConfig`. The CLI adds flag-aware wrappers on top.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use conjure_api::{FileTokenStore, TokenStore};
use conjure_core::{DEFAULT_API_URL, DashboardConfig};

/// Keyring service name; entries are keyed by profile.
const KEYRING_SERVICE: &str = "conjure";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
///
/// `api_url` and `site_url` sit at the top level so `CONJURE_API_URL` and
/// `CONJURE_SITE_URL` override whichever profile is active.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// API base URL override for every profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Public site URL override for every profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            api_url: None,
            site_url: None,
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Where a profile keeps its session token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// A file under the platform data directory.
    #[default]
    File,
    /// The system keyring.
    Keyring,
}

impl fmt::Display for TokenStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Keyring => "keyring",
        })
    }
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "http://localhost:8000").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Public site URL, shown in `config show`.
    pub site_url: Option<String>,

    /// Override the request timeout (seconds).
    pub timeout: Option<u64>,

    /// Trigger list polling period in milliseconds. `0` turns polling off.
    pub triggers_poll_ms: Option<u64>,

    /// Revalidate effects when the app regains focus.
    pub effects_revalidate_on_focus: Option<bool>,

    /// Effects per page in list views.
    pub page_size: Option<usize>,

    #[serde(default)]
    pub token_store: TokenStorage,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            site_url: None,
            timeout: None,
            triggers_poll_ms: None,
            effects_revalidate_on_focus: None,
            page_size: None,
            token_store: TokenStorage::default(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "conjure", "conjure")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("conjure");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the file token store keeps a profile's session token.
pub fn token_path(profile_name: &str) -> PathBuf {
    let base = project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf());
    base.join("tokens").join(format!("{profile_name}.token"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, then apply `CONJURE_*` environment overrides.
///
/// Nested keys use a double underscore: `CONJURE_DEFAULTS__TIMEOUT=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CONJURE_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        warn!(error = %e, "config unreadable, using defaults");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

impl Config {
    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Pick the profile to run with.
    ///
    /// An explicitly requested profile must exist. Without one, the default
    /// profile is used if configured, otherwise built-in defaults so a fresh
    /// install talks to a local backend.
    pub fn active_profile(
        &self,
        requested: Option<&str>,
    ) -> Result<(String, Profile), ConfigError> {
        if let Some(name) = requested {
            return self
                .profiles
                .get(name)
                .map(|p| (name.to_owned(), p.clone()))
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_owned(),
                    available: self.available(),
                });
        }

        let name = self
            .default_profile
            .clone()
            .unwrap_or_else(|| "default".into());
        let profile = self.profiles.get(&name).cloned().unwrap_or_default();
        Ok((name, profile))
    }

    /// The API URL after environment overrides.
    pub fn api_url(&self, profile: &Profile) -> Result<Url, ConfigError> {
        let raw = self.api_url.as_deref().unwrap_or(&profile.api_url);
        parse_url("api_url", raw)
    }

    /// The public site URL after environment overrides, if any.
    pub fn site_url(&self, profile: &Profile) -> Result<Option<Url>, ConfigError> {
        self.site_url
            .as_deref()
            .or(profile.site_url.as_deref())
            .map(|raw| parse_url("site_url", raw))
            .transpose()
    }

    fn available(&self) -> String {
        let names = self.profile_names();
        if names.is_empty() {
            "none".into()
        } else {
            names.join(", ")
        }
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `DashboardConfig` from a profile, no CLI flag overrides.
pub fn profile_to_dashboard_config(
    cfg: &Config,
    profile: &Profile,
) -> Result<DashboardConfig, ConfigError> {
    let mut dashboard = DashboardConfig::new(cfg.api_url(profile)?);
    dashboard.timeout = Duration::from_secs(profile.timeout.unwrap_or(cfg.defaults.timeout));

    if let Some(ms) = profile.triggers_poll_ms {
        let every = (ms > 0).then(|| Duration::from_millis(ms));
        dashboard.triggers = dashboard.triggers.with_refresh_interval(every);
    }
    if let Some(on_focus) = profile.effects_revalidate_on_focus {
        dashboard.effects = dashboard.effects.with_focus(on_focus);
    }
    if let Some(size) = profile.page_size {
        if size == 0 {
            return Err(ConfigError::Validation {
                field: "page_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        dashboard.page_size = size;
    }
    Ok(dashboard)
}

// ── Token storage ───────────────────────────────────────────────────

/// Session token kept in the system keyring, one entry per profile.
pub struct KeyringTokenStore {
    entry: keyring::Entry,
    profile: String,
}

impl KeyringTokenStore {
    pub fn new(profile: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            entry: keyring::Entry::new(KEYRING_SERVICE, &format!("{profile}/token"))?,
            profile: profile.to_owned(),
        })
    }
}

impl fmt::Debug for KeyringTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringTokenStore")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Option<SecretString> {
        match self.entry.get_password() {
            Ok(token) if !token.is_empty() => Some(SecretString::from(token)),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(profile = %self.profile, error = %e, "failed to read token from keyring");
                None
            }
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), conjure_api::Error> {
        self.entry
            .set_password(token.expose_secret())
            .map_err(|e| conjure_api::Error::TokenStorage(e.to_string()))
    }

    fn clear(&self) -> Result<(), conjure_api::Error> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(conjure_api::Error::TokenStorage(e.to_string())),
        }
    }
}

/// Open the token store a profile asks for.
pub fn token_store(
    profile: &Profile,
    profile_name: &str,
) -> Result<Arc<dyn TokenStore>, ConfigError> {
    Ok(match profile.token_store {
        TokenStorage::File => Arc::new(FileTokenStore::new(token_path(profile_name))),
        TokenStorage::Keyring => Arc::new(KeyringTokenStore::new(profile_name)?),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use conjure_core::RevalidationPolicy;
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
default_profile = "stage"

[defaults]
timeout = 10

[profiles.stage]
api_url = "https://stage.example.com"
site_url = "https://stage.example.com/app"
triggers_poll_ms = 2000
token_store = "keyring"
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.active_profile(None).unwrap();
        assert_eq!(name, "stage");
        assert_eq!(profile.api_url, "https://stage.example.com");
        assert_eq!(profile.token_store, TokenStorage::Keyring);
        assert_eq!(cfg.defaults.timeout, 10);
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_url: "http://10.0.0.5:8000".into(),
                page_size: Some(6),
                ..Profile::default()
            },
        );
        save_config_to(&path, &cfg).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].api_url, "http://10.0.0.5:8000");
        assert_eq!(loaded.profiles["default"].page_size, Some(6));
    }

    #[test]
    fn unknown_requested_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), Profile::default());
        cfg.profiles.insert("work".into(), Profile::default());

        match cfg.active_profile(Some("lab")).unwrap_err() {
            ConfigError::ProfileNotFound { name, available } => {
                assert_eq!(name, "lab");
                assert_eq!(available, "home, work");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absent_default_profile_falls_back_to_local_backend() {
        let cfg = Config::default();
        let (_, profile) = cfg.active_profile(None).unwrap();
        assert_eq!(cfg.api_url(&profile).unwrap().as_str(), "http://localhost:8000/");
    }

    #[test]
    fn top_level_urls_override_profile() {
        let cfg = Config {
            api_url: Some("https://api.example.com".into()),
            site_url: Some("https://example.com".into()),
            ..Config::default()
        };
        let profile = Profile {
            site_url: Some("https://ignored.example.com".into()),
            ..Profile::default()
        };
        assert_eq!(cfg.api_url(&profile).unwrap().host_str(), Some("api.example.com"));
        assert_eq!(
            cfg.site_url(&profile).unwrap().unwrap().host_str(),
            Some("example.com")
        );
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let profile = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_dashboard_config(&Config::default(), &profile).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn dashboard_config_applies_profile_policy() {
        let cfg = Config::default();
        let profile = Profile {
            timeout: Some(5),
            triggers_poll_ms: Some(1500),
            effects_revalidate_on_focus: Some(true),
            page_size: Some(20),
            ..Profile::default()
        };

        let dashboard = profile_to_dashboard_config(&cfg, &profile).unwrap();
        assert_eq!(dashboard.timeout, Duration::from_secs(5));
        assert_eq!(
            dashboard.triggers.poll_period(),
            Some(Duration::from_millis(1500))
        );
        assert!(dashboard.effects.on_focus);
        assert_eq!(dashboard.page_size, 20);
    }

    #[test]
    fn zero_poll_period_disables_polling() {
        let profile = Profile {
            triggers_poll_ms: Some(0),
            ..Profile::default()
        };
        let dashboard = profile_to_dashboard_config(&Config::default(), &profile).unwrap();
        assert_eq!(dashboard.triggers.poll_period(), None);
    }

    #[test]
    fn defaults_keep_built_in_policies() {
        let dashboard =
            profile_to_dashboard_config(&Config::default(), &Profile::default()).unwrap();
        assert_eq!(dashboard.effects, RevalidationPolicy::on_reconnect_only());
        assert_eq!(dashboard.timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let profile = Profile {
            page_size: Some(0),
            ..Profile::default()
        };
        assert!(profile_to_dashboard_config(&Config::default(), &profile).is_err());
    }

    #[test]
    fn token_path_is_per_profile() {
        let a = token_path("home");
        let b = token_path("work");
        assert_ne!(a, b);
        assert!(a.ends_with("tokens/home.token"));
    }
}
