//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use serde::Serialize;

use conjure_core::DEFAULT_API_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile, TokenStorage};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// The active profile as it will actually be used.
#[derive(Serialize)]
struct ResolvedView {
    profile: String,
    api_url: String,
    site_url: Option<String>,
    token_store: String,
    token_path: Option<String>,
}

fn resolved_view(cfg: &Config, global: &GlobalOpts) -> Result<ResolvedView, CliError> {
    let (name, profile) = cfg.active_profile(global.profile.as_deref())?;
    let api_url = match global.api_url {
        Some(ref url) => url.clone(),
        None => cfg.api_url(&profile)?.to_string(),
    };
    Ok(ResolvedView {
        api_url,
        site_url: cfg.site_url(&profile)?.map(|u| u.to_string()),
        token_store: profile.token_store.to_string(),
        token_path: (profile.token_store == TokenStorage::File)
            .then(|| config::token_path(&name).display().to_string()),
        profile: name,
    })
}

fn format_config(cfg: &Config, resolved: &ResolvedView) -> Result<String, CliError> {
    let mut out = toml::to_string_pretty(cfg).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: e.to_string(),
    })?;
    let _ = writeln!(out, "\n# resolved");
    let _ = writeln!(out, "# profile     = {}", resolved.profile);
    let _ = writeln!(out, "# api_url     = {}", resolved.api_url);
    if let Some(ref site) = resolved.site_url {
        let _ = writeln!(out, "# site_url    = {site}");
    }
    let _ = writeln!(out, "# token_store = {}", resolved.token_store);
    Ok(out.trim_end().to_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("Conjure CLI: configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config().unwrap_or_default();

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. API URL
            let api_url: String = Input::new()
                .with_prompt("API URL")
                .default(DEFAULT_API_URL.into())
                .validate_with(|s: &String| {
                    s.parse::<url::Url>().map(|_| ()).map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            // 3. Public site URL (optional)
            let site_url: String = Input::new()
                .with_prompt("Public site URL (optional)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            // 4. Token storage
            let storage = Select::new()
                .with_prompt("Where should the session token live?")
                .items(&["Token file in the data directory", "System keyring"])
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let profile = Profile {
                api_url,
                site_url: (!site_url.trim().is_empty()).then(|| site_url.trim().to_owned()),
                token_store: if storage == 1 {
                    TokenStorage::Keyring
                } else {
                    TokenStorage::File
                },
                ..Profile::default()
            };
            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }

            config::save_config(&cfg)?;
            eprintln!("\n   Profile '{profile_name}' saved to {}", config_path.display());
            eprintln!("   Next: conjure auth login");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let resolved = resolved_view(&cfg, global)?;
            let out = if matches!(global.output, OutputFormat::Table) {
                format_config(&cfg, &resolved)?
            } else {
                output::render_single(&global.output, &resolved, |_| String::new(), |r| {
                    r.api_url.clone()
                })
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            let names = cfg.profile_names();
            if names.is_empty() {
                output::print_output(
                    "No profiles configured. Create one with: conjure config init",
                    global.quiet,
                );
                return Ok(());
            }
            let lines: Vec<String> = names
                .into_iter()
                .map(|name| {
                    let marker = if name == default { "*" } else { " " };
                    format!("{marker} {name:<16} {}", cfg.profiles[name].api_url)
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            // Validates that the profile exists.
            cfg.active_profile(Some(&name))?;
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}
