//! CLI configuration -- thin wrapper around `edujobs_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--api-url, --insecure, etc.).

use edujobs_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use edujobs_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

/// Fallback backend when no profile and no `--api-url` is given.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ClientConfig` from the config file, the active profile, and
/// CLI overrides.
///
/// An explicitly requested profile must exist. Without one, the default
/// profile is used when configured, otherwise `--api-url` (or the local
/// development backend).
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => Profile {
            api_url: DEFAULT_API_URL.into(),
            ..Profile::default()
        },
    };

    let profile = resolve_profile(base, global);
    tracing::debug!(profile = %profile_name, api_url = %profile.api_url, "resolved profile");
    Ok(edujobs_config::profile_to_client_config(
        &profile,
        &profile_name,
        &cfg.defaults,
    )?)
}

/// Apply flag overrides to a profile. Flags take priority over profile values.
pub fn resolve_profile(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if global.ephemeral {
        profile.ephemeral = true;
    }
    profile
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}
