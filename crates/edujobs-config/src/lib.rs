//! Shared configuration for the edujobs CLI.
//!
//! TOML profiles (one per backend), path resolution for the config file and
//! persisted sessions, and translation to `edujobs_core::ClientConfig`.
//! The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use edujobs_core::{ClientConfig, SessionStorage, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

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
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
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
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        self.profiles
            .get(&name)
            .map(|p| (name.clone(), p))
            .ok_or(ConfigError::UnknownProfile { name })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds an unobserved cache entry is kept.
    #[serde(default = "default_keep_unused")]
    pub keep_unused_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            keep_unused_secs: default_keep_unused(),
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
fn default_keep_unused() -> u64 {
    60
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://jobs.example.org/api").
    pub api_url: String,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates (local development only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Where the session is stored. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,

    /// Keep the session in memory only.
    #[serde(default)]
    pub ephemeral: bool,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "edujobs", "edujobs")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding persisted sessions.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

/// Default session file for a profile.
pub fn session_path(profile_name: &str) -> PathBuf {
    data_dir()
        .join("sessions")
        .join(format!("{profile_name}.json"))
}

fn dirs_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("edujobs");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit file (which may not exist) + environment.
///
/// Environment keys use `__` for nesting, e.g.
/// `EDUJOBS_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("EDUJOBS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile, with no CLI overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let base_url: url::Url = profile
        .api_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", profile.api_url),
        })?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let storage = if profile.ephemeral {
        SessionStorage::Memory
    } else {
        SessionStorage::File(
            profile
                .session_file
                .clone()
                .unwrap_or_else(|| session_path(profile_name)),
        )
    };

    Ok(ClientConfig {
        base_url,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        keep_unused_for: Duration::from_secs(defaults.keep_unused_secs),
        storage,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(url: &str) -> Profile {
        Profile {
            api_url: url.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn profile_translates_to_client_config() {
        let mut p = profile("https://jobs.example.org/api");
        p.timeout = Some(5);
        p.session_file = Some(PathBuf::from("/tmp/s.json"));

        let cfg = profile_to_client_config(&p, "work", &Defaults::default()).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://jobs.example.org/api");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.keep_unused_for, Duration::from_secs(60));
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
        assert_eq!(cfg.storage, SessionStorage::File(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn insecure_wins_over_custom_ca() {
        let mut p = profile("https://localhost:5000/api");
        p.insecure = Some(true);
        p.ca_cert = Some(PathBuf::from("ca.pem"));
        let cfg = profile_to_client_config(&p, "dev", &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn ephemeral_profiles_keep_sessions_in_memory() {
        let mut p = profile("https://jobs.example.org/api");
        p.ephemeral = true;
        let cfg = profile_to_client_config(&p, "ci", &Defaults::default()).unwrap();
        assert_eq!(cfg.storage, SessionStorage::Memory);
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let err = profile_to_client_config(&profile("not a url"), "x", &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn default_session_path_is_per_profile() {
        let path = session_path("staging");
        assert!(path.ends_with("sessions/staging.json"));
    }

    #[test]
    fn profile_lookup_falls_back_to_default_profile() {
        let mut cfg = Config::default();
        cfg.profiles
            .insert("default".into(), profile("https://a.example/api"));
        let (name, p) = cfg.profile(None).unwrap();
        assert_eq!(name, "default");
        assert_eq!(p.api_url, "https://a.example/api");
        assert!(matches!(
            cfg.profile(Some("missing")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }
}
