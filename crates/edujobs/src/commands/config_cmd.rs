//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::{feedback, output};

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display as TOML-ish text with stable ordering.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "keep_unused_secs = {}", cfg.defaults.keep_unused_secs);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ref path) = p.session_file {
            let _ = writeln!(out, "session_file = \"{}\"", path.display());
        }
        if p.ephemeral {
            let _ = writeln!(out, "ephemeral = true");
        }
    }

    out.trim_end().to_owned()
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

fn validate_url(value: &str) -> Result<(), CliError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| CliError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL '{value}': {e}"),
        })
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("edujobs -- configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. API URL
            let api_url: String = Input::new()
                .with_prompt("API base URL")
                .default(config::DEFAULT_API_URL.into())
                .validate_with(|input: &String| validate_url(input).map_err(|e| e.to_string()))
                .interact_text()
                .map_err(prompt_err)?;

            // 3. Session storage
            let storage_choices = &[
                "Remember my sign-in between runs",
                "Sign in every run (memory only)",
            ];
            let storage = Select::new()
                .with_prompt("Session storage")
                .items(storage_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            // 4. TLS
            let insecure = Confirm::new()
                .with_prompt("Accept invalid TLS certificates? (local development only)")
                .default(false)
                .interact()
                .map_err(prompt_err)?;

            // 5. Merge into any existing config
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    api_url,
                    insecure: insecure.then_some(true),
                    ephemeral: storage == 1,
                    ..Profile::default()
                },
            );
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: edujobs jobs list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            match key.as_str() {
                "output" => cfg.defaults.output = value,
                "color" => cfg.defaults.color = value,
                _ => {
                    let profile = cfg
                        .profiles
                        .entry(profile_name.clone())
                        .or_insert_with(|| Profile {
                            api_url: config::DEFAULT_API_URL.into(),
                            ..Profile::default()
                        });
                    match key.as_str() {
                        "api_url" | "api-url" => {
                            validate_url(&value)?;
                            profile.api_url = value;
                        }
                        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                        "insecure" => profile.insecure = Some(parse_bool("insecure", &value)?),
                        "timeout" => {
                            profile.timeout =
                                Some(value.parse().map_err(|_| CliError::Validation {
                                    field: "timeout".into(),
                                    reason: "must be a number (seconds)".into(),
                                })?);
                        }
                        "session_file" | "session-file" => {
                            profile.session_file = Some(value.into());
                        }
                        "ephemeral" => profile.ephemeral = parse_bool("ephemeral", &value)?,
                        other => {
                            return Err(CliError::Validation {
                                field: other.into(),
                                reason: format!(
                                    "unknown config key '{other}'. Valid keys: api_url, ca_cert, \
                                     insecure, timeout, session_file, ephemeral, output, color"
                                ),
                            });
                        }
                    }
                }
            }

            config::save_config(&cfg)?;
            feedback::success(global, &format!("Set {key} on profile '{profile_name}'"));
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: edujobs config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            feedback::success(global, &format!("Default profile set to '{name}'"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_config_lists_profiles_in_order() {
        let mut cfg = Config::default();
        for (name, url) in [("zeta", "https://z.example/api"), ("alpha", "https://a.example/api")] {
            cfg.profiles.insert(
                name.into(),
                Profile {
                    api_url: url.into(),
                    ..Profile::default()
                },
            );
        }
        let out = format_config(&cfg);
        let alpha = out.find("[profiles.alpha]");
        let zeta = out.find("[profiles.zeta]");
        assert!(alpha.is_some() && zeta.is_some());
        assert!(alpha < zeta);
        assert!(out.starts_with("default_profile = \"default\""));
    }

    #[test]
    fn bools_and_urls_are_validated() {
        assert!(parse_bool("insecure", "true").is_ok_and(|b| b));
        assert!(parse_bool("insecure", "yes").is_err());
        assert!(validate_url("https://jobs.example.org/api").is_ok());
        assert!(validate_url("jobs").is_err());
    }
}
