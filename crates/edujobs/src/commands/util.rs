//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use secrecy::SecretString;
use serde_json::{Map, Value};

use edujobs_core::{JobBoard, ProfileKind};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Use the given password or prompt for one without echo.
pub fn password_or_prompt(given: Option<String>, prompt: &str) -> Result<SecretString, CliError> {
    match given {
        Some(p) => Ok(SecretString::from(p)),
        None => Ok(SecretString::from(rpassword::prompt_password(prompt)?)),
    }
}

/// The `message` field of a mutation response, shown verbatim.
pub fn server_message(value: &Value) -> Option<&str> {
    value.get("message").and_then(Value::as_str)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Parse an inline `--arg` JSON object.
pub fn parse_json_arg(raw: &str) -> Result<Value, CliError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| CliError::Validation {
        field: "arg".into(),
        reason: format!("invalid JSON: {e}"),
    })?;
    if !(value.is_object() || value.is_null()) {
        return Err(CliError::Validation {
            field: "arg".into(),
            reason: "must be a JSON object".into(),
        });
    }
    Ok(value)
}

/// Turn `key=value` pairs into a JSON object. Values that parse as JSON
/// (numbers, booleans, arrays) keep their type; everything else is a string.
pub fn parse_assignments(pairs: &[String]) -> Result<Value, CliError> {
    let mut map = Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            return Err(CliError::Validation {
                field: "set".into(),
                reason: format!("expected KEY=VALUE, got '{pair}'"),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::Validation {
                field: "set".into(),
                reason: format!("empty key in '{pair}'"),
            });
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
        map.insert(key.to_owned(), value);
    }
    Ok(Value::Object(map))
}

/// Merge `id` into an object argument loaded from a file.
pub fn with_id(mut body: Value, id: &str) -> Result<Value, CliError> {
    let Some(obj) = body.as_object_mut() else {
        return Err(CliError::Validation {
            field: "from-file".into(),
            reason: "must contain a JSON object".into(),
        });
    };
    obj.insert("id".into(), Value::String(id.to_owned()));
    Ok(body)
}

/// Profile kind from `--role`, or from the signed-in user's role.
pub fn resolve_profile_kind(
    board: &JobBoard,
    role: Option<&str>,
) -> Result<ProfileKind, CliError> {
    if let Some(role) = role {
        return Ok(edujobs_core::validation::parse_role(role)?.into());
    }
    board
        .session()
        .user()
        .map(|u| ProfileKind::from(u.role))
        .ok_or(CliError::NotSignedIn)
}

/// Reject an empty identifier before it reaches a path template.
pub fn require_id<'a>(field: &'static str, id: &'a str) -> Result<&'a str, CliError> {
    Ok(edujobs_core::validation::require(field, id)?)
}
