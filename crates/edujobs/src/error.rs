//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.
//! Server-provided messages are shown verbatim.

use miette::Diagnostic;
use thiserror::Error;

use edujobs_config::ConfigError;
use edujobs_core::{CoreError, ValidationError};

/// Process exit codes.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the job board at {url}")]
    #[diagnostic(
        code(edujobs::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Override the address with --api-url or `edujobs config set api_url <url>`."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(edujobs::auth_failed),
        help("Sign in with: edujobs auth login <email>")
    )]
    AuthFailed { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(edujobs::forbidden),
        help("Your account role does not allow this action.")
    )]
    Forbidden { message: String },

    #[error("Not signed in")]
    #[diagnostic(
        code(edujobs::not_signed_in),
        help("Sign in with: edujobs auth login <email>")
    )]
    NotSignedIn,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(edujobs::not_found))]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(edujobs::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(edujobs::api_error))]
    ApiError { message: String },

    #[error("Unknown endpoint '{name}'")]
    #[diagnostic(
        code(edujobs::unknown_endpoint),
        help("Run: edujobs api endpoints")
    )]
    UnknownEndpoint { name: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(edujobs::invalid_input))]
    InvalidInput(#[from] ValidationError),

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(edujobs::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(edujobs::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: edujobs config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(edujobs::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(edujobs::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(edujobs::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(edujobs::internal))]
    Internal(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotSignedIn => exit_code::AUTH,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } | Self::UnknownEndpoint { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::InvalidInput(_)
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(api) => {
                if api.is_network() {
                    let url = match &*api {
                        edujobs_core::ApiError::Transport(e) => e
                            .url()
                            .map_or_else(|| "(unknown)".into(), ToString::to_string),
                        _ => "(unknown)".into(),
                    };
                    return Self::ConnectionFailed {
                        url,
                        source: Box::new(ArcError(api)),
                    };
                }
                let message = api
                    .server_message()
                    .map_or_else(|| api.to_string(), str::to_owned);
                match api.status() {
                    Some(401) => Self::AuthFailed { message },
                    Some(403) => Self::Forbidden { message },
                    Some(404) => Self::NotFound { message },
                    Some(409) => Self::Conflict { message },
                    _ => Self::ApiError { message },
                }
            }

            CoreError::UnknownEndpoint { name } => Self::UnknownEndpoint { name },

            CoreError::WrongEndpointKind { name, expected } => Self::Validation {
                field: "endpoint".into(),
                reason: format!("'{name}' is not a {expected}"),
            },

            CoreError::InvalidArgument { endpoint, reason } => Self::Validation {
                field: format!("{endpoint} argument"),
                reason,
            },

            CoreError::Validation(err) => Self::InvalidInput(err),

            CoreError::UnexpectedResponse { .. } | CoreError::Config { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

/// Shares an `Arc`'d API error as an owned error source.
#[derive(Debug)]
struct ArcError(std::sync::Arc<edujobs_core::ApiError>);

impl std::fmt::Display for ArcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ArcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, message: &str) -> CliError {
        CoreError::from(edujobs_core::ApiError::Http {
            status,
            message: message.into(),
        })
        .into()
    }

    #[test]
    fn conflict_keeps_server_message_verbatim() {
        let err = http(409, "You have already applied to this job");
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
        assert_eq!(err.to_string(), "You have already applied to this job");
    }

    #[test]
    fn status_codes_map_to_exit_codes() {
        assert_eq!(http(401, "Invalid credentials").exit_code(), exit_code::AUTH);
        assert_eq!(http(403, "Forbidden").exit_code(), exit_code::PERMISSION);
        assert_eq!(http(404, "Job not found").exit_code(), exit_code::NOT_FOUND);
        assert_eq!(http(500, "boom").exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn validation_errors_are_usage_errors() {
        let err: CliError = CoreError::from(ValidationError::InvalidEmail).into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn unknown_endpoint_points_at_the_listing() {
        let err: CliError = CoreError::UnknownEndpoint {
            name: "getNothing".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "Unknown endpoint 'getNothing'");
    }
}
