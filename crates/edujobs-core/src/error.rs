// ── Core error types ──
//
// Errors raised by the cache and facade. API errors are carried as-is
// inside `Arc` so a single failed request can be handed to every caller
// that shared it; consumers decide how to present them.

use std::sync::Arc;

use thiserror::Error;

use crate::endpoint::EndpointKind;
use crate::validation::ValidationError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Propagated from the HTTP layer ───────────────────────────────
    #[error(transparent)]
    Api(Arc<edujobs_api::Error>),

    // ── Registry / argument errors ───────────────────────────────────
    #[error("Unknown endpoint: {name}")]
    UnknownEndpoint { name: String },

    #[error("Endpoint {name} is not a {expected}")]
    WrongEndpointKind { name: String, expected: EndpointKind },

    #[error("Invalid argument for {endpoint}: {reason}")]
    InvalidArgument { endpoint: String, reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<edujobs_api::Error> for CoreError {
    fn from(err: edujobs_api::Error) -> Self {
        Self::Api(Arc::new(err))
    }
}

impl From<Arc<edujobs_api::Error>> for CoreError {
    fn from(err: Arc<edujobs_api::Error>) -> Self {
        Self::Api(err)
    }
}

impl CoreError {
    /// The underlying API error, if this failure came from the server or network.
    pub fn api_error(&self) -> Option<&edujobs_api::Error> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        self.api_error().and_then(edujobs_api::Error::status)
    }

    /// Server-provided message, verbatim.
    pub fn server_message(&self) -> Option<&str> {
        self.api_error()
            .and_then(edujobs_api::Error::server_message)
    }

    pub(crate) fn unexpected(endpoint: &str, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            endpoint: endpoint.to_owned(),
            message: message.into(),
        }
    }
}
