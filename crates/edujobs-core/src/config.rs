// ── Runtime client configuration ──
//
// These types describe *how* to reach the job-board backend and where the
// session lives. They never touch config files: the CLI builds a
// `ClientConfig` and hands it to `JobBoard::new`.

use std::path::PathBuf;
use std::time::Duration;

use edujobs_api::{TlsMode, TransportConfig};
use url::Url;

use crate::cache::DEFAULT_KEEP_UNUSED_FOR;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Only for local development backends.
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Where the session (`user` / `token`) is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionStorage {
    /// Nothing survives the process.
    #[default]
    Memory,
    /// A JSON document at the given path.
    File(PathBuf),
}

/// Configuration for one backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://jobs.example.org/api`.
    pub base_url: Url,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How long unobserved cache entries are kept.
    pub keep_unused_for: Duration,
    pub storage: SessionStorage,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:5000/api").expect("static URL is valid"),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            keep_unused_for: DEFAULT_KEEP_UNUSED_FOR,
            storage: SessionStorage::default(),
        }
    }
}

impl ClientConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar()
    }
}
