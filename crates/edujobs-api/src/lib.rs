// edujobs-api: Async Rust client for the edujobs job-board REST API

pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod transport;

pub use client::{ApiClient, Method};
pub use error::Error;
pub use models::{Role, User};
pub use session::{COOKIE_SESSION_TOKEN, Session, SessionStore};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use transport::{TlsMode, TransportConfig};
