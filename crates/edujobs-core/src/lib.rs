// edujobs-core: Query cache, endpoint registry and session-aware facade
// between edujobs-api and consumers (CLI).

pub mod board;
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod registry;
pub mod tag;
pub mod validation;

// ── Primary re-exports ──────────────────────────────────────────────
pub use board::{AuthOutcome, JobBoard, JobFilter};
pub use cache::{CacheKey, QueryCache, QueryState, QueryStatus, QuerySubscription};
pub use config::{ClientConfig, SessionStorage, TlsVerification};
pub use endpoint::{Endpoint, EndpointKind, EndpointRequest, TagContext};
pub use error::CoreError;
pub use registry::{ContentKind, EndpointRegistry, ProfileKind};
pub use tag::{ResourceType, Tag, TagId};
pub use validation::{SignupForm, ValidationError};

// Wire types consumers need alongside the facade.
pub use edujobs_api::models::{
    Application, ApplicationStatus, AuthResponse, CarouselSlide, ContentItem, Job, Resume,
};
pub use edujobs_api::{Error as ApiError, Method, Role, Session, SessionStore, User};
