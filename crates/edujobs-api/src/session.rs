// Client session state.
//
// One `SessionStore` per client, shared by `Arc` between the HTTP client
// (which reads the token) and the auth flows (which set and clear it).
// Changes are persisted to `KeyValueStorage` under "user" / "token" and
// broadcast to observers through a `watch` channel.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::User;
use crate::storage::KeyValueStorage;

/// Placeholder token for sessions carried by an HTTP-only cookie.
///
/// Never sent as a bearer token.
pub const COOKIE_SESSION_TOKEN: &str = "cookie";

const USER_KEY: &str = "user";
const TOKEN_KEY: &str = "token";

/// Point-in-time view of the client session.
///
/// `token` and `temp_token` are never both set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub temp_token: Option<String>,
    pub is_authenticated: bool,
}

impl Session {
    /// Token to send as `Authorization: Bearer`, if any.
    ///
    /// The cookie sentinel yields `None`; a pending temp token is sent so
    /// that OTP verification can authenticate itself.
    pub fn bearer_token(&self) -> Option<&str> {
        match self.token.as_deref() {
            Some(COOKIE_SESSION_TOKEN) => None,
            Some(token) => Some(token),
            None => self.temp_token.as_deref(),
        }
    }

    pub fn is_cookie_session(&self) -> bool {
        self.token.as_deref() == Some(COOKIE_SESSION_TOKEN)
    }
}

/// Lifecycle-scoped owner of the session.
pub struct SessionStore {
    state: watch::Sender<Session>,
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    /// Create an empty, unauthenticated store. Does not read storage.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self { state, storage }
    }

    /// Create a store and restore whatever session was persisted.
    ///
    /// Unreadable persisted state (a corrupt file or user record) is dropped
    /// with a warning and the store starts signed out. I/O failures are
    /// still errors.
    pub fn hydrate(storage: Arc<dyn KeyValueStorage>) -> Result<Self, Error> {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(Error::Deserialization { message, .. }) => {
                warn!(%message, "discarding unreadable persisted session");
                let (state, _) = watch::channel(Session::default());
                return Ok(Self { state, storage });
            }
            Err(e) => return Err(e),
        };
        let user = match storage.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable persisted user");
                    None
                }
            },
            None => None,
        };

        let session = Session {
            is_authenticated: token.is_some(),
            user,
            token,
            temp_token: None,
        };
        debug!(
            authenticated = session.is_authenticated,
            "session hydrated from storage"
        );

        let (state, _) = watch::channel(session);
        Ok(Self { state, storage })
    }

    /// Current session (cloned).
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.state.borrow().bearer_token().map(String::from)
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Install a logged-in user. Without a token the cookie sentinel is stored.
    pub fn set_credentials(&self, user: User, token: Option<String>) -> Result<(), Error> {
        let token = token.unwrap_or_else(|| COOKIE_SESSION_TOKEN.to_owned());
        self.persist_user(&user)?;
        self.storage.set(TOKEN_KEY, &token)?;

        self.state.send_modify(|s| {
            s.user = Some(user);
            s.token = Some(token);
            s.temp_token = None;
            s.is_authenticated = true;
        });
        debug!("credentials set");
        Ok(())
    }

    /// Replace the permanent token (token refresh). Clears any temp token.
    pub fn set_token(&self, token: String) -> Result<(), Error> {
        self.storage.set(TOKEN_KEY, &token)?;
        self.state.send_modify(|s| {
            s.token = Some(token);
            s.temp_token = None;
            s.is_authenticated = true;
        });
        debug!("session token replaced");
        Ok(())
    }

    /// Hold a temporary token for a pending OTP step. Clears the permanent token.
    pub fn set_temp_token(&self, temp_token: String) -> Result<(), Error> {
        self.storage.remove(TOKEN_KEY)?;
        self.state.send_modify(|s| {
            s.temp_token = Some(temp_token);
            s.token = None;
            s.is_authenticated = false;
        });
        debug!("temporary token set");
        Ok(())
    }

    /// Replace the cached user without touching tokens.
    pub fn update_user(&self, user: User) -> Result<(), Error> {
        self.persist_user(&user)?;
        self.state.send_modify(|s| s.user = Some(user));
        Ok(())
    }

    /// Log out locally: forget everything, in memory and on disk.
    ///
    /// The in-memory session is always cleared; a storage failure is
    /// reported afterwards and leaves at most a stale file behind.
    pub fn clear(&self) -> Result<(), Error> {
        self.state.send_replace(Session::default());
        let user = self.storage.remove(USER_KEY);
        let token = self.storage.remove(TOKEN_KEY);
        debug!("session cleared");
        user.and(token)
    }

    fn persist_user(&self, user: &User) -> Result<(), Error> {
        let raw = serde_json::to_string(user)
            .map_err(|e| Error::Storage(format!("failed to encode user: {e}")))?;
        self.storage.set(USER_KEY, &raw)
    }
}
