// REST API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection
// from the shared `SessionStore`, and normalization of error responses.
// Payloads stay as `serde_json::Value`; typing happens above this layer.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::session::SessionStore;
use crate::transport::TransportConfig;

/// Longest slice of an unparseable error body echoed back in messages.
const BODY_PREVIEW_LEN: usize = 200;

/// HTTP verbs used by the job-board API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Whether leftover arguments travel in a JSON body (vs. the query string).
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Server error bodies: `{"message": "..."}`, `{"error": "..."}` or
/// `{"error": {"message": "..."}}`.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<ErrorField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Nested { message: Option<String> },
}

/// Raw HTTP client for the job-board REST API.
///
/// Never mutates the session; it only reads the current token before
/// each request.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// A cookie jar is added when the config has none, so cookie-only
    /// sessions keep working.
    pub fn new(
        base_url: Url,
        session: Arc<SessionStore>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url, session))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: Arc<SessionStore>) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            session,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Resolve an API path (e.g. `auth/login`) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request and return the decoded JSON body.
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        self.request_with_query(path, method, &[], body).await
    }

    /// Like [`request`](Self::request), with query-string parameters.
    pub async fn request_with_query(
        &self,
        path: &str,
        method: Method,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method.into(), url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        match self.session.bearer_token() {
            Some(token) => {
                trace!("attaching bearer token");
                builder = builder.bearer_auth(token);
            }
            None => trace!("no bearer token, relying on cookies"),
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        parse_response(resp).await
    }

    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        self.request(path, Method::Get, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.request(path, Method::Post, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.request(path, Method::Put, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.request(path, Method::Patch, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, Error> {
        self.request(path, Method::Delete, None).await
    }
}

/// `Url::join` drops the last segment unless the base ends in `/`.
fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

async fn parse_response(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        let message = error_message(&body)
            .or_else(|| status.canonical_reason().map(String::from))
            .unwrap_or_else(|| "request failed".into());
        debug!(status = status.as_u16(), %message, "request rejected");
        return Err(Error::Http {
            status: status.as_u16(),
            message,
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| {
        let preview = preview(&body);
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

fn error_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let nested = match parsed.error {
            Some(ErrorField::Text(text)) => Some(text),
            Some(ErrorField::Nested { message }) => message,
            None => None,
        };
        return parsed.message.or(nested);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| preview(trimmed).to_owned())
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let base = normalize_base(Url::parse("https://jobs.example.com/api").unwrap());
        assert_eq!(base.as_str(), "https://jobs.example.com/api/");
        assert_eq!(
            base.join("auth/login").unwrap().as_str(),
            "https://jobs.example.com/api/auth/login"
        );
    }

    #[test]
    fn error_message_prefers_server_fields() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            error_message(r#"{"error":"Email taken"}"#).as_deref(),
            Some("Email taken")
        );
        assert_eq!(
            error_message(r#"{"error":{"message":"Slide not found"}}"#).as_deref(),
            Some("Slide not found")
        );
        assert_eq!(error_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message("{}"), None);
        assert_eq!(error_message("   "), None);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), BODY_PREVIEW_LEN);
    }

    #[test]
    fn only_write_verbs_carry_bodies() {
        assert!(Method::Post.has_body());
        assert!(Method::Patch.has_body());
        assert!(!Method::Get.has_body());
        assert!(!Method::Delete.has_body());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
