// ── Job board facade ──
//
// Ties the session, HTTP client, endpoint registry and query cache into
// one handle. Auth operations keep the session in step with the backend;
// everything else is a typed wrapper over `query` / `mutate`.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use edujobs_api::models::{
    Application, AuthResponse, CarouselSlide, ContentItem, Job, ListResponse, Resume,
};
use edujobs_api::{ApiClient, FileStorage, KeyValueStorage, MemoryStorage, SessionStore, User};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{QueryCache, QuerySubscription};
use crate::config::{ClientConfig, SessionStorage};
use crate::error::CoreError;
use crate::registry::{ContentKind, EndpointRegistry, ProfileKind, names};
use crate::validation::{self, SignupForm};

/// Result of a login-like call.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Credentials were issued; the session is authenticated.
    Authenticated(User),
    /// The backend wants a one-time code first. A temporary token may have
    /// been stored for the verification call.
    VerificationRequired { message: Option<String> },
}

/// Filters for the public job search.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

// ── JobBoard ─────────────────────────────────────────────────────────

/// Entry point for consumers. Cheaply cloneable.
#[derive(Clone)]
pub struct JobBoard {
    inner: Arc<JobBoardInner>,
}

struct JobBoardInner {
    session: Arc<SessionStore>,
    client: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for JobBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobBoard")
            .field("base_url", &self.inner.client.base_url().as_str())
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}

impl JobBoard {
    /// Build a board from configuration, restoring any persisted session.
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let storage: Arc<dyn KeyValueStorage> = match &config.storage {
            SessionStorage::Memory => Arc::new(MemoryStorage::new()),
            SessionStorage::File(path) => Arc::new(FileStorage::new(path.clone())),
        };
        let session = Arc::new(SessionStore::hydrate(storage)?);
        let client = ApiClient::new(config.base_url.clone(), session, &config.transport())?;
        Ok(Self::from_parts(
            Arc::new(client),
            EndpointRegistry::job_board(),
            config.keep_unused_for,
        ))
    }

    /// Assemble a board from an existing client (tests, custom registries).
    pub fn from_parts(
        client: Arc<ApiClient>,
        registry: EndpointRegistry,
        keep_unused_for: Duration,
    ) -> Self {
        let session = Arc::clone(client.session());
        let cache = QueryCache::new(Arc::clone(&client), Arc::new(registry))
            .with_keep_unused_for(keep_unused_for);
        Self {
            inner: Arc::new(JobBoardInner {
                session,
                client,
                cache: Arc::new(cache),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.inner.client
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    pub fn registry(&self) -> &EndpointRegistry {
        self.inner.cache.registry()
    }

    // ── Background tasks ─────────────────────────────────────────────

    /// Periodically drop cache entries nobody uses.
    pub fn start_pruner(&self, interval: Duration) {
        let handle = self
            .inner
            .cache
            .spawn_pruner(interval, self.inner.cancel.child_token());
        self.inner
            .task_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles: Vec<_> = self
            .inner
            .task_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            let _ = handle.await;
        }
        debug!("job board shut down");
    }

    // ── Generic access ───────────────────────────────────────────────

    pub async fn query(&self, endpoint: &str, arg: &Value) -> Result<Arc<Value>, CoreError> {
        self.inner.cache.query(endpoint, arg).await
    }

    pub async fn mutate(&self, endpoint: &str, arg: &Value) -> Result<Arc<Value>, CoreError> {
        self.inner.cache.mutate(endpoint, arg).await
    }

    pub async fn subscribe(
        &self,
        endpoint: &str,
        arg: &Value,
    ) -> Result<QuerySubscription, CoreError> {
        self.inner.cache.subscribe(endpoint, arg).await
    }

    /// Query and decode the result.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        arg: &Value,
    ) -> Result<T, CoreError> {
        let value = self.query(endpoint, arg).await?;
        decode(endpoint, &value)
    }

    /// Mutate and decode the result.
    pub async fn mutate_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        arg: &Value,
    ) -> Result<T, CoreError> {
        let value = self.mutate(endpoint, arg).await?;
        decode(endpoint, &value)
    }

    async fn query_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        arg: &Value,
    ) -> Result<Vec<T>, CoreError> {
        self.query_as::<ListResponse<T>>(endpoint, arg)
            .await
            .map(ListResponse::into_items)
    }

    // ── Auth ─────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthOutcome, CoreError> {
        let email = validation::validate_email(email)?;
        if password.expose_secret().is_empty() {
            return Err(validation::ValidationError::Required { field: "Password" }.into());
        }
        let body = json!({ "email": email, "password": password.expose_secret() });
        self.authenticate(names::LOGIN, &body).await
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<AuthOutcome, CoreError> {
        let body = form.to_body()?;
        self.authenticate(names::SIGNUP, &body).await
    }

    /// Complete an OTP step. The temporary token, if any, authorizes the call.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<AuthOutcome, CoreError> {
        let email = validation::validate_email(email)?;
        let code = validation::validate_otp(code)?;
        let body = json!({ "email": email, "otp": code });
        self.authenticate(names::VERIFY_OTP, &body).await
    }

    /// Ask for a new one-time code. Returns the server's message.
    pub async fn resend_otp(&self, email: &str) -> Result<Option<String>, CoreError> {
        let email = validation::validate_email(email)?;
        let value = self
            .mutate(names::RESEND_OTP, &json!({ "email": email }))
            .await?;
        Ok(server_message(&value))
    }

    /// Exchange an identity-provider credential for a session.
    pub async fn google_auth(&self, credential: &str) -> Result<AuthOutcome, CoreError> {
        let credential = validation::require("Credential", credential)?;
        self.authenticate(names::GOOGLE_AUTH, &json!({ "credential": credential }))
            .await
    }

    /// Swap the session token for a fresh one.
    ///
    /// Cookie sessions get a new cookie instead; the stored token is left alone.
    pub async fn refresh_token(&self) -> Result<(), CoreError> {
        let session = Arc::clone(&self.inner.session);
        self.inner
            .cache
            .mutate_then(names::REFRESH_TOKEN, &Value::Null, move |value| {
                let resp = decode::<AuthResponse>(names::REFRESH_TOKEN, value)?;
                if let Some(token) = resp.token {
                    session.set_token(token)?;
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// End the session: tell the backend, then forget everything locally.
    ///
    /// The local session and cache are cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<(), CoreError> {
        if let Err(e) = self.mutate(names::LOGOUT, &Value::Null).await {
            warn!(error = %e, "logout request failed; clearing local session anyway");
        }
        let cleared = self.inner.session.clear();
        self.inner.cache.reset();
        info!("logged out");
        cleared.map_err(CoreError::from)
    }

    /// The account behind the current session. Refreshes the stored user.
    pub async fn current_user(&self) -> Result<User, CoreError> {
        let value = self.query(names::GET_CURRENT_USER, &Value::Null).await?;
        let user: User = decode(names::GET_CURRENT_USER, unwrap_field(&value, "user"))?;
        if self.inner.session.is_authenticated() {
            self.inner.session.update_user(user.clone())?;
        }
        Ok(user)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, CoreError> {
        let email = validation::validate_email(email)?;
        let value = self
            .mutate(names::FORGOT_PASSWORD, &json!({ "email": email }))
            .await?;
        Ok(server_message(&value))
    }

    pub async fn reset_password(
        &self,
        reset_token: &str,
        password: &SecretString,
        confirm: &SecretString,
    ) -> Result<Option<String>, CoreError> {
        let reset_token = validation::require("Reset token", reset_token)?;
        validation::validate_password(password)?;
        validation::validate_confirmation(password, confirm)?;
        let body = json!({ "token": reset_token, "password": password.expose_secret() });
        let value = self.mutate(names::RESET_PASSWORD, &body).await?;
        Ok(server_message(&value))
    }

    pub async fn change_password(
        &self,
        current: &SecretString,
        new: &SecretString,
        confirm: &SecretString,
    ) -> Result<Option<String>, CoreError> {
        if current.expose_secret().is_empty() {
            return Err(validation::ValidationError::Required {
                field: "Current password",
            }
            .into());
        }
        validation::validate_password(new)?;
        validation::validate_confirmation(new, confirm)?;
        let body = json!({
            "currentPassword": current.expose_secret(),
            "newPassword": new.expose_secret(),
        });
        let value = self.mutate(names::CHANGE_PASSWORD, &body).await?;
        Ok(server_message(&value))
    }

    /// Run an auth mutation and install whatever credentials it returns
    /// before the cache refetches session-scoped queries.
    async fn authenticate(&self, endpoint: &str, body: &Value) -> Result<AuthOutcome, CoreError> {
        let session = Arc::clone(&self.inner.session);
        let (_, outcome) = self
            .inner
            .cache
            .mutate_then(endpoint, body, move |value| {
                apply_auth_response(&session, endpoint, value)
            })
            .await?;
        Ok(outcome)
    }

    // ── Jobs ─────────────────────────────────────────────────────────

    pub async fn jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, CoreError> {
        let arg = serde_json::to_value(filter)
            .map_err(|e| CoreError::unexpected(names::GET_JOBS, e.to_string()))?;
        self.query_list(names::GET_JOBS, &arg).await
    }

    pub async fn job(&self, id: &str) -> Result<Job, CoreError> {
        let value = self.query(names::GET_JOB, &json!({ "id": id })).await?;
        decode(names::GET_JOB, unwrap_field(&value, "job"))
    }

    pub async fn employer_jobs(&self) -> Result<Vec<Job>, CoreError> {
        self.query_list(names::GET_EMPLOYER_JOBS, &json!({})).await
    }

    pub async fn close_job(&self, id: &str) -> Result<Arc<Value>, CoreError> {
        self.mutate(names::CLOSE_JOB, &json!({ "id": id })).await
    }

    pub async fn delete_job(&self, id: &str) -> Result<Arc<Value>, CoreError> {
        self.mutate(names::DELETE_JOB, &json!({ "id": id })).await
    }

    // ── Applications ─────────────────────────────────────────────────

    pub async fn apply_to_job(
        &self,
        job_id: &str,
        cover_letter: Option<&str>,
        resume_id: Option<&str>,
    ) -> Result<Arc<Value>, CoreError> {
        let job_id = validation::require("Job", job_id)?;
        let mut arg = json!({ "jobId": job_id });
        if let Some(letter) = cover_letter.map(str::trim).filter(|s| !s.is_empty()) {
            arg["coverLetter"] = Value::String(letter.to_owned());
        }
        if let Some(resume) = resume_id {
            arg["resumeId"] = Value::String(resume.to_owned());
        }
        self.mutate(names::APPLY_TO_JOB, &arg).await
    }

    pub async fn withdraw_application(&self, id: &str) -> Result<Arc<Value>, CoreError> {
        self.mutate(names::WITHDRAW_APPLICATION, &json!({ "id": id }))
            .await
    }

    pub async fn my_applications(&self) -> Result<Vec<Application>, CoreError> {
        self.query_list(names::GET_MY_APPLICATIONS, &json!({})).await
    }

    pub async fn job_applications(&self, job_id: &str) -> Result<Vec<Application>, CoreError> {
        self.query_list(names::GET_JOB_APPLICATIONS, &json!({ "jobId": job_id }))
            .await
    }

    pub async fn saved_jobs(&self) -> Result<Vec<Job>, CoreError> {
        self.query_list(names::GET_SAVED_JOBS, &json!({})).await
    }

    pub async fn save_job(&self, job_id: &str) -> Result<Arc<Value>, CoreError> {
        self.mutate(names::SAVE_JOB, &json!({ "jobId": job_id })).await
    }

    pub async fn unsave_job(&self, job_id: &str) -> Result<Arc<Value>, CoreError> {
        self.mutate(names::UNSAVE_JOB, &json!({ "jobId": job_id })).await
    }

    // ── Resumes ──────────────────────────────────────────────────────

    pub async fn resumes(&self) -> Result<Vec<Resume>, CoreError> {
        self.query_list(names::GET_RESUMES, &json!({})).await
    }

    pub async fn delete_resume(&self, id: &str) -> Result<Arc<Value>, CoreError> {
        self.mutate(names::DELETE_RESUME, &json!({ "id": id })).await
    }

    // ── Profiles ─────────────────────────────────────────────────────

    /// Profile for the signed-in user's role.
    pub async fn profile(&self, kind: ProfileKind) -> Result<Arc<Value>, CoreError> {
        self.query(&kind.get_endpoint(), &json!({})).await
    }

    pub async fn update_profile(
        &self,
        kind: ProfileKind,
        changes: &Value,
    ) -> Result<Arc<Value>, CoreError> {
        self.mutate(&kind.update_endpoint(), changes).await
    }

    // ── Content ──────────────────────────────────────────────────────

    pub async fn content(&self, kind: ContentKind) -> Result<Vec<ContentItem>, CoreError> {
        self.query_list(&kind.list_endpoint(), &json!({})).await
    }

    pub async fn carousel_slides(&self) -> Result<Vec<CarouselSlide>, CoreError> {
        self.query_list(&ContentKind::CarouselSlides.list_endpoint(), &json!({}))
            .await
    }

    pub async fn delete_carousel_slide(&self, id: &str) -> Result<Arc<Value>, CoreError> {
        self.mutate(&ContentKind::CarouselSlides.delete_endpoint(), &json!({ "id": id }))
            .await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(endpoint: &str, value: &Value) -> Result<T, CoreError> {
    T::deserialize(value).map_err(|e| CoreError::unexpected(endpoint, e.to_string()))
}

/// Detail payloads come bare or wrapped in a field named after the entity.
fn unwrap_field<'a>(value: &'a Value, field: &str) -> &'a Value {
    match value.get(field) {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

fn server_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Install the credentials carried by an auth response.
fn apply_auth_response(
    session: &SessionStore,
    endpoint: &str,
    value: &Value,
) -> Result<AuthOutcome, CoreError> {
    let resp: AuthResponse = decode(endpoint, value)?;

    if let Some(temp_token) = resp.temp_token {
        session.set_temp_token(temp_token)?;
        debug!(endpoint, "verification step pending");
        return Ok(AuthOutcome::VerificationRequired {
            message: resp.message,
        });
    }

    if let Some(user) = resp.user {
        session.set_credentials(user.clone(), resp.token)?;
        info!(endpoint, role = %user.role, "signed in");
        return Ok(AuthOutcome::Authenticated(user));
    }

    if resp.message.is_some() {
        return Ok(AuthOutcome::VerificationRequired {
            message: resp.message,
        });
    }

    Err(CoreError::unexpected(
        endpoint,
        "response carried neither a user nor a verification token",
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use edujobs_api::Role;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn auth_response_with_token_authenticates() {
        let session = store();
        let outcome = apply_auth_response(
            &session,
            "login",
            &json!({ "user": { "id": "u1", "email": "a@b.org", "role": "employer" }, "token": "t1" }),
        )
        .unwrap();
        assert!(matches!(outcome, AuthOutcome::Authenticated(ref u) if u.role == Role::Employer));
        assert_eq!(session.bearer_token().as_deref(), Some("t1"));
    }

    #[test]
    fn auth_response_without_token_uses_cookie_session() {
        let session = store();
        apply_auth_response(
            &session,
            "googleAuth",
            &json!({ "user": { "_id": "u2", "email": "c@d.org", "role": "teacher" } }),
        )
        .unwrap();
        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated);
        assert!(snapshot.is_cookie_session());
        assert_eq!(snapshot.bearer_token(), None);
    }

    #[test]
    fn temp_token_means_verification_pending() {
        let session = store();
        let outcome = apply_auth_response(
            &session,
            "signup",
            &json!({ "tempToken": "tmp", "message": "Check your inbox" }),
        )
        .unwrap();
        assert_eq!(
            outcome,
            AuthOutcome::VerificationRequired {
                message: Some("Check your inbox".into())
            }
        );
        assert!(!session.is_authenticated());
        assert_eq!(session.bearer_token().as_deref(), Some("tmp"));
    }

    #[test]
    fn empty_auth_response_is_unexpected() {
        let err = apply_auth_response(&store(), "login", &json!({})).unwrap_err();
        assert!(matches!(err, CoreError::UnexpectedResponse { .. }));
    }

    #[test]
    fn job_filter_skips_unset_fields() {
        let filter = JobFilter {
            search: Some("chemistry".into()),
            job_type: Some("full-time".into()),
            ..JobFilter::default()
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({ "search": "chemistry", "jobType": "full-time" })
        );
    }

    #[test]
    fn detail_payloads_may_be_wrapped() {
        let wrapped = json!({ "job": { "id": "j1" } });
        assert_eq!(unwrap_field(&wrapped, "job"), &json!({ "id": "j1" }));
        let bare = json!({ "id": "j1", "job": "teacher" });
        assert_eq!(unwrap_field(&bare, "job"), &bare);
    }
}
