// ── Endpoint registry ──
//
// The job-board API as a data table: every endpoint with its request
// template and tag rule. The cache interprets this table; nothing else in
// the crate decides what gets invalidated.

use std::collections::HashMap;
use std::sync::Arc;

use edujobs_api::Method;

use crate::endpoint::{Endpoint, EndpointKind, TagContext};
use crate::error::CoreError;
use crate::tag::{ResourceType, Tag, entity_tags};

/// Names of endpoints the facade calls directly.
pub mod names {
    pub const LOGIN: &str = "login";
    pub const SIGNUP: &str = "signup";
    pub const VERIFY_OTP: &str = "verifyOtp";
    pub const RESEND_OTP: &str = "resendOtp";
    pub const GOOGLE_AUTH: &str = "googleAuth";
    pub const LOGOUT: &str = "logout";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const FORGOT_PASSWORD: &str = "forgotPassword";
    pub const RESET_PASSWORD: &str = "resetPassword";
    pub const CHANGE_PASSWORD: &str = "changePassword";
    pub const GET_CURRENT_USER: &str = "getCurrentUser";

    pub const GET_JOBS: &str = "getJobs";
    pub const GET_JOB: &str = "getJob";
    pub const GET_EMPLOYER_JOBS: &str = "getEmployerJobs";
    pub const CREATE_JOB: &str = "createJob";
    pub const UPDATE_JOB: &str = "updateJob";
    pub const DELETE_JOB: &str = "deleteJob";
    pub const CLOSE_JOB: &str = "closeJob";

    pub const GET_MY_APPLICATIONS: &str = "getMyApplications";
    pub const GET_JOB_APPLICATIONS: &str = "getJobApplications";
    pub const APPLY_TO_JOB: &str = "applyToJob";
    pub const WITHDRAW_APPLICATION: &str = "withdrawApplication";
    pub const UPDATE_APPLICATION_STATUS: &str = "updateApplicationStatus";
    pub const GET_SAVED_JOBS: &str = "getSavedJobs";
    pub const SAVE_JOB: &str = "saveJob";
    pub const UNSAVE_JOB: &str = "unsaveJob";

    pub const GET_RESUMES: &str = "getResumes";
    pub const UPLOAD_RESUME: &str = "uploadResume";
    pub const DELETE_RESUME: &str = "deleteResume";

    pub const GET_USERS: &str = "getUsers";
    pub const UPDATE_USER_STATUS: &str = "updateUserStatus";
    pub const DELETE_USER: &str = "deleteUser";
}

/// Resources that belong to whoever is logged in; a new identity makes them stale.
static SESSION_SCOPED: [ResourceType; 8] = [
    ResourceType::User,
    ResourceType::Application,
    ResourceType::SavedJob,
    ResourceType::Resume,
    ResourceType::TeacherProfile,
    ResourceType::EmployerProfile,
    ResourceType::CollegeProfile,
    ResourceType::AdminProfile,
];

/// Editable content families, each a full CRUD set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ContentKind {
    SalaryGuides,
    CareerArticles,
    #[strum(serialize = "press")]
    PressArticles,
    #[strum(serialize = "carousel")]
    CarouselSlides,
    Resources,
}

impl ContentKind {
    pub fn resource(self) -> ResourceType {
        match self {
            Self::SalaryGuides => ResourceType::SalaryGuide,
            Self::CareerArticles => ResourceType::CareerArticle,
            Self::PressArticles => ResourceType::PressArticle,
            Self::CarouselSlides => ResourceType::CarouselSlide,
            Self::Resources => ResourceType::Resource,
        }
    }

    /// (singular, plural) used to build endpoint names.
    fn nouns(self) -> (&'static str, &'static str) {
        match self {
            Self::SalaryGuides => ("SalaryGuide", "SalaryGuides"),
            Self::CareerArticles => ("CareerArticle", "CareerArticles"),
            Self::PressArticles => ("PressArticle", "PressArticles"),
            Self::CarouselSlides => ("CarouselSlide", "CarouselSlides"),
            Self::Resources => ("Resource", "Resources"),
        }
    }

    /// (public read path, admin write path)
    fn paths(self) -> (&'static str, &'static str) {
        match self {
            Self::SalaryGuides => ("salary-guides", "admin/salary-guides"),
            Self::CareerArticles => ("career-articles", "admin/career-articles"),
            Self::PressArticles => ("press", "admin/press"),
            Self::CarouselSlides => ("carousel", "admin/carousel"),
            Self::Resources => ("resources", "admin/resources"),
        }
    }

    pub fn list_endpoint(self) -> String {
        format!("get{}", self.nouns().1)
    }

    pub fn get_endpoint(self) -> String {
        format!("get{}", self.nouns().0)
    }

    pub fn create_endpoint(self) -> String {
        format!("create{}", self.nouns().0)
    }

    pub fn update_endpoint(self) -> String {
        format!("update{}", self.nouns().0)
    }

    pub fn delete_endpoint(self) -> String {
        format!("delete{}", self.nouns().0)
    }
}

/// Profile-owning roles, each with a get/update pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum ProfileKind {
    Teacher,
    Employer,
    College,
    Admin,
}

impl ProfileKind {
    pub fn resource(self) -> ResourceType {
        match self {
            Self::Teacher => ResourceType::TeacherProfile,
            Self::Employer => ResourceType::EmployerProfile,
            Self::College => ResourceType::CollegeProfile,
            Self::Admin => ResourceType::AdminProfile,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::Teacher => "teacher/profile",
            Self::Employer => "employer/profile",
            Self::College => "college/profile",
            Self::Admin => "admin/profile",
        }
    }

    pub fn get_endpoint(self) -> String {
        format!("get{self}Profile")
    }

    pub fn update_endpoint(self) -> String {
        format!("update{self}Profile")
    }
}

impl From<edujobs_api::Role> for ProfileKind {
    fn from(role: edujobs_api::Role) -> Self {
        match role {
            edujobs_api::Role::Teacher => Self::Teacher,
            edujobs_api::Role::Employer => Self::Employer,
            edujobs_api::Role::College => Self::College,
            edujobs_api::Role::Admin => Self::Admin,
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Lookup table of endpoints by name.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<String, Arc<Endpoint>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every endpoint of the job-board backend.
    pub fn job_board() -> Self {
        let mut registry = Self::new();
        for endpoint in auth_endpoints()
            .into_iter()
            .chain(job_endpoints())
            .chain(application_endpoints())
            .chain(resume_endpoints())
            .chain(profile_endpoints())
            .chain(content_endpoints())
        {
            registry.register(endpoint);
        }
        registry
    }

    /// Add an endpoint, returning the one it replaced.
    pub fn register(&mut self, endpoint: Endpoint) -> Option<Arc<Endpoint>> {
        self.endpoints
            .insert(endpoint.name().to_owned(), Arc::new(endpoint))
    }

    pub fn get(&self, name: &str) -> Result<Arc<Endpoint>, CoreError> {
        self.endpoints
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownEndpoint {
                name: name.to_owned(),
            })
    }

    /// Look up an endpoint and check its kind.
    pub fn expect(&self, name: &str, kind: EndpointKind) -> Result<Arc<Endpoint>, CoreError> {
        let endpoint = self.get(name)?;
        if endpoint.kind() != kind {
            return Err(CoreError::WrongEndpointKind {
                name: name.to_owned(),
                expected: kind,
            });
        }
        Ok(endpoint)
    }

    /// All endpoints, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        let mut all: Vec<_> = self.endpoints.values().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all.into_iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

// ── Tag rules ────────────────────────────────────────────────────────

/// Collection query: the list tag plus one tag per returned entity.
fn provides_list(resource: ResourceType) -> impl Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync {
    move |ctx| {
        let mut tags = vec![Tag::list(resource)];
        tags.extend(
            ctx.result_ids()
                .into_iter()
                .map(|id| Tag::id(resource, id)),
        );
        tags
    }
}

/// Detail query keyed by an argument field.
fn provides_entity(
    resource: ResourceType,
    field: &'static str,
) -> impl Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync {
    move |ctx| match ctx.arg_str(field).or_else(|| ctx.result_id()) {
        Some(id) => vec![Tag::id(resource, id)],
        None => vec![Tag::resource(resource)],
    }
}

/// Singleton query (current user, own profile).
fn provides_singleton(resource: ResourceType) -> impl Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync {
    move |ctx| {
        let mut tags = vec![Tag::resource(resource)];
        if let Some(id) = ctx.result_id() {
            tags.push(Tag::id(resource, id));
        }
        tags
    }
}

/// Create: the collection, plus the new entity once the response names it.
fn invalidates_created(
    resource: ResourceType,
) -> impl Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync {
    move |ctx| match ctx.result_id() {
        Some(id) => entity_tags(resource, id),
        None => vec![Tag::list(resource)],
    }
}

/// Write to one entity: its own tag and its collection.
fn invalidates_entity(
    resource: ResourceType,
    field: &'static str,
) -> impl Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync {
    move |ctx| match ctx.arg_str(field).or_else(|| ctx.result_id()) {
        Some(id) => entity_tags(resource, id),
        None => vec![Tag::list(resource)],
    }
}

fn invalidates_types(
    resources: &'static [ResourceType],
) -> impl Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync {
    move |_| resources.iter().copied().map(Tag::resource).collect()
}

fn invalidates_nothing(_: &TagContext<'_>) -> Vec<Tag> {
    Vec::new()
}

// ── Families ─────────────────────────────────────────────────────────

fn auth_endpoints() -> Vec<Endpoint> {
    use names::*;
    vec![
        Endpoint::mutation(LOGIN, Method::Post, "auth/login", invalidates_types(&SESSION_SCOPED)),
        Endpoint::mutation(SIGNUP, Method::Post, "auth/signup", invalidates_types(&SESSION_SCOPED)),
        Endpoint::mutation(
            VERIFY_OTP,
            Method::Post,
            "auth/verify-otp",
            invalidates_types(&SESSION_SCOPED),
        ),
        Endpoint::mutation(RESEND_OTP, Method::Post, "auth/resend-otp", invalidates_nothing),
        Endpoint::mutation(
            GOOGLE_AUTH,
            Method::Post,
            "auth/google",
            invalidates_types(&SESSION_SCOPED),
        ),
        // Logout resets the whole cache; nothing to invalidate first.
        Endpoint::mutation(LOGOUT, Method::Post, "auth/logout", invalidates_nothing),
        Endpoint::mutation(
            REFRESH_TOKEN,
            Method::Post,
            "auth/refresh-token",
            invalidates_nothing,
        ),
        Endpoint::mutation(
            FORGOT_PASSWORD,
            Method::Post,
            "auth/forgot-password",
            invalidates_nothing,
        ),
        Endpoint::mutation(
            RESET_PASSWORD,
            Method::Post,
            "auth/reset-password",
            invalidates_nothing,
        ),
        Endpoint::mutation(
            CHANGE_PASSWORD,
            Method::Put,
            "auth/change-password",
            invalidates_nothing,
        ),
        Endpoint::query(
            GET_CURRENT_USER,
            "auth/me",
            provides_singleton(ResourceType::User),
        ),
    ]
}

fn job_endpoints() -> Vec<Endpoint> {
    use names::*;
    vec![
        Endpoint::query(GET_JOBS, "jobs", provides_list(ResourceType::Job)),
        Endpoint::query(GET_JOB, "jobs/{id}", provides_entity(ResourceType::Job, "id")),
        Endpoint::query(
            GET_EMPLOYER_JOBS,
            "employer/jobs",
            provides_list(ResourceType::Job),
        ),
        Endpoint::mutation(
            CREATE_JOB,
            Method::Post,
            "employer/jobs",
            invalidates_created(ResourceType::Job),
        ),
        Endpoint::mutation(
            UPDATE_JOB,
            Method::Put,
            "employer/jobs/{id}",
            invalidates_entity(ResourceType::Job, "id"),
        ),
        Endpoint::mutation(
            DELETE_JOB,
            Method::Delete,
            "employer/jobs/{id}",
            invalidates_entity(ResourceType::Job, "id"),
        ),
        Endpoint::mutation(
            CLOSE_JOB,
            Method::Patch,
            "employer/jobs/{id}/close",
            invalidates_entity(ResourceType::Job, "id"),
        ),
    ]
}

fn application_endpoints() -> Vec<Endpoint> {
    use names::*;
    vec![
        Endpoint::query(
            GET_MY_APPLICATIONS,
            "applications/me",
            provides_list(ResourceType::Application),
        ),
        Endpoint::query(
            GET_JOB_APPLICATIONS,
            "employer/jobs/{jobId}/applications",
            provides_list(ResourceType::Application),
        ),
        // Applying also changes the job's applicant count.
        Endpoint::mutation(APPLY_TO_JOB, Method::Post, "jobs/{jobId}/apply", |ctx| {
            let mut tags = match ctx.result_id() {
                Some(id) => entity_tags(ResourceType::Application, id),
                None => vec![Tag::list(ResourceType::Application)],
            };
            if let Some(job_id) = ctx.arg_str("jobId") {
                tags.push(Tag::id(ResourceType::Job, job_id));
            }
            tags
        }),
        Endpoint::mutation(
            WITHDRAW_APPLICATION,
            Method::Delete,
            "applications/{id}",
            invalidates_entity(ResourceType::Application, "id"),
        ),
        Endpoint::mutation(
            UPDATE_APPLICATION_STATUS,
            Method::Patch,
            "employer/applications/{id}/status",
            invalidates_entity(ResourceType::Application, "id"),
        ),
        Endpoint::query(
            GET_SAVED_JOBS,
            "jobs/saved",
            provides_list(ResourceType::SavedJob),
        ),
        Endpoint::mutation(
            SAVE_JOB,
            Method::Post,
            "jobs/{jobId}/save",
            invalidates_entity(ResourceType::SavedJob, "jobId"),
        ),
        Endpoint::mutation(
            UNSAVE_JOB,
            Method::Delete,
            "jobs/{jobId}/save",
            invalidates_entity(ResourceType::SavedJob, "jobId"),
        ),
    ]
}

fn resume_endpoints() -> Vec<Endpoint> {
    use names::*;
    vec![
        Endpoint::query(GET_RESUMES, "resumes", provides_list(ResourceType::Resume)),
        Endpoint::mutation(
            UPLOAD_RESUME,
            Method::Post,
            "resumes",
            invalidates_created(ResourceType::Resume),
        ),
        Endpoint::mutation(
            DELETE_RESUME,
            Method::Delete,
            "resumes/{id}",
            invalidates_entity(ResourceType::Resume, "id"),
        ),
    ]
}

fn profile_endpoints() -> Vec<Endpoint> {
    use names::*;
    use strum::IntoEnumIterator;

    let mut endpoints: Vec<Endpoint> = ProfileKind::iter()
        .flat_map(|kind| {
            let resource = kind.resource();
            [
                Endpoint::query(kind.get_endpoint(), kind.path(), provides_singleton(resource)),
                // Profile edits can rename the account or change its avatar.
                Endpoint::mutation(kind.update_endpoint(), Method::Put, kind.path(), move |_| {
                    vec![Tag::resource(resource), Tag::resource(ResourceType::User)]
                }),
            ]
        })
        .collect();

    endpoints.extend([
        Endpoint::query(GET_USERS, "admin/users", provides_list(ResourceType::User)),
        Endpoint::mutation(
            UPDATE_USER_STATUS,
            Method::Patch,
            "admin/users/{id}/status",
            invalidates_entity(ResourceType::User, "id"),
        ),
        Endpoint::mutation(
            DELETE_USER,
            Method::Delete,
            "admin/users/{id}",
            invalidates_entity(ResourceType::User, "id"),
        ),
    ]);
    endpoints
}

fn content_endpoints() -> Vec<Endpoint> {
    use strum::IntoEnumIterator;

    ContentKind::iter()
        .flat_map(|kind| {
            let resource = kind.resource();
            let (read, write) = kind.paths();
            [
                Endpoint::query(kind.list_endpoint(), read, provides_list(resource)),
                Endpoint::query(
                    kind.get_endpoint(),
                    format!("{read}/{{id}}"),
                    provides_entity(resource, "id"),
                ),
                Endpoint::mutation(
                    kind.create_endpoint(),
                    Method::Post,
                    write,
                    invalidates_created(resource),
                ),
                Endpoint::mutation(
                    kind.update_endpoint(),
                    Method::Put,
                    format!("{write}/{{id}}"),
                    invalidates_entity(resource, "id"),
                ),
                Endpoint::mutation(
                    kind.delete_endpoint(),
                    Method::Delete,
                    format!("{write}/{{id}}"),
                    invalidates_entity(resource, "id"),
                ),
            ]
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tag::TagId;
    use serde_json::{Value, json};

    fn ctx<'a>(arg: &'a Value, result: &'a Value) -> TagContext<'a> {
        TagContext {
            arg,
            result: Some(result),
        }
    }

    #[test]
    fn registry_covers_every_family() {
        let registry = EndpointRegistry::job_board();
        for name in [
            names::LOGIN,
            names::GET_CURRENT_USER,
            names::GET_JOBS,
            names::APPLY_TO_JOB,
            names::GET_RESUMES,
            "getEmployerProfile",
            "updateCollegeProfile",
            "getSalaryGuides",
            "deleteCarouselSlide",
            "getPressArticle",
            "updateResource",
            "createCareerArticle",
        ] {
            assert!(registry.get(name).is_ok(), "missing endpoint {name}");
        }
        // 11 auth + 7 jobs + 8 applications + 3 resumes + 8 profiles + 3 admin users + 25 content
        assert_eq!(registry.len(), 65);
    }

    #[test]
    fn kind_is_checked() {
        let registry = EndpointRegistry::job_board();
        let err = registry
            .expect(names::GET_JOBS, EndpointKind::Mutation)
            .unwrap_err();
        assert!(matches!(err, CoreError::WrongEndpointKind { .. }));
        assert!(matches!(
            registry.get("nope"),
            Err(CoreError::UnknownEndpoint { .. })
        ));
    }

    #[test]
    fn delete_slide_invalidates_detail_and_list() {
        let registry = EndpointRegistry::job_board();
        let ep = registry.get("deleteCarouselSlide").unwrap();
        assert_eq!(ep.path_template(), "admin/carousel/{id}");

        let arg = json!({ "id": "s1" });
        let tags = ep.tags(&ctx(&arg, &Value::Null));
        assert_eq!(
            tags,
            vec![
                Tag::id(ResourceType::CarouselSlide, "s1"),
                Tag::list(ResourceType::CarouselSlide),
            ]
        );
    }

    #[test]
    fn job_list_provides_list_and_entity_tags() {
        let registry = EndpointRegistry::job_board();
        let ep = registry.get(names::GET_JOBS).unwrap();
        let arg = Value::Null;
        let result = json!([{ "id": "j1" }, { "_id": "j2" }]);
        let tags = ep.tags(&ctx(&arg, &result));
        assert_eq!(tags[0], Tag::list(ResourceType::Job));
        assert!(tags.contains(&Tag::id(ResourceType::Job, "j2")));
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn failed_detail_query_is_still_tagged_by_argument() {
        let registry = EndpointRegistry::job_board();
        let ep = registry.get(names::GET_JOB).unwrap();
        let arg = json!({ "id": "j7" });
        let tags = ep.tags(&TagContext {
            arg: &arg,
            result: None,
        });
        assert_eq!(tags, vec![Tag::id(ResourceType::Job, "j7")]);
    }

    #[test]
    fn apply_invalidates_applications_and_the_job() {
        let registry = EndpointRegistry::job_board();
        let ep = registry.get(names::APPLY_TO_JOB).unwrap();
        let arg = json!({ "jobId": "j3", "coverLetter": "Hi" });
        let tags = ep.tags(&ctx(&arg, &json!({ "id": "a1" })));
        assert!(tags.contains(&Tag::list(ResourceType::Application)));
        assert!(tags.contains(&Tag::id(ResourceType::Job, "j3")));
    }

    #[test]
    fn login_invalidates_session_scoped_types() {
        let registry = EndpointRegistry::job_board();
        let ep = registry.get(names::LOGIN).unwrap();
        let tags = ep.tags(&ctx(&Value::Null, &Value::Null));
        assert!(tags.contains(&Tag::resource(ResourceType::User)));
        assert!(tags.contains(&Tag::resource(ResourceType::SavedJob)));
        assert!(tags.iter().all(|t| t.id.is_none()));
        assert!(!tags.iter().any(|t| t.resource == ResourceType::Job));
    }

    #[test]
    fn content_kind_names() {
        assert_eq!("carousel".parse::<ContentKind>().unwrap(), ContentKind::CarouselSlides);
        assert_eq!(
            "salary-guides".parse::<ContentKind>().unwrap(),
            ContentKind::SalaryGuides
        );
        assert_eq!(ContentKind::PressArticles.list_endpoint(), "getPressArticles");
        assert_eq!(ContentKind::Resources.delete_endpoint(), "deleteResource");
        assert_eq!(ProfileKind::College.get_endpoint(), "getCollegeProfile");
    }

    #[test]
    fn create_invalidates_new_entity_and_list() {
        let registry = EndpointRegistry::job_board();
        let ep = registry.get("createSalaryGuide").unwrap();
        let tags = ep.tags(&ctx(&json!({ "title": "2026" }), &json!({ "id": "g1" })));
        assert_eq!(
            tags,
            vec![
                Tag::id(ResourceType::SalaryGuide, "g1"),
                Tag::list(ResourceType::SalaryGuide),
            ]
        );

        // No id in the response: the list alone.
        let tags = ep.tags(&ctx(&json!({ "title": "2026" }), &json!({ "message": "Created" })));
        assert_eq!(tags, vec![Tag::list(ResourceType::SalaryGuide)]);
        assert!(matches!(tags[0].id, Some(TagId::List)));
    }

    #[test]
    fn create_job_reads_wrapped_id() {
        let registry = EndpointRegistry::job_board();
        let ep = registry.get("createJob").unwrap();
        let tags = ep.tags(&ctx(
            &json!({ "title": "Chemistry" }),
            &json!({ "data": { "_id": "j9", "title": "Chemistry" } }),
        ));
        assert!(tags.contains(&Tag::id(ResourceType::Job, "j9")));
        assert!(tags.contains(&Tag::list(ResourceType::Job)));
    }

    #[test]
    fn apply_invalidates_new_application_and_job() {
        let registry = EndpointRegistry::job_board();
        let ep = registry.get("applyToJob").unwrap();
        let tags = ep.tags(&ctx(&json!({ "jobId": "j1" }), &json!({ "_id": "a7" })));
        assert!(tags.contains(&Tag::id(ResourceType::Application, "a7")));
        assert!(tags.contains(&Tag::list(ResourceType::Application)));
        assert!(tags.contains(&Tag::id(ResourceType::Job, "j1")));
    }
}
