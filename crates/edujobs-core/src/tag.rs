// ── Cache tags ──
//
// A tag labels cached query results with the resources they depend on.
// Mutations name the tags they affect; every cached query carrying a
// matching tag goes stale.

use std::fmt;

use serde::Serialize;

/// Resource families known to the cache.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum ResourceType {
    User,
    Job,
    Application,
    SavedJob,
    Resume,
    TeacherProfile,
    EmployerProfile,
    CollegeProfile,
    AdminProfile,
    SalaryGuide,
    CareerArticle,
    PressArticle,
    CarouselSlide,
    Resource,
}

/// Which slice of a resource family a tag refers to.
///
/// `List` is a variant of its own, so no entity id can ever collide with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TagId {
    /// The collection of this resource type.
    List,
    /// One entity.
    Id(String),
}

/// A `(resource type, id)` label.
///
/// `id: None` is a type-wide tag: it matches every tag of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Tag {
    pub resource: ResourceType,
    pub id: Option<TagId>,
}

impl Tag {
    /// Type-wide tag.
    pub fn resource(resource: ResourceType) -> Self {
        Self { resource, id: None }
    }

    /// The collection tag, `(T, LIST)`.
    pub fn list(resource: ResourceType) -> Self {
        Self {
            resource,
            id: Some(TagId::List),
        }
    }

    /// A single entity, `(T, id)`.
    pub fn id(resource: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource,
            id: Some(TagId::Id(id.into())),
        }
    }

    /// Whether invalidating `self` affects an entry tagged `other` (symmetric).
    ///
    /// Types must be equal. A missing id on either side matches any id.
    pub fn matches(&self, other: &Tag) -> bool {
        if self.resource != other.resource {
            return false;
        }
        match (&self.id, &other.id) {
            (None, _) | (_, None) => true,
            (Some(a), Some(b)) => a == b,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            None => write!(f, "{}", self.resource),
            Some(TagId::List) => write!(f, "{}:LIST", self.resource),
            Some(TagId::Id(id)) => write!(f, "{}:{id}", self.resource),
        }
    }
}

/// Tags a write to one entity must invalidate: the entity and its collection.
pub fn entity_tags(resource: ResourceType, id: impl Into<String>) -> Vec<Tag> {
    vec![Tag::id(resource, id), Tag::list(resource)]
}

/// Whether any tag in `provided` is hit by any tag in `invalidated`.
pub fn intersects(provided: &[Tag], invalidated: &[Tag]) -> bool {
    provided
        .iter()
        .any(|p| invalidated.iter().any(|i| i.matches(p)))
}
