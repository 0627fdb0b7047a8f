// ── Endpoint definitions ──
//
// An endpoint is a named request template plus its tag rule: the tags a
// query provides, or the tags a mutation invalidates. Both rules are
// functions of the call argument and (when known) the result.

use std::fmt;
use std::sync::Arc;

use edujobs_api::Method;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::tag::Tag;

/// Whether an endpoint reads (cached) or writes (invalidates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EndpointKind {
    Query,
    Mutation,
}

/// Inputs to a tag rule.
///
/// `result` is `None` for a query whose fetch failed. Mutation rules only
/// ever run with a result: a failed mutation invalidates nothing.
#[derive(Debug, Clone, Copy)]
pub struct TagContext<'a> {
    pub arg: &'a Value,
    pub result: Option<&'a Value>,
}

impl<'a> TagContext<'a> {
    /// String value of a top-level argument field.
    pub fn arg_str(&self, field: &str) -> Option<String> {
        scalar_to_string(self.arg.get(field)?)
    }

    /// Id of the returned entity (`id` or `_id`), bare or under `data`.
    pub fn result_id(&self) -> Option<String> {
        let result = self.result?;
        entity_id(result).or_else(|| result.get("data").and_then(entity_id))
    }

    /// Ids of every entity in a list result.
    pub fn result_ids(&self) -> Vec<String> {
        self.result
            .and_then(list_items)
            .map(|items| items.iter().filter_map(entity_id).collect())
            .unwrap_or_default()
    }
}

pub type TagFn = Arc<dyn Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync>;

/// A concrete request produced from an endpoint and its argument.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// A named, parameterized request template with its tag rule.
pub struct Endpoint {
    name: String,
    kind: EndpointKind,
    method: Method,
    path: String,
    tags: TagFn,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Endpoint {
    /// A cached read. `provides` labels the result.
    pub fn query(
        name: impl Into<String>,
        path: impl Into<String>,
        provides: impl Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EndpointKind::Query,
            method: Method::Get,
            path: path.into(),
            tags: Arc::new(provides),
        }
    }

    /// A write. `invalidates` runs only after a successful response.
    pub fn mutation(
        name: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        invalidates: impl Fn(&TagContext<'_>) -> Vec<Tag> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EndpointKind::Mutation,
            method,
            path: path.into(),
            tags: Arc::new(invalidates),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The path template, e.g. `admin/carousel/{id}`.
    pub fn path_template(&self) -> &str {
        &self.path
    }

    /// Provided tags (queries) or invalidated tags (mutations).
    pub fn tags(&self, ctx: &TagContext<'_>) -> Vec<Tag> {
        (self.tags)(ctx)
    }

    /// Fill the path template from `arg`.
    ///
    /// Placeholder fields are consumed; the remaining object fields become
    /// the JSON body for POST/PUT/PATCH or the query string otherwise.
    /// Non-object arguments are sent verbatim as the body of write verbs.
    pub fn build_request(&self, arg: &Value) -> Result<EndpointRequest, CoreError> {
        let mut rest = match arg {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other if self.method.has_body() && !self.path.contains('{') => {
                return Ok(EndpointRequest {
                    method: self.method,
                    path: self.path.clone(),
                    query: Vec::new(),
                    body: Some(other.clone()),
                });
            }
            _ => return Err(self.invalid("argument must be a JSON object")),
        };

        let path = self.render_path(&mut rest)?;

        let (query, body) = if self.method.has_body() {
            let body = (!rest.is_empty()).then(|| Value::Object(rest));
            (Vec::new(), body)
        } else {
            (query_pairs(&rest), None)
        };

        Ok(EndpointRequest {
            method: self.method,
            path,
            query,
            body,
        })
    }

    fn render_path(&self, fields: &mut Map<String, Value>) -> Result<String, CoreError> {
        let mut out = String::with_capacity(self.path.len());
        let mut remaining = self.path.as_str();

        while let Some(start) = remaining.find('{') {
            out.push_str(&remaining[..start]);
            let after = &remaining[start + 1..];
            let Some(end) = after.find('}') else {
                return Err(self.invalid("unterminated placeholder in path template"));
            };
            let field = &after[..end];
            let value = fields
                .remove(field)
                .ok_or_else(|| self.invalid(format!("missing path parameter '{field}'")))?;
            let segment = scalar_to_string(&value)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    self.invalid(format!("path parameter '{field}' must be a string or number"))
                })?;
            if segment.contains(['/', '?', '#']) {
                return Err(self.invalid(format!(
                    "path parameter '{field}' contains a reserved character"
                )));
            }
            if is_dot_segment(&segment) {
                return Err(self.invalid(format!(
                    "path parameter '{field}' is not a valid path segment"
                )));
            }
            out.push_str(&segment);
            remaining = &after[end + 1..];
        }
        out.push_str(remaining);
        Ok(out)
    }

    fn invalid(&self, reason: impl Into<String>) -> CoreError {
        CoreError::InvalidArgument {
            endpoint: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// `.` and `..` (including percent-encoded dots) are collapsed by URL
/// resolution and would address a different resource.
fn is_dot_segment(segment: &str) -> bool {
    let lower = segment.to_ascii_lowercase();
    matches!(
        lower.as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

// ── JSON helpers ─────────────────────────────────────────────────────

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `id` or `_id` of an entity object.
pub fn entity_id(value: &Value) -> Option<String> {
    value
        .get("id")
        .or_else(|| value.get("_id"))
        .and_then(scalar_to_string)
}

/// Items of a list payload: a bare array or `{ "data": [...] }`.
pub fn list_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("data").and_then(Value::as_array),
        _ => None,
    }
}

fn query_pairs(fields: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                pairs.extend(
                    items
                        .iter()
                        .filter_map(scalar_to_string)
                        .map(|v| (key.clone(), v)),
                );
            }
            Value::Object(_) => pairs.push((key.clone(), value.to_string())),
            scalar => {
                if let Some(v) = scalar_to_string(scalar) {
                    pairs.push((key.clone(), v));
                }
            }
        }
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tag::ResourceType;
    use serde_json::json;

    fn delete_slide() -> Endpoint {
        Endpoint::mutation(
            "deleteCarouselSlide",
            Method::Delete,
            "admin/carousel/{id}",
            |ctx| {
                ctx.arg_str("id")
                    .map(|id| crate::tag::entity_tags(ResourceType::CarouselSlide, id))
                    .unwrap_or_default()
            },
        )
    }

    #[test]
    fn path_placeholders_are_filled_and_consumed() {
        let ep = Endpoint::mutation("updateJob", Method::Put, "employer/jobs/{id}", |_| vec![]);
        let req = ep
            .build_request(&json!({ "id": "j1", "title": "Head of Science" }))
            .unwrap();
        assert_eq!(req.path, "employer/jobs/j1");
        assert_eq!(req.body, Some(json!({ "title": "Head of Science" })));
        assert!(req.query.is_empty());
    }

    #[test]
    fn numeric_ids_render_in_paths() {
        let req = delete_slide().build_request(&json!({ "id": 12 })).unwrap();
        assert_eq!(req.path, "admin/carousel/12");
        assert_eq!(req.body, None);
    }

    #[test]
    fn get_leftovers_become_query_string() {
        let ep = Endpoint::query("getJobs", "jobs", |_| vec![]);
        let req = ep
            .build_request(&json!({ "search": "music", "page": 2, "tags": ["k12", "remote"], "x": null }))
            .unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(
            req.query,
            vec![
                ("page".to_owned(), "2".to_owned()),
                ("search".to_owned(), "music".to_owned()),
                ("tags".to_owned(), "k12".to_owned()),
                ("tags".to_owned(), "remote".to_owned()),
            ]
        );
    }

    #[test]
    fn missing_path_parameter_is_rejected() {
        let err = delete_slide().build_request(&json!({})).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { ref reason, .. } if reason.contains("'id'")));
    }

    #[test]
    fn reserved_characters_are_rejected() {
        let err = delete_slide()
            .build_request(&json!({ "id": "../users" }))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));

        for dots in [".", "..", "%2E%2e", ".%2e"] {
            let err = delete_slide().build_request(&json!({ "id": dots })).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidArgument { .. }),
                "{dots:?} accepted as a path segment"
            );
        }

        // Dots inside an id are fine.
        let req = delete_slide().build_request(&json!({ "id": "v1.2" })).unwrap();
        assert_eq!(req.path, "admin/carousel/v1.2");
    }

    #[test]
    fn non_object_body_passes_through_for_writes() {
        let ep = Endpoint::mutation("reorderSlides", Method::Put, "admin/carousel/order", |_| vec![]);
        let req = ep.build_request(&json!(["s2", "s1"])).unwrap();
        assert_eq!(req.body, Some(json!(["s2", "s1"])));
    }

    #[test]
    fn tag_context_reads_ids() {
        let arg = json!({ "jobId": 5 });
        let result = json!({ "data": [{ "_id": "a" }, { "id": "b" }, { "name": "no id" }] });
        let ctx = TagContext {
            arg: &arg,
            result: Some(&result),
        };
        assert_eq!(ctx.arg_str("jobId").as_deref(), Some("5"));
        assert_eq!(ctx.result_ids(), vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(ctx.result_id(), None);
    }

    #[test]
    fn mutation_tags_follow_argument() {
        let arg = json!({ "id": "s1" });
        let tags = delete_slide().tags(&TagContext {
            arg: &arg,
            result: Some(&Value::Null),
        });
        assert_eq!(tags.len(), 2);
    }
}
