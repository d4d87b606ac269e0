//! Schema validation from untyped structured values into typed records.
//!
//! # Responsibility
//! - Check every field constraint of person, event and relationship input.
//! - Apply defaults (`tags` -> empty, `type` -> expected literal).
//!
//! # Invariants
//! - Validation is pure and reports all violations, not only the first.
//! - `null` is accepted wherever a field is optional and means "absent".
//! - Unknown keys are ignored.

use crate::model::node::{AttributeValue, EntityId, Event, Node, NodeKind, Person, PersonName};
use crate::model::relationship::{Relationship, RelationshipType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
        .expect("valid timestamp regex")
});

/// What is wrong with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Required field is absent or null.
    Missing,
    /// Field is present with the wrong primitive type.
    WrongType { expected: &'static str },
    /// Field is not a canonical hyphenated UUID.
    InvalidId,
    /// Timestamp field is not an ISO-8601 date-time.
    InvalidTimestamp,
    /// `type` discriminator is present with an unexpected value.
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    /// Relationship `type` is outside the closed set.
    UnknownRelationshipType(String),
    /// Input root is not a key/value object.
    NotAnObject,
}

impl Display for IssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "required field is missing"),
            Self::WrongType { expected } => write!(f, "expected {expected}"),
            Self::InvalidId => write!(f, "not a canonical uuid"),
            Self::InvalidTimestamp => write!(f, "not an ISO-8601 date-time"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type must be `{expected}`, found `{found}`")
            }
            Self::UnknownRelationshipType(value) => {
                write!(f, "unknown relationship type `{value}`")
            }
            Self::NotAnObject => write!(f, "expected an object"),
        }
    }
}

/// One violated constraint, addressed by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// e.g. `id`, `name.first`, `participants[2]`; empty for the root.
    pub path: String,
    pub kind: IssueKind,
}

/// Structured validation failure listing every violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    fn single(path: &str, kind: IssueKind) -> Self {
        Self {
            issues: vec![FieldIssue {
                path: path.to_string(),
                kind,
            }],
        }
    }

    /// Returns the first issue reported for `path`.
    pub fn issue_at(&self, path: &str) -> Option<&IssueKind> {
        self.issues
            .iter()
            .find(|issue| issue.path == path)
            .map(|issue| &issue.kind)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed:")?;
        for (index, issue) in self.issues.iter().enumerate() {
            let separator = if index == 0 { " " } else { "; " };
            if issue.path.is_empty() {
                write!(f, "{separator}{}", issue.kind)?;
            } else {
                write!(f, "{separator}{}: {}", issue.path, issue.kind)?;
            }
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Validates an untyped value as a person.
pub fn validate_person(value: &Value) -> Result<Person, ValidationError> {
    let object = as_object(value)?;
    let mut checker = Checker::default();

    checker.discriminator(object, NodeKind::Person);
    let id = checker.required_id(object, "id", "id");
    let name = checker.person_name(object);
    let birth_date = checker.optional_str(object, "birthDate", "birthDate");
    let death_date = checker.optional_str(object, "deathDate", "deathDate");
    let gender = checker.optional_str(object, "gender", "gender");
    let bio = checker.optional_str(object, "bio", "bio");
    let attributes = checker.attributes(object);
    let tags = checker.string_list(object, "tags");
    let created_at = checker.optional_timestamp(object, "createdAt");
    let updated_at = checker.optional_timestamp(object, "updatedAt");

    match (id, name) {
        (Some(id), Some(name)) if checker.is_clean() => Ok(Person {
            id,
            name,
            birth_date,
            death_date,
            gender,
            bio,
            attributes,
            tags,
            created_at,
            updated_at,
        }),
        _ => Err(checker.into_error()),
    }
}

/// Validates an untyped value as an event.
pub fn validate_event(value: &Value) -> Result<Event, ValidationError> {
    let object = as_object(value)?;
    let mut checker = Checker::default();

    checker.discriminator(object, NodeKind::Event);
    let id = checker.required_id(object, "id", "id");
    let title = checker.required_str(object, "title", "title");
    let date = checker.optional_str(object, "date", "date");
    let description = checker.optional_str(object, "description", "description");
    let location = checker.optional_str(object, "location", "location");
    let participants = checker.id_list(object, "participants");
    let tags = checker.string_list(object, "tags");
    let created_at = checker.optional_timestamp(object, "createdAt");
    let updated_at = checker.optional_timestamp(object, "updatedAt");

    match (id, title) {
        (Some(id), Some(title)) if checker.is_clean() => Ok(Event {
            id,
            title,
            date,
            description,
            location,
            participants,
            tags,
            created_at,
            updated_at,
        }),
        _ => Err(checker.into_error()),
    }
}

/// Validates an untyped value as a relationship record.
pub fn validate_relationship(value: &Value) -> Result<Relationship, ValidationError> {
    let object = as_object(value)?;
    let mut checker = Checker::default();

    let id = checker.required_id(object, "id", "id");
    let from_id = checker.required_id(object, "fromId", "fromId");
    let to_id = checker.required_id(object, "toId", "toId");
    let kind = checker.relationship_type(object);
    let start_date = checker.optional_str(object, "startDate", "startDate");
    let end_date = checker.optional_str(object, "endDate", "endDate");
    let notes = checker.optional_str(object, "notes", "notes");

    match (id, from_id, to_id, kind) {
        (Some(id), Some(from_id), Some(to_id), Some(kind)) if checker.is_clean() => {
            Ok(Relationship {
                id,
                from_id,
                to_id,
                kind,
                start_date,
                end_date,
                notes,
            })
        }
        _ => Err(checker.into_error()),
    }
}

/// Validates a node, dispatching on its `type` discriminator.
///
/// Unlike the single-kind validators the discriminator is required here,
/// since nothing else tells a person from an event.
pub fn validate_node(value: &Value) -> Result<Node, ValidationError> {
    let object = as_object(value)?;
    match field(object, "type") {
        None => Err(ValidationError::single("type", IssueKind::Missing)),
        Some(Value::String(tag)) if tag == NodeKind::Person.as_str() => {
            validate_person(value).map(Node::Person)
        }
        Some(Value::String(tag)) if tag == NodeKind::Event.as_str() => {
            validate_event(value).map(Node::Event)
        }
        Some(Value::String(tag)) => Err(ValidationError::single(
            "type",
            IssueKind::TypeMismatch {
                expected: "person|event",
                found: tag.clone(),
            },
        )),
        Some(_) => Err(ValidationError::single(
            "type",
            IssueKind::WrongType { expected: "string" },
        )),
    }
}

/// Returns whether `value` is a UUID in canonical hyphenated form.
pub fn is_canonical_id(value: &str) -> bool {
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::single("", IssueKind::NotAnObject))
}

fn field<'v>(object: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    object.get(key).filter(|value| !value.is_null())
}

#[derive(Default)]
struct Checker {
    issues: Vec<FieldIssue>,
}

impl Checker {
    fn report(&mut self, path: impl Into<String>, kind: IssueKind) {
        self.issues.push(FieldIssue {
            path: path.into(),
            kind,
        });
    }

    fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn into_error(self) -> ValidationError {
        ValidationError {
            issues: self.issues,
        }
    }

    fn discriminator(&mut self, object: &Map<String, Value>, expected: NodeKind) {
        match field(object, "type") {
            None => {}
            Some(Value::String(tag)) if tag == expected.as_str() => {}
            Some(Value::String(tag)) => self.report(
                "type",
                IssueKind::TypeMismatch {
                    expected: expected.as_str(),
                    found: tag.clone(),
                },
            ),
            Some(_) => self.report("type", IssueKind::WrongType { expected: "string" }),
        }
    }

    fn required_str(&mut self, object: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match field(object, key) {
            None => {
                self.report(path, IssueKind::Missing);
                None
            }
            Some(Value::String(value)) => Some(value.clone()),
            Some(_) => {
                self.report(path, IssueKind::WrongType { expected: "string" });
                None
            }
        }
    }

    fn optional_str(&mut self, object: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match field(object, key) {
            None => None,
            Some(Value::String(value)) => Some(value.clone()),
            Some(_) => {
                self.report(path, IssueKind::WrongType { expected: "string" });
                None
            }
        }
    }

    fn optional_timestamp(&mut self, object: &Map<String, Value>, key: &str) -> Option<String> {
        let value = self.optional_str(object, key, key)?;
        if TIMESTAMP_RE.is_match(&value) {
            Some(value)
        } else {
            self.report(key, IssueKind::InvalidTimestamp);
            None
        }
    }

    fn id_value(&mut self, value: &Value, path: String) -> Option<EntityId> {
        match value {
            Value::String(raw) if is_canonical_id(raw) => Uuid::parse_str(raw).ok(),
            Value::String(_) => {
                self.report(path, IssueKind::InvalidId);
                None
            }
            _ => {
                self.report(path, IssueKind::WrongType { expected: "string" });
                None
            }
        }
    }

    fn required_id(&mut self, object: &Map<String, Value>, key: &str, path: &str) -> Option<EntityId> {
        match field(object, key) {
            None => {
                self.report(path, IssueKind::Missing);
                None
            }
            Some(value) => self.id_value(value, path.to_string()),
        }
    }

    fn id_list(&mut self, object: &Map<String, Value>, key: &str) -> Vec<EntityId> {
        match field(object, key) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| self.id_value(item, format!("{key}[{index}]")))
                .collect(),
            Some(_) => {
                self.report(key, IssueKind::WrongType { expected: "array" });
                Vec::new()
            }
        }
    }

    fn strings(&mut self, items: &[Value], path: &str) -> Vec<String> {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::String(value) => out.push(value.clone()),
                _ => self.report(
                    format!("{path}[{index}]"),
                    IssueKind::WrongType { expected: "string" },
                ),
            }
        }
        out
    }

    fn string_list(&mut self, object: &Map<String, Value>, key: &str) -> Vec<String> {
        match field(object, key) {
            None => Vec::new(),
            Some(Value::Array(items)) => self.strings(items, key),
            Some(_) => {
                self.report(key, IssueKind::WrongType { expected: "array" });
                Vec::new()
            }
        }
    }

    fn person_name(&mut self, object: &Map<String, Value>) -> Option<PersonName> {
        let name = match field(object, "name") {
            None => {
                self.report("name", IssueKind::Missing);
                return None;
            }
            Some(Value::Object(name)) => name,
            Some(_) => {
                self.report("name", IssueKind::WrongType { expected: "object" });
                return None;
            }
        };

        let first = self.required_str(name, "first", "name.first");
        let middle = self.optional_str(name, "middle", "name.middle");
        let last = self.required_str(name, "last", "name.last");
        let maiden = self.optional_str(name, "maiden", "name.maiden");
        let nickname = self.optional_str(name, "nickname", "name.nickname");

        Some(PersonName {
            first: first?,
            middle,
            last: last?,
            maiden,
            nickname,
        })
    }

    fn attributes(&mut self, object: &Map<String, Value>) -> BTreeMap<String, AttributeValue> {
        let entries = match field(object, "attributes") {
            None => return BTreeMap::new(),
            Some(Value::Object(entries)) => entries,
            Some(_) => {
                self.report("attributes", IssueKind::WrongType { expected: "object" });
                return BTreeMap::new();
            }
        };

        let mut attributes = BTreeMap::new();
        for (key, value) in entries {
            let path = format!("attributes.{key}");
            match value {
                Value::String(text) => {
                    attributes.insert(key.clone(), AttributeValue::Text(text.clone()));
                }
                Value::Array(items) => {
                    let list = self.strings(items, &path);
                    attributes.insert(key.clone(), AttributeValue::List(list));
                }
                _ => self.report(
                    path,
                    IssueKind::WrongType {
                        expected: "string or string array",
                    },
                ),
            }
        }
        attributes
    }

    fn relationship_type(&mut self, object: &Map<String, Value>) -> Option<RelationshipType> {
        let raw = self.required_str(object, "type", "type")?;
        let kind = RelationshipType::parse(&raw);
        if kind.is_none() {
            self.report("type", IssueKind::UnknownRelationshipType(raw));
        }
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::{
        is_canonical_id, validate_event, validate_node, validate_person, validate_relationship,
        IssueKind,
    };
    use crate::model::node::{AttributeValue, Node};
    use crate::model::relationship::RelationshipType;
    use serde_json::json;

    const PERSON_ID: &str = "11111111-2222-4333-8444-555555555555";
    const OTHER_ID: &str = "66666666-7777-4888-9999-000000000000";

    #[test]
    fn person_defaults_tags_and_type() {
        let person = validate_person(&json!({
            "id": PERSON_ID,
            "name": { "first": "Ada", "last": "Lovelace" }
        }))
        .unwrap();

        assert!(person.tags.is_empty());
        assert!(person.attributes.is_empty());
        assert_eq!(person.name.first, "Ada");
        assert_eq!(person.bio, None);
    }

    #[test]
    fn person_collects_every_violation() {
        let err = validate_person(&json!({
            "type": "event",
            "id": "not-a-uuid",
            "name": { "first": 7 },
            "tags": ["ok", 3],
            "createdAt": "yesterday"
        }))
        .unwrap_err();

        assert_eq!(
            err.issue_at("type"),
            Some(&IssueKind::TypeMismatch {
                expected: "person",
                found: "event".to_string()
            })
        );
        assert_eq!(err.issue_at("id"), Some(&IssueKind::InvalidId));
        assert_eq!(
            err.issue_at("name.first"),
            Some(&IssueKind::WrongType { expected: "string" })
        );
        assert_eq!(err.issue_at("name.last"), Some(&IssueKind::Missing));
        assert_eq!(
            err.issue_at("tags[1]"),
            Some(&IssueKind::WrongType { expected: "string" })
        );
        assert_eq!(err.issue_at("createdAt"), Some(&IssueKind::InvalidTimestamp));
        assert_eq!(err.issues.len(), 6);
    }

    #[test]
    fn person_accepts_text_and_list_attributes() {
        let person = validate_person(&json!({
            "id": PERSON_ID,
            "name": { "first": "Ada", "last": "Lovelace", "maiden": null },
            "attributes": { "occupation": "mathematician", "languages": ["en", "fr"] },
            "createdAt": "2024-01-02T03:04:05.678Z"
        }))
        .unwrap();

        assert_eq!(
            person.attributes.get("occupation"),
            Some(&AttributeValue::Text("mathematician".to_string()))
        );
        assert_eq!(
            person.attributes.get("languages"),
            Some(&AttributeValue::List(vec!["en".to_string(), "fr".to_string()]))
        );
        assert_eq!(person.name.maiden, None);
    }

    #[test]
    fn event_requires_title_and_canonical_participants() {
        let err = validate_event(&json!({
            "id": PERSON_ID,
            "participants": [OTHER_ID, "{66666666-7777-4888-9999-000000000000}"]
        }))
        .unwrap_err();

        assert_eq!(err.issue_at("title"), Some(&IssueKind::Missing));
        assert_eq!(err.issue_at("participants[1]"), Some(&IssueKind::InvalidId));
    }

    #[test]
    fn relationship_rejects_unknown_kind() {
        let err = validate_relationship(&json!({
            "id": PERSON_ID,
            "fromId": PERSON_ID,
            "toId": OTHER_ID,
            "type": "COUSIN_OF"
        }))
        .unwrap_err();
        assert_eq!(
            err.issue_at("type"),
            Some(&IssueKind::UnknownRelationshipType("COUSIN_OF".to_string()))
        );

        let ok = validate_relationship(&json!({
            "id": PERSON_ID,
            "fromId": PERSON_ID,
            "toId": OTHER_ID,
            "type": "ADOPTED_PARENT_OF",
            "notes": "foster family"
        }))
        .unwrap();
        assert_eq!(ok.kind, RelationshipType::AdoptedParentOf);
        assert_eq!(ok.notes.as_deref(), Some("foster family"));
    }

    #[test]
    fn node_dispatches_on_discriminator() {
        let node = validate_node(&json!({
            "type": "event",
            "id": PERSON_ID,
            "title": "Wedding"
        }))
        .unwrap();
        assert!(matches!(node, Node::Event(_)));

        let err = validate_node(&json!({ "id": PERSON_ID })).unwrap_err();
        assert_eq!(err.issue_at("type"), Some(&IssueKind::Missing));
    }

    #[test]
    fn non_object_input_is_reported_at_root() {
        let err = validate_person(&json!(["not", "a", "record"])).unwrap_err();
        assert_eq!(err.issue_at(""), Some(&IssueKind::NotAnObject));
    }

    #[test]
    fn canonical_id_requires_hyphenated_form() {
        assert!(is_canonical_id(PERSON_ID));
        assert!(!is_canonical_id("11111111222243338444555555555555"));
        assert!(!is_canonical_id("urn:uuid:11111111-2222-4333-8444-555555555555"));
    }
}
