//! Person and event records and the graph container that holds them.
//!
//! # Responsibility
//! - Define `Person`, `Event` and the `Node` sum type over both.
//! - Define the `Graph` container exchanged with import/export paths.
//!
//! # Invariants
//! - `id` is stable for the lifetime of a record.
//! - Deserialization always goes through `model::validate`, so a decoded
//!   record satisfies the same rules as a validated one.

use crate::model::relationship::Relationship;
use crate::model::validate::{validate_event, validate_node, validate_person, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable identifier shared by people and events.
pub type EntityId = Uuid;

/// Structured personal name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonName {
    pub first: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle: Option<String>,
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maiden: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl PersonName {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            middle: None,
            last: last.into(),
            maiden: None,
            nickname: None,
        }
    }
}

/// Value of a free-form person attribute ("bubble").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// A person in the record set.
///
/// `bio` is the narrative field: it is persisted as the document body, not
/// as metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "serde_json::Value")]
pub struct Person {
    pub id: EntityId,
    pub name: PersonName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Person {
    /// Creates a person with a generated id and no optional fields.
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), first, last)
    }

    /// Creates a person with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: EntityId, first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            id,
            name: PersonName::new(first, last),
            birth_date: None,
            death_date: None,
            gender: None,
            bio: None,
            attributes: BTreeMap::new(),
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns `first last` for labels and log-free display.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name.first, self.name.last)
    }
}

impl TryFrom<serde_json::Value> for Person {
    type Error = ValidationError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        validate_person(&value)
    }
}

/// A dated life event with participating people.
///
/// `description` is the narrative field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "serde_json::Value")]
pub struct Event {
    pub id: EntityId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Person ids; consumers treat this as a set.
    pub participants: Vec<EntityId>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Event {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    pub fn with_id(id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            date: None,
            description: None,
            location: None,
            participants: Vec::new(),
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns whether `person_id` is listed as a participant.
    pub fn involves(&self, person_id: EntityId) -> bool {
        self.participants.contains(&person_id)
    }
}

impl TryFrom<serde_json::Value> for Event {
    type Error = ValidationError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        validate_event(&value)
    }
}

/// Discriminator for the two node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Person,
    Event,
}

impl NodeKind {
    /// Wire value of the `type` discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Event => "event",
        }
    }
}

/// A graph node: either a person or an event.
///
/// Serialized with an inline `type` discriminator (`person` / `event`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Person(Person),
    Event(Event),
}

impl Node {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Person(person) => person.id,
            Self::Event(event) => event.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Person(_) => NodeKind::Person,
            Self::Event(_) => NodeKind::Event,
        }
    }

    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Self::Person(person) => Some(person),
            Self::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) => Some(event),
            Self::Person(_) => None,
        }
    }
}

impl From<Person> for Node {
    fn from(value: Person) -> Self {
        Self::Person(value)
    }
}

impl From<Event> for Node {
    fn from(value: Event) -> Self {
        Self::Event(value)
    }
}

impl TryFrom<serde_json::Value> for Node {
    type Error = ValidationError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        validate_node(&value)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        validate_node(&value).map_err(serde::de::Error::custom)
    }
}

/// Whole-graph container: nodes keyed by id plus the ordered relationship list.
///
/// This is the shape exchanged between persistence adapters and the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: BTreeMap<EntityId, Node>,
    pub edges: Vec<Relationship>,
}

impl Graph {
    /// Inserts a node keyed by its own id, replacing any previous holder.
    pub fn insert_node(&mut self, node: impl Into<Node>) {
        let node = node.into();
        self.nodes.insert(node.id(), node);
    }

    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.nodes.values().filter_map(Node::as_person)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.nodes.values().filter_map(Node::as_event)
    }
}
