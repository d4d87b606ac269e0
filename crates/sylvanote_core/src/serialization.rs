//! Record text format: a YAML metadata block followed by a narrative body.
//!
//! ```text
//! ---
//! type: person
//! id: 11111111-2222-4333-8444-555555555555
//! name:
//!   first: Ada
//!   last: Lovelace
//! tags: []
//! ---
//! Narrative text (the person's `bio`).
//! ```
//!
//! # Invariants
//! - Metadata holds every field except a non-empty narrative field (`bio`
//!   for people, `description` for events); `type`, `id` and `tags` are
//!   always written.
//! - A present but empty narrative stays in metadata as `""`, so it reads
//!   back as present.
//! - A non-empty body is mapped onto the narrative field before validation;
//!   an empty body leaves the metadata value (or its absence) in place.
//! - `parse_*(serialize_*(record))` yields a record equal to the input.

use crate::model::node::{Event, Node, NodeKind, Person};
use crate::model::validate::{validate_event, validate_person, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DELIMITER: &str = "---";

static METADATA_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\A---[ \t]*\r?\n(?s:(.*?))^---[ \t]*(?:\r?\n|\z)")
        .expect("valid metadata block regex")
});

/// Failure to turn record text into a typed record.
#[derive(Debug)]
pub enum ParseError {
    /// Metadata block is not readable YAML.
    Metadata(serde_yaml::Error),
    /// Metadata block is YAML but not a key/value mapping.
    MetadataNotMapping,
    /// Metadata plus body failed schema validation.
    Validation(ValidationError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metadata(err) => write!(f, "unreadable metadata block: {err}"),
            Self::MetadataNotMapping => write!(f, "metadata block must be a key/value mapping"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Metadata(err) => Some(err),
            Self::MetadataNotMapping => None,
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Metadata(value)
    }
}

impl From<ValidationError> for ParseError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Renders a person as record text with `bio` as the body.
pub fn serialize_person(person: &Person) -> Result<String, serde_yaml::Error> {
    let mut metadata = person.clone();
    let body = take_narrative(&mut metadata.bio);
    render(&Node::Person(metadata), &body)
}

/// Renders an event as record text with `description` as the body.
pub fn serialize_event(event: &Event) -> Result<String, serde_yaml::Error> {
    let mut metadata = event.clone();
    let body = take_narrative(&mut metadata.description);
    render(&Node::Event(metadata), &body)
}

pub fn serialize_node(node: &Node) -> Result<String, serde_yaml::Error> {
    match node {
        Node::Person(person) => serialize_person(person),
        Node::Event(event) => serialize_event(event),
    }
}

/// Parses record text as a person.
pub fn parse_person(text: &str) -> Result<Person, ParseError> {
    let metadata = split_with_narrative(text, "bio")?;
    Ok(validate_person(&metadata)?)
}

/// Parses record text as an event.
pub fn parse_event(text: &str) -> Result<Event, ParseError> {
    let metadata = split_with_narrative(text, "description")?;
    Ok(validate_event(&metadata)?)
}

/// Parses record text expected to hold a node of `kind`.
pub fn parse_node(text: &str, kind: NodeKind) -> Result<Node, ParseError> {
    match kind {
        NodeKind::Person => parse_person(text).map(Node::Person),
        NodeKind::Event => parse_event(text).map(Node::Event),
    }
}

fn render(metadata: &Node, body: &str) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(metadata)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{body}"))
}

fn take_narrative(field: &mut Option<String>) -> String {
    if field.as_deref() == Some("") {
        return String::new();
    }
    field.take().unwrap_or_default()
}

fn split_with_narrative(text: &str, narrative_field: &str) -> Result<Value, ParseError> {
    let (mut metadata, body) = split(text)?;
    if !body.is_empty() {
        metadata.insert(narrative_field.to_string(), Value::String(body.to_string()));
    }
    Ok(Value::Object(metadata))
}

/// Splits text into its metadata mapping and body.
///
/// Text without a metadata block is all body with empty metadata.
fn split(text: &str) -> Result<(Map<String, Value>, &str), ParseError> {
    let Some(captures) = METADATA_BLOCK_RE.captures(text) else {
        return Ok((Map::new(), text));
    };
    let block_end = captures.get(0).map_or(0, |block| block.end());
    let yaml = captures.get(1).map_or("", |yaml| yaml.as_str());
    let body = &text[block_end..];

    if yaml.trim().is_empty() {
        return Ok((Map::new(), body));
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Object(metadata) => Ok((metadata, body)),
        Value::Null => Ok((Map::new(), body)),
        _ => Err(ParseError::MetadataNotMapping),
    }
}
