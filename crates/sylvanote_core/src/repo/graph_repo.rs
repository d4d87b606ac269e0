//! Repository contract and shared error/report types.

use crate::db::DbError;
use crate::model::node::{EntityId, Event, Graph, Node, Person};
use crate::model::relationship::Relationship;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage failure that prevents an operation as a whole.
///
/// Individual unreadable records are not errors; see `SkippedRecord`.
#[derive(Debug)]
pub enum RepoError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Db(DbError),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at `{}`: {source}", path.display()),
            Self::Db(err) => write!(f, "{err}"),
            Self::Yaml(err) => write!(f, "record encoding failed: {err}"),
            Self::Json(err) => write!(f, "relationship encoding failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Yaml(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_yaml::Error> for RepoError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// One stored record that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// File path, `relationships.json[3]`, `people:<id>`...
    pub source: String,
    pub reason: String,
}

impl SkippedRecord {
    /// Builds the record and logs it at warn level.
    pub(crate) fn report(source: impl Into<String>, reason: impl Display) -> Self {
        let record = Self {
            source: source.into(),
            reason: reason.to_string(),
        };
        warn!(
            "event=record_skipped module=repo status=skip source={} reason={}",
            record.source, record.reason
        );
        record
    }
}

/// Result of a full load: everything readable plus what was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedGraph {
    pub graph: Graph,
    pub skipped: Vec<SkippedRecord>,
}

/// Storage contract for people, events and the relationship collection.
pub trait GraphRepository {
    /// Reads every stored record, skipping the unreadable ones.
    fn load_graph(&self) -> RepoResult<LoadedGraph>;
    /// Inserts or replaces one person, dropping any event stored under its id.
    fn save_person(&self, person: &Person) -> RepoResult<()>;
    /// Inserts or replaces one event, dropping any person stored under its id.
    fn save_event(&self, event: &Event) -> RepoResult<()>;
    /// Replaces the whole relationship collection, keeping slice order.
    fn save_relationships(&self, relationships: &[Relationship]) -> RepoResult<()>;
    /// Deletes a person or event; returns whether anything was stored.
    fn delete_node(&self, id: EntityId) -> RepoResult<bool>;

    fn save_node(&self, node: &Node) -> RepoResult<()> {
        match node {
            Node::Person(person) => self.save_person(person),
            Node::Event(event) => self.save_event(event),
        }
    }
}

impl<R: GraphRepository + ?Sized> GraphRepository for &R {
    fn load_graph(&self) -> RepoResult<LoadedGraph> {
        (**self).load_graph()
    }

    fn save_person(&self, person: &Person) -> RepoResult<()> {
        (**self).save_person(person)
    }

    fn save_event(&self, event: &Event) -> RepoResult<()> {
        (**self).save_event(event)
    }

    fn save_relationships(&self, relationships: &[Relationship]) -> RepoResult<()> {
        (**self).save_relationships(relationships)
    }

    fn delete_node(&self, id: EntityId) -> RepoResult<bool> {
        (**self).delete_node(id)
    }
}
