//! Directory-backed record vault.
//!
//! Layout under the vault root:
//!
//! ```text
//! people/<id>.md        one person per file
//! events/<id>.md        one event per file
//! relationships.json    ordered relationship collection
//! ```
//!
//! # Invariants
//! - Only `.md` files are considered records; others are ignored.
//! - Missing directories or a missing relationship file load as empty.
//! - Files are read in file-name order so loads are reproducible.
//! - One id names at most one record: saving a person removes an event file
//!   with the same id and vice versa. A duplicate found on load is skipped;
//!   the person file wins.

use crate::model::node::{EntityId, Event, Graph, NodeKind, Person};
use crate::model::relationship::Relationship;
use crate::repo::graph_repo::{GraphRepository, LoadedGraph, RepoError, RepoResult, SkippedRecord};
use crate::serialization::{parse_node, serialize_event, serialize_person};
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const PEOPLE_DIR: &str = "people";
const EVENTS_DIR: &str = "events";
const RELATIONSHIPS_FILE: &str = "relationships.json";
const RECORD_EXTENSION: &str = "md";

/// Record vault rooted at one directory.
#[derive(Debug, Clone)]
pub struct VaultGraphRepository {
    root: PathBuf,
}

impl VaultGraphRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the vault root and record directories if missing.
    pub fn initialize(&self) -> RepoResult<()> {
        for dir in [self.kind_dir(NodeKind::Person), self.kind_dir(NodeKind::Event)] {
            fs::create_dir_all(&dir).map_err(|source| RepoError::Io { path: dir, source })?;
        }
        info!(
            "event=vault_init module=repo status=ok root={}",
            self.root.display()
        );
        Ok(())
    }

    /// Path of the file holding record `id` of `kind`.
    pub fn record_path(&self, kind: NodeKind, id: EntityId) -> PathBuf {
        self.kind_dir(kind)
            .join(format!("{id}.{RECORD_EXTENSION}"))
    }

    fn kind_dir(&self, kind: NodeKind) -> PathBuf {
        match kind {
            NodeKind::Person => self.root.join(PEOPLE_DIR),
            NodeKind::Event => self.root.join(EVENTS_DIR),
        }
    }

    fn relationships_path(&self) -> PathBuf {
        self.root.join(RELATIONSHIPS_FILE)
    }

    fn load_records(&self, kind: NodeKind, graph: &mut Graph, skipped: &mut Vec<SkippedRecord>) {
        let dir = self.kind_dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "event=vault_scan module=repo status=skip kind={} reason=missing_dir",
                    kind.as_str()
                );
                return;
            }
            Err(err) => {
                skipped.push(SkippedRecord::report(dir.display().to_string(), err));
                return;
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(err) => skipped.push(SkippedRecord::report(dir.display().to_string(), err)),
            }
        }
        paths.retain(|path| {
            path.extension()
                .is_some_and(|extension| extension == RECORD_EXTENSION)
        });
        paths.sort();

        for path in paths {
            let source = path.display().to_string();
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    skipped.push(SkippedRecord::report(source, err));
                    continue;
                }
            };
            match parse_node(&text, kind) {
                Ok(node) => match graph.nodes.get(&node.id()) {
                    Some(existing) => skipped.push(SkippedRecord::report(
                        source,
                        format!(
                            "id {} already holds a {}",
                            node.id(),
                            existing.kind().as_str()
                        ),
                    )),
                    None => graph.insert_node(node),
                },
                Err(err) => skipped.push(SkippedRecord::report(source, err)),
            }
        }
    }

    fn load_relationships(&self, graph: &mut Graph, skipped: &mut Vec<SkippedRecord>) {
        let path = self.relationships_path();
        let source = path.display().to_string();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return,
            Err(err) => {
                skipped.push(SkippedRecord::report(source, err));
                return;
            }
        };

        let items = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                skipped.push(SkippedRecord::report(source, "expected a JSON array"));
                return;
            }
            Err(err) => {
                skipped.push(SkippedRecord::report(source, err));
                return;
            }
        };

        for (index, item) in items.into_iter().enumerate() {
            match Relationship::try_from(item) {
                Ok(relationship) => graph.edges.push(relationship),
                Err(err) => skipped.push(SkippedRecord::report(
                    format!("{RELATIONSHIPS_FILE}[{index}]"),
                    err,
                )),
            }
        }
    }

    fn remove_record(&self, kind: NodeKind, id: EntityId) -> RepoResult<bool> {
        let path = self.record_path(kind, id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(RepoError::Io { path, source }),
        }
    }

    fn write(&self, path: PathBuf, contents: String) -> RepoResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| RepoError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, contents).map_err(|source| RepoError::Io { path, source })
    }
}

impl GraphRepository for VaultGraphRepository {
    fn load_graph(&self) -> RepoResult<LoadedGraph> {
        let mut loaded = LoadedGraph::default();
        self.load_records(NodeKind::Person, &mut loaded.graph, &mut loaded.skipped);
        self.load_records(NodeKind::Event, &mut loaded.graph, &mut loaded.skipped);
        self.load_relationships(&mut loaded.graph, &mut loaded.skipped);
        Ok(loaded)
    }

    fn save_person(&self, person: &Person) -> RepoResult<()> {
        let text = serialize_person(person)?;
        self.remove_record(NodeKind::Event, person.id)?;
        self.write(self.record_path(NodeKind::Person, person.id), text)
    }

    fn save_event(&self, event: &Event) -> RepoResult<()> {
        let text = serialize_event(event)?;
        self.remove_record(NodeKind::Person, event.id)?;
        self.write(self.record_path(NodeKind::Event, event.id), text)
    }

    fn save_relationships(&self, relationships: &[Relationship]) -> RepoResult<()> {
        let json = serde_json::to_string_pretty(relationships)?;
        self.write(self.relationships_path(), json)
    }

    fn delete_node(&self, id: EntityId) -> RepoResult<bool> {
        let person = self.remove_record(NodeKind::Person, id)?;
        let event = self.remove_record(NodeKind::Event, id)?;
        Ok(person || event)
    }
}
