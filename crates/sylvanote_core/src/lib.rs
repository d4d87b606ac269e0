//! Core domain logic for SylvaNote, a genealogical record keeper.
//! This crate is the single source of truth for the data model, the family
//! graph, the record text format, and persistence.

pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod serialization;
pub mod service;

pub use graph::engine::{DanglingReference, GraphEngine, ImmediateFamily, RemovedNode, StrictView};
pub use graph::family::{
    build_family_topology, canonical_key, FamilyTopology, TopologyEdge, TopologyEdgeKind,
    TopologyNode,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::node::{AttributeValue, EntityId, Event, Graph, Node, NodeKind, Person, PersonName};
pub use model::relationship::{Relationship, RelationshipId, RelationshipType};
pub use model::validate::{
    validate_event, validate_node, validate_person, validate_relationship, FieldIssue, IssueKind,
    ValidationError,
};
pub use repo::graph_repo::{GraphRepository, LoadedGraph, RepoError, RepoResult, SkippedRecord};
pub use repo::sqlite_repo::SqliteGraphRepository;
pub use repo::vault_repo::VaultGraphRepository;
pub use serialization::{
    parse_event, parse_node, parse_person, serialize_event, serialize_node, serialize_person,
    ParseError,
};
pub use service::graph_service::GraphService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
