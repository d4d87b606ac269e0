//! Graph use-case service.
//!
//! # Responsibility
//! - Rebuild the in-memory graph from a repository at startup.
//! - Provide write-through mutations that keep storage and graph aligned.
//!
//! # Invariants
//! - Storage is written before the in-memory graph changes, so a failed
//!   write leaves the graph untouched.
//! - Relationship writes always persist the full ordered collection.
//! - Node removal persists the reduced relationship collection before
//!   deleting the record, so a failed delete leaves an unlinked record in
//!   storage, never relationships pointing at a deleted one.
//! - Narrative text is never logged.

use crate::graph::engine::{GraphEngine, RemovedNode};
use crate::graph::family::{build_family_topology, FamilyTopology};
use crate::model::node::{EntityId, Event, Person};
use crate::model::relationship::{Relationship, RelationshipId};
use crate::repo::graph_repo::{GraphRepository, LoadedGraph, RepoResult, SkippedRecord};
use log::info;
use std::time::Instant;

/// In-memory graph backed by a repository.
pub struct GraphService<R: GraphRepository> {
    repo: R,
    engine: GraphEngine,
    skipped: Vec<SkippedRecord>,
}

impl<R: GraphRepository> GraphService<R> {
    /// Loads every readable record from `repo` into a fresh graph.
    ///
    /// Unreadable records are skipped and available via `skipped()`.
    pub fn load(repo: R) -> RepoResult<Self> {
        let started_at = Instant::now();
        let LoadedGraph { graph, skipped } = repo.load_graph()?;
        let engine = GraphEngine::from_graph(graph);
        info!(
            "event=graph_load module=service status=ok people={} events={} relationships={} skipped={} duration_ms={}",
            engine.person_count(),
            engine.event_count(),
            engine.relationship_count(),
            skipped.len(),
            started_at.elapsed().as_millis()
        );
        Ok(Self {
            repo,
            engine,
            skipped,
        })
    }

    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Records skipped by the initial load.
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// Stores a person (insert or replace) and updates the graph.
    pub fn save_person(&mut self, person: Person) -> RepoResult<()> {
        self.repo.save_person(&person)?;
        info!(
            "event=person_save module=service status=ok id={}",
            person.id
        );
        self.engine.add_person(person);
        Ok(())
    }

    /// Stores an event (insert or replace) and updates the graph.
    pub fn save_event(&mut self, event: Event) -> RepoResult<()> {
        self.repo.save_event(&event)?;
        info!("event=event_save module=service status=ok id={}", event.id);
        self.engine.add_event(event);
        Ok(())
    }

    /// Adds a relationship, replacing any stored record with the same id.
    pub fn add_relationship(&mut self, relationship: Relationship) -> RepoResult<()> {
        let mut edges = self.engine.all_edges();
        match edges.iter_mut().find(|edge| edge.id == relationship.id) {
            Some(existing) => *existing = relationship.clone(),
            None => edges.push(relationship.clone()),
        }
        self.repo.save_relationships(&edges)?;
        info!(
            "event=relationship_add module=service status=ok id={} type={}",
            relationship.id,
            relationship.kind.as_str()
        );
        self.engine.add_relationship(relationship);
        Ok(())
    }

    /// Removes one relationship; `Ok(None)` when the id is unknown.
    pub fn remove_relationship(&mut self, id: RelationshipId) -> RepoResult<Option<Relationship>> {
        if self.engine.relationship(id).is_none() {
            return Ok(None);
        }
        let remaining: Vec<Relationship> = self
            .engine
            .all_edges()
            .into_iter()
            .filter(|edge| edge.id != id)
            .collect();
        self.repo.save_relationships(&remaining)?;
        info!("event=relationship_remove module=service status=ok id={id}");
        Ok(self.engine.remove_relationship(id))
    }

    /// Removes a person or event plus every relationship touching it.
    pub fn remove_node(&mut self, id: EntityId) -> RepoResult<Option<RemovedNode>> {
        if self.engine.node(id).is_none() {
            return Ok(None);
        }
        let remaining: Vec<Relationship> = self
            .engine
            .all_edges()
            .into_iter()
            .filter(|edge| !edge.touches(id))
            .collect();
        self.repo.save_relationships(&remaining)?;
        self.repo.delete_node(id)?;
        let removed = self.engine.remove_node(id);
        info!(
            "event=node_remove module=service status=ok id={} relationships_removed={}",
            id,
            removed
                .as_ref()
                .map_or(0, |removed| removed.relationships.len())
        );
        Ok(removed)
    }

    /// Union-grouped topology of the current graph.
    pub fn family_topology(&self) -> FamilyTopology {
        build_family_topology(&self.engine.snapshot())
    }

    /// Writes every node and the relationship collection into `target`.
    ///
    /// Returns the number of nodes written.
    pub fn export_to<T: GraphRepository>(&self, target: &T) -> RepoResult<usize> {
        let nodes = self.engine.all_nodes();
        for node in &nodes {
            target.save_node(node)?;
        }
        let edges = self.engine.all_edges();
        target.save_relationships(&edges)?;
        info!(
            "event=graph_export module=service status=ok nodes={} relationships={}",
            nodes.len(),
            edges.len()
        );
        Ok(nodes.len())
    }
}
