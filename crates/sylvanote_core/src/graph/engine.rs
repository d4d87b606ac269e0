//! Graph engine: record storage, adjacency indices and traversal queries.
//!
//! # Responsibility
//! - Upsert people/events and insert relationships with index maintenance.
//! - Resolve family queries leniently (unresolved ids are omitted) or
//!   strictly through `StrictView`.
//!
//! # Invariants
//! - `outgoing[from]` and `incoming[to]` list exactly the ids of stored
//!   relationships with that endpoint.
//! - People and events share one id space; adding one kind under an id
//!   evicts the other kind.
//! - Traversals terminate on cyclic input.

use crate::model::node::{EntityId, Event, Graph, Node, Person};
use crate::model::relationship::{Relationship, RelationshipId, RelationshipType};
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A relationship endpoint that does not resolve to a loaded person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingReference {
    pub relationship_id: RelationshipId,
    pub missing_id: EntityId,
}

impl Display for DanglingReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "relationship {} references unknown person {}",
            self.relationship_id, self.missing_id
        )
    }
}

impl Error for DanglingReference {}

/// Parents, children, spouses and siblings of one person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmediateFamily<'a> {
    pub parents: Vec<&'a Person>,
    pub children: Vec<&'a Person>,
    pub spouses: Vec<&'a Person>,
    pub siblings: Vec<&'a Person>,
}

/// A node removed by `GraphEngine::remove_node`, with the edges pruned along with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedNode {
    pub node: Node,
    pub relationships: Vec<Relationship>,
}

/// Relationship id plus the endpoint reached through it.
#[derive(Debug, Clone, Copy)]
struct Link {
    relationship_id: RelationshipId,
    target: EntityId,
}

type AdjacencyIndex = HashMap<EntityId, Vec<RelationshipId>>;

/// In-memory genealogical graph.
#[derive(Debug, Default)]
pub struct GraphEngine {
    people: HashMap<EntityId, Person>,
    events: HashMap<EntityId, Event>,
    relationships: HashMap<RelationshipId, Relationship>,
    insertion_order: Vec<RelationshipId>,
    outgoing: AdjacencyIndex,
    incoming: AdjacencyIndex,
}

impl GraphEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an engine preloaded with `graph`.
    pub fn from_graph(graph: Graph) -> Self {
        let mut engine = Self::new();
        engine.import_data(graph);
        engine
    }

    // --- Mutations ---

    /// Inserts or replaces a person by id (last write wins).
    pub fn add_person(&mut self, person: Person) {
        self.events.remove(&person.id);
        self.people.insert(person.id, person);
    }

    /// Inserts or replaces an event by id (last write wins).
    pub fn add_event(&mut self, event: Event) {
        self.people.remove(&event.id);
        self.events.insert(event.id, event);
    }

    pub fn add_node(&mut self, node: Node) {
        match node {
            Node::Person(person) => self.add_person(person),
            Node::Event(event) => self.add_event(event),
        }
    }

    /// Inserts a relationship and indexes it under both endpoints.
    ///
    /// Distinct ids with the same endpoints and kind are all kept. Re-adding
    /// an existing id replaces that record in place and re-keys its index
    /// entries.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        let id = relationship.id;
        match self.relationships.remove(&id) {
            Some(previous) => self.unindex(&previous),
            None => self.insertion_order.push(id),
        }
        self.outgoing
            .entry(relationship.from_id)
            .or_default()
            .push(id);
        self.incoming.entry(relationship.to_id).or_default().push(id);
        self.relationships.insert(id, relationship);
    }

    /// Bulk-loads nodes, then relationships, through the single-record paths.
    ///
    /// Not atomic: callers needing all-or-nothing semantics validate first.
    pub fn import_data(&mut self, graph: Graph) {
        let node_count = graph.nodes.len();
        let edge_count = graph.edges.len();
        for node in graph.nodes.into_values() {
            self.add_node(node);
        }
        for relationship in graph.edges {
            self.add_relationship(relationship);
        }
        debug!(
            "event=graph_import module=graph status=ok nodes={} edges={}",
            node_count, edge_count
        );
    }

    /// Removes one relationship and prunes both adjacency indices.
    pub fn remove_relationship(&mut self, id: RelationshipId) -> Option<Relationship> {
        let removed = self.relationships.remove(&id)?;
        self.unindex(&removed);
        self.insertion_order.retain(|existing| *existing != id);
        Some(removed)
    }

    /// Removes a person or event together with every relationship touching it.
    pub fn remove_node(&mut self, id: EntityId) -> Option<RemovedNode> {
        let node = match self.people.remove(&id) {
            Some(person) => Node::Person(person),
            None => Node::Event(self.events.remove(&id)?),
        };

        let mut incident: Vec<RelationshipId> = Vec::new();
        for index in [&self.outgoing, &self.incoming] {
            for rel_id in index.get(&id).into_iter().flatten() {
                if !incident.contains(rel_id) {
                    incident.push(*rel_id);
                }
            }
        }

        let relationships = incident
            .into_iter()
            .filter_map(|rel_id| self.remove_relationship(rel_id))
            .collect();
        Some(RemovedNode {
            node,
            relationships,
        })
    }

    fn unindex(&mut self, relationship: &Relationship) {
        prune(&mut self.outgoing, relationship.from_id, relationship.id);
        prune(&mut self.incoming, relationship.to_id, relationship.id);
    }

    // --- Lookups ---

    pub fn person(&self, id: EntityId) -> Option<&Person> {
        self.people.get(&id)
    }

    pub fn event(&self, id: EntityId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(&id)
    }

    pub fn node(&self, id: EntityId) -> Option<Node> {
        self.person(id)
            .cloned()
            .map(Node::Person)
            .or_else(|| self.event(id).cloned().map(Node::Event))
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    // --- Family queries (lenient) ---

    /// Resolved sources of incoming parental edges on `child_id`.
    pub fn parents(&self, child_id: EntityId) -> Vec<&Person> {
        self.resolve_lenient(self.parent_links(child_id))
    }

    /// Resolved targets of outgoing parental edges from `parent_id`.
    pub fn children(&self, parent_id: EntityId) -> Vec<&Person> {
        self.resolve_lenient(self.child_links(parent_id))
    }

    /// Current spouses, reading `SPOUSE_OF` in both directions.
    pub fn spouses(&self, person_id: EntityId) -> Vec<&Person> {
        self.resolve_lenient(self.partner_links(person_id, RelationshipType::SpouseOf))
    }

    /// Former spouses, reading `DIVORCED_SPOUSE_OF` in both directions.
    pub fn former_spouses(&self, person_id: EntityId) -> Vec<&Person> {
        self.resolve_lenient(self.partner_links(person_id, RelationshipType::DivorcedSpouseOf))
    }

    /// Every child of every parent of `person_id`, excluding `person_id`.
    pub fn siblings(&self, person_id: EntityId) -> Vec<&Person> {
        let mut seen = HashSet::from([person_id]);
        self.parents(person_id)
            .into_iter()
            .flat_map(|parent| self.children(parent.id))
            .filter(|sibling| seen.insert(sibling.id))
            .collect()
    }

    pub fn immediate_family(&self, person_id: EntityId) -> ImmediateFamily<'_> {
        ImmediateFamily {
            parents: self.parents(person_id),
            children: self.children(person_id),
            spouses: self.spouses(person_id),
            siblings: self.siblings(person_id),
        }
    }

    /// Breadth-first ancestors of `person_id`, excluding the person itself.
    pub fn ancestors(&self, person_id: EntityId) -> Vec<&Person> {
        self.breadth_first(person_id, Self::parents)
    }

    /// Breadth-first descendants of `person_id`, excluding the person itself.
    pub fn descendants(&self, person_id: EntityId) -> Vec<&Person> {
        self.breadth_first(person_id, Self::children)
    }

    /// Events listing `person_id` as a participant, ordered by id.
    pub fn events_for(&self, person_id: EntityId) -> Vec<&Event> {
        let mut events: Vec<&Event> = self
            .events
            .values()
            .filter(|event| event.involves(person_id))
            .collect();
        events.sort_by_key(|event| event.id);
        events
    }

    /// Query view that reports dangling references instead of omitting them.
    pub fn strict(&self) -> StrictView<'_> {
        StrictView { engine: self }
    }

    // --- Snapshots ---

    /// All people and events, ordered by id.
    pub fn all_nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .people
            .values()
            .cloned()
            .map(Node::Person)
            .chain(self.events.values().cloned().map(Node::Event))
            .collect();
        nodes.sort_by_key(Node::id);
        nodes
    }

    /// All people, ordered by id.
    pub fn all_people(&self) -> Vec<Person> {
        let mut people: Vec<Person> = self.people.values().cloned().collect();
        people.sort_by_key(|person| person.id);
        people
    }

    /// All relationships in insertion order.
    pub fn all_edges(&self) -> Vec<Relationship> {
        self.insertion_order
            .iter()
            .filter_map(|id| self.relationships.get(id))
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Graph {
        Graph {
            nodes: self
                .all_nodes()
                .into_iter()
                .map(|node| (node.id(), node))
                .collect(),
            edges: self.all_edges(),
        }
    }

    // --- Internals ---

    fn edges_at<'a>(
        &'a self,
        index: &'a AdjacencyIndex,
        id: EntityId,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        index
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|rel_id| self.relationships.get(rel_id))
    }

    fn parent_links(&self, child_id: EntityId) -> Vec<Link> {
        self.edges_at(&self.incoming, child_id)
            .filter(|rel| rel.kind.is_parental())
            .map(|rel| Link {
                relationship_id: rel.id,
                target: rel.from_id,
            })
            .collect()
    }

    fn child_links(&self, parent_id: EntityId) -> Vec<Link> {
        self.edges_at(&self.outgoing, parent_id)
            .filter(|rel| rel.kind.is_parental())
            .map(|rel| Link {
                relationship_id: rel.id,
                target: rel.to_id,
            })
            .collect()
    }

    fn partner_links(&self, person_id: EntityId, kind: RelationshipType) -> Vec<Link> {
        let outgoing = self
            .edges_at(&self.outgoing, person_id)
            .filter(|rel| rel.kind == kind)
            .map(|rel| Link {
                relationship_id: rel.id,
                target: rel.to_id,
            });
        let incoming = self
            .edges_at(&self.incoming, person_id)
            .filter(|rel| rel.kind == kind)
            .map(|rel| Link {
                relationship_id: rel.id,
                target: rel.from_id,
            });
        outgoing.chain(incoming).collect()
    }

    fn resolve_lenient(&self, links: Vec<Link>) -> Vec<&Person> {
        let mut seen = HashSet::new();
        links
            .into_iter()
            .filter(|link| seen.insert(link.target))
            .filter_map(|link| self.people.get(&link.target))
            .collect()
    }

    fn resolve_strict(&self, links: Vec<Link>) -> Result<Vec<&Person>, DanglingReference> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(links.len());
        for link in links {
            if !seen.insert(link.target) {
                continue;
            }
            let person = self.people.get(&link.target).ok_or(DanglingReference {
                relationship_id: link.relationship_id,
                missing_id: link.target,
            })?;
            resolved.push(person);
        }
        Ok(resolved)
    }

    fn breadth_first<'a>(
        &'a self,
        start: EntityId,
        next: fn(&'a Self, EntityId) -> Vec<&'a Person>,
    ) -> Vec<&'a Person> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            // Ids may be queued more than once; the visited check dedups.
            if !visited.insert(current) {
                continue;
            }
            if current != start {
                if let Some(person) = self.people.get(&current) {
                    found.push(person);
                }
            }
            queue.extend(next(self, current).into_iter().map(|person| person.id));
        }

        found
    }
}

fn prune(index: &mut AdjacencyIndex, key: EntityId, relationship_id: RelationshipId) {
    if let Some(ids) = index.get_mut(&key) {
        ids.retain(|id| *id != relationship_id);
        if ids.is_empty() {
            index.remove(&key);
        }
    }
}

/// Family queries that fail on the first unresolved endpoint.
#[derive(Debug, Clone, Copy)]
pub struct StrictView<'a> {
    engine: &'a GraphEngine,
}

impl<'a> StrictView<'a> {
    pub fn parents(&self, child_id: EntityId) -> Result<Vec<&'a Person>, DanglingReference> {
        self.engine
            .resolve_strict(self.engine.parent_links(child_id))
    }

    pub fn children(&self, parent_id: EntityId) -> Result<Vec<&'a Person>, DanglingReference> {
        self.engine
            .resolve_strict(self.engine.child_links(parent_id))
    }

    pub fn spouses(&self, person_id: EntityId) -> Result<Vec<&'a Person>, DanglingReference> {
        self.engine.resolve_strict(
            self.engine
                .partner_links(person_id, RelationshipType::SpouseOf),
        )
    }

    pub fn siblings(&self, person_id: EntityId) -> Result<Vec<&'a Person>, DanglingReference> {
        let mut seen = HashSet::from([person_id]);
        let mut siblings = Vec::new();
        for parent in self.parents(person_id)? {
            for child in self.children(parent.id)? {
                if seen.insert(child.id) {
                    siblings.push(child);
                }
            }
        }
        Ok(siblings)
    }
}
