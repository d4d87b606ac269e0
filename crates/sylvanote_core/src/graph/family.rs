//! Union-grouped family topology for tree rendering.
//!
//! # Responsibility
//! - Merge co-parents of the same children into one synthetic union node.
//! - Suppress spouse edges already represented by a union.
//!
//! # Invariants
//! - One union per distinct multi-parent set; sets are compared exactly
//!   ({A,B} and {A,B,C} are different unions).
//! - Single-parent children get a direct parent -> child edge.
//! - Spouse suppression is pair-exact.
//! - Output depends only on the edge set, never on parent ordering.
//!
//! Layout geometry is left to the renderer.

use crate::model::node::{EntityId, Graph, Person};
use crate::model::relationship::RelationshipType;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

const KEY_SEPARATOR: &str = "|";

/// Node of the render topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopologyNode {
    Person {
        id: EntityId,
        label: String,
    },
    Union {
        id: String,
        key: String,
        parents: Vec<EntityId>,
    },
}

impl TopologyNode {
    pub fn node_id(&self) -> String {
        match self {
            Self::Person { id, .. } => id.to_string(),
            Self::Union { id, .. } => id.clone(),
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyEdgeKind {
    /// Single parent straight to child.
    ParentChild,
    /// Co-parent into its union.
    ParentUnion,
    /// Union down to a shared child.
    UnionChild,
    /// Spouses without a union of their own.
    Spouse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: TopologyEdgeKind,
}

impl TopologyEdge {
    fn between(source: String, target: String, kind: TopologyEdgeKind) -> Self {
        Self {
            id: format!("edge-{source}-{target}"),
            source,
            target,
            kind,
        }
    }
}

/// Render-ready family topology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FamilyTopology {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
}

impl FamilyTopology {
    pub fn union_nodes(&self) -> impl Iterator<Item = &TopologyNode> {
        self.nodes.iter().filter(|node| node.is_union())
    }

    pub fn edges_of(&self, kind: TopologyEdgeKind) -> impl Iterator<Item = &TopologyEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }
}

/// Sorted, `|`-joined id list used to compare parent sets exactly.
pub fn canonical_key(ids: impl IntoIterator<Item = EntityId>) -> String {
    let mut parts: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    parts.sort();
    parts.dedup();
    parts.join(KEY_SEPARATOR)
}

/// Synthetic node id of the union for a canonical parent-set key.
pub fn union_id(key: &str) -> String {
    format!("union-{key}")
}

/// Converts a graph snapshot into the union-grouped topology.
///
/// Only people present in `graph` are resolvable; relationship endpoints
/// that are not people in the snapshot are ignored.
pub fn build_family_topology(graph: &Graph) -> FamilyTopology {
    let people: BTreeMap<EntityId, &Person> =
        graph.people().map(|person| (person.id, person)).collect();
    let resolvable = |from: EntityId, to: EntityId| {
        people.contains_key(&from) && people.contains_key(&to)
    };

    let mut topology = FamilyTopology {
        nodes: people
            .values()
            .map(|person| TopologyNode::Person {
                id: person.id,
                label: person.display_name(),
            })
            .collect(),
        edges: Vec::new(),
    };

    let mut parents_by_child: BTreeMap<EntityId, BTreeSet<EntityId>> = BTreeMap::new();
    for rel in &graph.edges {
        if rel.kind.is_parental() && resolvable(rel.from_id, rel.to_id) {
            parents_by_child
                .entry(rel.to_id)
                .or_default()
                .insert(rel.from_id);
        }
    }

    // key -> (sorted parents, children sharing exactly that set)
    let mut unions: BTreeMap<String, (Vec<EntityId>, Vec<EntityId>)> = BTreeMap::new();
    for (child, parents) in parents_by_child {
        let mut sorted: Vec<EntityId> = parents.into_iter().collect();
        sorted.sort_by_key(|id| id.to_string());
        if let [single] = sorted[..] {
            topology.edges.push(TopologyEdge::between(
                single.to_string(),
                child.to_string(),
                TopologyEdgeKind::ParentChild,
            ));
            continue;
        }
        let key = canonical_key(sorted.iter().copied());
        unions
            .entry(key)
            .or_insert_with(|| (sorted, Vec::new()))
            .1
            .push(child);
    }

    for (key, (parents, children)) in &unions {
        let node_id = union_id(key);
        for parent in parents {
            topology.edges.push(TopologyEdge::between(
                parent.to_string(),
                node_id.clone(),
                TopologyEdgeKind::ParentUnion,
            ));
        }
        for child in children {
            topology.edges.push(TopologyEdge::between(
                node_id.clone(),
                child.to_string(),
                TopologyEdgeKind::UnionChild,
            ));
        }
        topology.nodes.push(TopologyNode::Union {
            id: node_id,
            key: key.clone(),
            parents: parents.clone(),
        });
    }

    let union_keys: HashSet<&str> = unions.keys().map(String::as_str).collect();
    for rel in &graph.edges {
        if rel.kind != RelationshipType::SpouseOf || !resolvable(rel.from_id, rel.to_id) {
            continue;
        }
        let pair = canonical_key([rel.from_id, rel.to_id]);
        if union_keys.contains(pair.as_str()) {
            continue;
        }
        topology.edges.push(TopologyEdge {
            id: rel.id.to_string(),
            source: rel.from_id.to_string(),
            target: rel.to_id.to_string(),
            kind: TopologyEdgeKind::Spouse,
        });
    }

    topology
}
