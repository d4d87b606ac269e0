use sylvanote_core::{
    build_family_topology, canonical_key, Graph, Person, Relationship, RelationshipType,
    TopologyEdgeKind, TopologyNode,
};
use uuid::Uuid;

fn person(graph: &mut Graph, first: &str) -> Uuid {
    let person = Person::new(first, "Lindqvist");
    let id = person.id;
    graph.insert_node(person);
    id
}

fn relate(graph: &mut Graph, from: Uuid, to: Uuid, kind: RelationshipType) {
    graph.edges.push(Relationship::new(from, to, kind));
}

#[test]
fn seven_children_of_a_couple_share_one_union() {
    let mut graph = Graph::default();
    let mother = person(&mut graph, "Mother");
    let father = person(&mut graph, "Father");
    relate(&mut graph, mother, father, RelationshipType::SpouseOf);
    let children: Vec<Uuid> = (0..7)
        .map(|n| person(&mut graph, &format!("Child{n}")))
        .collect();
    for child in &children {
        relate(&mut graph, mother, *child, RelationshipType::ParentOf);
        relate(&mut graph, father, *child, RelationshipType::ParentOf);
    }

    let topology = build_family_topology(&graph);

    let unions: Vec<&TopologyNode> = topology.union_nodes().collect();
    assert_eq!(unions.len(), 1);
    let expected_key = canonical_key([mother, father]);
    match unions[0] {
        TopologyNode::Union { id, key, parents } => {
            assert_eq!(key, &expected_key);
            assert_eq!(id, &format!("union-{expected_key}"));
            assert_eq!(parents.len(), 2);
        }
        TopologyNode::Person { .. } => panic!("expected union node"),
    }

    assert_eq!(topology.edges_of(TopologyEdgeKind::ParentUnion).count(), 2);
    assert_eq!(topology.edges_of(TopologyEdgeKind::UnionChild).count(), 7);
    assert_eq!(topology.edges_of(TopologyEdgeKind::ParentChild).count(), 0);
    assert_eq!(topology.edges_of(TopologyEdgeKind::Spouse).count(), 0);
    assert_eq!(topology.nodes.len(), 9 + 1);
}

#[test]
fn union_is_independent_of_parent_edge_order() {
    let mut forward = Graph::default();
    let a = person(&mut forward, "A");
    let b = person(&mut forward, "B");
    let c = person(&mut forward, "C");
    let mut reversed = forward.clone();

    relate(&mut forward, a, c, RelationshipType::ParentOf);
    relate(&mut forward, b, c, RelationshipType::ParentOf);
    relate(&mut reversed, b, c, RelationshipType::ParentOf);
    relate(&mut reversed, a, c, RelationshipType::ParentOf);

    let left = build_family_topology(&forward);
    let right = build_family_topology(&reversed);
    assert_eq!(left.nodes, right.nodes);
    assert_eq!(left.edges, right.edges);
}

#[test]
fn single_parent_child_gets_direct_edge() {
    let mut graph = Graph::default();
    let parent = person(&mut graph, "Solo");
    let child = person(&mut graph, "Kid");
    relate(&mut graph, parent, child, RelationshipType::ParentOf);

    let topology = build_family_topology(&graph);

    assert_eq!(topology.union_nodes().count(), 0);
    let direct: Vec<_> = topology.edges_of(TopologyEdgeKind::ParentChild).collect();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].source, parent.to_string());
    assert_eq!(direct[0].target, child.to_string());
    assert_eq!(direct[0].id, format!("edge-{parent}-{child}"));
}

#[test]
fn childless_spouses_keep_their_spouse_edge() {
    let mut graph = Graph::default();
    let a = person(&mut graph, "A");
    let b = person(&mut graph, "B");
    relate(&mut graph, a, b, RelationshipType::SpouseOf);

    let topology = build_family_topology(&graph);

    assert_eq!(topology.union_nodes().count(), 0);
    assert_eq!(topology.edges_of(TopologyEdgeKind::Spouse).count(), 1);
}

#[test]
fn different_parent_sets_produce_different_unions() {
    let mut graph = Graph::default();
    let a = person(&mut graph, "A");
    let b = person(&mut graph, "B");
    let c = person(&mut graph, "C");
    let first = person(&mut graph, "First");
    let second = person(&mut graph, "Second");
    for parent in [a, b] {
        relate(&mut graph, parent, first, RelationshipType::ParentOf);
    }
    for parent in [a, c] {
        relate(&mut graph, parent, second, RelationshipType::ParentOf);
    }
    // A later marriage without children stays a plain spouse edge.
    relate(&mut graph, a, c, RelationshipType::SpouseOf);
    relate(&mut graph, b, c, RelationshipType::SpouseOf);

    let topology = build_family_topology(&graph);

    assert_eq!(topology.union_nodes().count(), 2);
    assert_eq!(topology.edges_of(TopologyEdgeKind::ParentUnion).count(), 4);
    assert_eq!(topology.edges_of(TopologyEdgeKind::UnionChild).count(), 2);
    let spouse: Vec<_> = topology.edges_of(TopologyEdgeKind::Spouse).collect();
    assert_eq!(spouse.len(), 1);
    assert_eq!(spouse[0].source, b.to_string());
}

#[test]
fn edges_to_missing_people_are_ignored() {
    let mut graph = Graph::default();
    let child = person(&mut graph, "Child");
    let known = person(&mut graph, "Known");
    relate(&mut graph, Uuid::new_v4(), child, RelationshipType::ParentOf);
    relate(&mut graph, known, child, RelationshipType::ParentOf);
    relate(&mut graph, known, Uuid::new_v4(), RelationshipType::SpouseOf);

    let topology = build_family_topology(&graph);

    assert_eq!(topology.union_nodes().count(), 0);
    assert_eq!(topology.edges_of(TopologyEdgeKind::ParentChild).count(), 1);
    assert_eq!(topology.edges_of(TopologyEdgeKind::Spouse).count(), 0);
    assert_eq!(topology.nodes.len(), 2);
}
