use serde_json::json;
use std::fs;
use sylvanote_core::{
    serialize_event, serialize_person, Event, GraphRepository, NodeKind, Person, Relationship, RelationshipType,
    VaultGraphRepository,
};
use uuid::Uuid;

#[test]
fn missing_vault_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path().join("absent"));

    let loaded = repo.load_graph().unwrap();
    assert!(loaded.graph.nodes.is_empty());
    assert!(loaded.graph.edges.is_empty());
    assert!(loaded.skipped.is_empty());
}

#[test]
fn saved_records_are_laid_out_per_kind() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    repo.initialize().unwrap();
    let person = Person::new("Marie", "Curie");
    let event = Event::new("Nobel Prize");

    repo.save_person(&person).unwrap();
    repo.save_event(&event).unwrap();

    let person_path = dir.path().join("people").join(format!("{}.md", person.id));
    let event_path = dir.path().join("events").join(format!("{}.md", event.id));
    assert_eq!(repo.record_path(NodeKind::Person, person.id), person_path);
    assert!(person_path.is_file());
    assert!(event_path.is_file());

    let loaded = repo.load_graph().unwrap();
    assert_eq!(loaded.graph.nodes.len(), 2);
    assert_eq!(loaded.graph.people().next(), Some(&person));
}

#[test]
fn malformed_files_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    repo.initialize().unwrap();
    let person = Person::new("Pierre", "Curie");
    repo.save_person(&person).unwrap();

    let people = dir.path().join("people");
    fs::write(people.join("broken.md"), "---\nname: [unclosed\n---\n").unwrap();
    fs::write(people.join("nameless.md"), "---\nid: nope\n---\nJust a bio.").unwrap();
    fs::write(people.join("notes.txt"), "not a record").unwrap();

    let loaded = repo.load_graph().unwrap();
    assert_eq!(loaded.graph.people().collect::<Vec<_>>(), vec![&person]);
    assert_eq!(loaded.skipped.len(), 2);
    assert!(loaded
        .skipped
        .iter()
        .all(|record| record.source.ends_with(".md")));
}

#[test]
fn hand_written_record_without_metadata_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    repo.initialize().unwrap();
    fs::write(dir.path().join("events").join("draft.md"), "Only prose here.").unwrap();

    let loaded = repo.load_graph().unwrap();
    assert_eq!(loaded.graph.events().count(), 0);
    assert_eq!(loaded.skipped.len(), 1);
}

#[test]
fn invalid_relationship_entries_are_skipped_individually() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let valid = json!({ "id": Uuid::new_v4(), "fromId": a, "toId": b, "type": "PARENT_OF" });
    let entries = json!([
        valid,
        { "id": Uuid::new_v4(), "fromId": a, "toId": b, "type": "COUSIN_OF" },
        { "fromId": a, "toId": b, "type": "SPOUSE_OF" },
        "garbage"
    ]);
    fs::write(
        dir.path().join("relationships.json"),
        serde_json::to_string(&entries).unwrap(),
    )
    .unwrap();

    let loaded = repo.load_graph().unwrap();
    assert_eq!(loaded.graph.edges.len(), 1);
    assert_eq!(loaded.graph.edges[0].kind, RelationshipType::ParentOf);
    let sources: Vec<&str> = loaded
        .skipped
        .iter()
        .map(|record| record.source.as_str())
        .collect();
    assert_eq!(
        sources,
        vec![
            "relationships.json[1]",
            "relationships.json[2]",
            "relationships.json[3]"
        ]
    );
}

#[test]
fn unreadable_relationship_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    fs::write(dir.path().join("relationships.json"), "{ not json").unwrap();

    let loaded = repo.load_graph().unwrap();
    assert!(loaded.graph.edges.is_empty());
    assert_eq!(loaded.skipped.len(), 1);
}

#[test]
fn relationships_file_is_rewritten_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let edges = vec![
        Relationship::new(a, b, RelationshipType::SpouseOf),
        Relationship::new(a, b, RelationshipType::DivorcedSpouseOf),
    ];

    repo.save_relationships(&edges).unwrap();

    assert_eq!(repo.load_graph().unwrap().graph.edges, edges);
}

#[test]
fn delete_node_removes_the_record_file() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    let person = Person::new("Irene", "Joliot-Curie");
    repo.save_person(&person).unwrap();
    let path = repo.record_path(NodeKind::Person, person.id);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        serialize_person(&person).unwrap()
    );

    assert!(repo.delete_node(person.id).unwrap());
    assert!(!path.exists());
    assert!(!repo.delete_node(person.id).unwrap());
}

#[test]
fn duplicate_id_across_kinds_is_skipped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    repo.initialize().unwrap();
    let id = Uuid::new_v4();
    let person = Person::with_id(id, "Karin", "Holm");
    fs::write(
        repo.record_path(NodeKind::Person, id),
        serialize_person(&person).unwrap(),
    )
    .unwrap();
    let event_path = repo.record_path(NodeKind::Event, id);
    fs::write(
        &event_path,
        serialize_event(&Event::with_id(id, "Confirmation")).unwrap(),
    )
    .unwrap();

    let loaded = repo.load_graph().unwrap();
    assert_eq!(loaded.graph.people().collect::<Vec<_>>(), vec![&person]);
    assert_eq!(loaded.graph.events().count(), 0);
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].source, event_path.display().to_string());
}

#[test]
fn saving_one_kind_removes_the_other_kind_file() {
    let dir = tempfile::tempdir().unwrap();
    let repo = VaultGraphRepository::new(dir.path());
    let id = Uuid::new_v4();

    repo.save_event(&Event::with_id(id, "Confirmation")).unwrap();
    repo.save_person(&Person::with_id(id, "Karin", "Holm")).unwrap();

    assert!(!repo.record_path(NodeKind::Event, id).exists());
    assert!(repo.record_path(NodeKind::Person, id).is_file());
}
