use sylvanote_core::db::open_db_in_memory;
use sylvanote_core::{
    AttributeValue, Event, GraphRepository, Person, Relationship, RelationshipType,
    SqliteGraphRepository,
};
use uuid::Uuid;

#[test]
fn records_round_trip_through_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::new(&conn);

    let mut person = Person::new("Rosalind", "Franklin");
    person.name.nickname = Some("Ros".to_string());
    person.bio = Some("Crystallographer.".to_string());
    person
        .attributes
        .insert("field".to_string(), AttributeValue::from("chemistry"));
    person.tags = vec!["science".to_string()];
    let mut event = Event::new("Photo 51");
    event.date = Some("1952-05".to_string());
    event.participants = vec![person.id];

    repo.save_person(&person).unwrap();
    repo.save_event(&event).unwrap();

    let loaded = repo.load_graph().unwrap();
    assert!(loaded.skipped.is_empty());
    assert_eq!(loaded.graph.people().next(), Some(&person));
    assert_eq!(loaded.graph.events().next(), Some(&event));
}

#[test]
fn save_person_replaces_existing_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::new(&conn);
    let mut person = Person::new("Lise", "Meitner");
    repo.save_person(&person).unwrap();

    person.death_date = Some("1968-10-27".to_string());
    repo.save_person(&person).unwrap();

    let loaded = repo.load_graph().unwrap();
    let people: Vec<&Person> = loaded.graph.people().collect();
    assert_eq!(people, vec![&person]);
}

#[test]
fn relationships_keep_order_and_are_replaced_wholesale() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::new(&conn);
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let mut married = Relationship::new(b, a, RelationshipType::SpouseOf);
    married.start_date = Some("1901".to_string());
    let edges = vec![
        Relationship::new(a, c, RelationshipType::ParentOf),
        married,
        Relationship::new(b, c, RelationshipType::AdoptedParentOf),
    ];

    repo.save_relationships(&edges).unwrap();
    assert_eq!(repo.load_graph().unwrap().graph.edges, edges);

    repo.save_relationships(&edges[1..]).unwrap();
    assert_eq!(repo.load_graph().unwrap().graph.edges, edges[1..].to_vec());
}

#[test]
fn undecodable_rows_are_skipped() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::new(&conn);
    let good = Person::new("Good", "Row");
    repo.save_person(&good).unwrap();
    conn.execute(
        "INSERT INTO people (id, first_name, last_name) VALUES ('not-a-uuid', 'Bad', 'Row');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO events (id, title, tags) VALUES (?1, 'Broken', '{oops');",
        [Uuid::new_v4().to_string()],
    )
    .unwrap();

    let loaded = repo.load_graph().unwrap();
    assert_eq!(loaded.graph.people().count(), 1);
    assert_eq!(loaded.graph.events().count(), 0);
    assert_eq!(loaded.skipped.len(), 2);
    assert!(loaded
        .skipped
        .iter()
        .any(|record| record.source == "people:not-a-uuid"));
}

#[test]
fn delete_node_reports_whether_a_row_existed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::new(&conn);
    let event = Event::new("Census");
    repo.save_event(&event).unwrap();

    assert!(repo.delete_node(event.id).unwrap());
    assert!(!repo.delete_node(event.id).unwrap());
    assert_eq!(repo.load_graph().unwrap().graph.nodes.len(), 0);
}

#[test]
fn event_row_sharing_a_person_id_is_skipped() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::new(&conn);
    let id = Uuid::new_v4();
    repo.save_person(&Person::with_id(id, "Nils", "Berg")).unwrap();
    conn.execute(
        "INSERT INTO events (id, title) VALUES (?1, 'Stray');",
        [id.to_string()],
    )
    .unwrap();

    let loaded = repo.load_graph().unwrap();
    assert_eq!(loaded.graph.people().count(), 1);
    assert_eq!(loaded.graph.events().count(), 0);
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].source, format!("events:{id}"));
}
