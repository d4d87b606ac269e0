//! SQLite-backed record store.
//!
//! # Responsibility
//! - Persist people, events and relationships in migrated tables.
//! - Decode rows through the same validation rules as record files.
//!
//! # Invariants
//! - Saves are upserts keyed by record id.
//! - One id names at most one record: saving a person deletes an event row
//!   with the same id and vice versa, in the same transaction.
//! - Relationship row order (`seq`) is insertion order.
//! - A row that fails to decode is skipped and reported.

use crate::model::node::{EntityId, Event, Graph, Person};
use crate::model::relationship::Relationship;
use crate::model::validate::{validate_event, validate_person, validate_relationship};
use crate::repo::graph_repo::{GraphRepository, LoadedGraph, RepoResult, SkippedRecord};
use rusqlite::{params, Connection, Row};
use serde_json::{json, Value};

const PERSON_SELECT_SQL: &str = "SELECT
    id, first_name, middle_name, last_name, maiden_name, nickname,
    birth_date, death_date, gender, bio, attributes, tags, created_at, updated_at
FROM people
ORDER BY id ASC;";

const EVENT_SELECT_SQL: &str = "SELECT
    id, title, date, description, location, participants, tags, created_at, updated_at
FROM events
ORDER BY id ASC;";

const RELATIONSHIP_SELECT_SQL: &str = "SELECT
    id, from_id, to_id, type, start_date, end_date, notes
FROM relationships
ORDER BY seq ASC;";

/// Record store over a migrated connection (see `db::open_db`).
pub struct SqliteGraphRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGraphRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_rows(
        &self,
        sql: &str,
        table: &str,
        decode: fn(&Row<'_>) -> rusqlite::Result<Result<Value, String>>,
        mut accept: impl FnMut(Value) -> Result<(), String>,
        skipped: &mut Vec<SkippedRecord>,
    ) -> RepoResult<()> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            let outcome = decode(row)?.and_then(&mut accept);
            if let Err(reason) = outcome {
                skipped.push(SkippedRecord::report(format!("{table}:{id}"), reason));
            }
        }
        Ok(())
    }
}

impl GraphRepository for SqliteGraphRepository<'_> {
    fn load_graph(&self) -> RepoResult<LoadedGraph> {
        let mut graph = Graph::default();
        let mut skipped = Vec::new();

        self.load_rows(
            PERSON_SELECT_SQL,
            "people",
            person_row_value,
            |value| {
                let person = validate_person(&value).map_err(|err| err.to_string())?;
                graph.insert_node(person);
                Ok(())
            },
            &mut skipped,
        )?;
        self.load_rows(
            EVENT_SELECT_SQL,
            "events",
            event_row_value,
            |value| {
                let event = validate_event(&value).map_err(|err| err.to_string())?;
                if graph.nodes.contains_key(&event.id) {
                    return Err(format!("id {} already holds a person", event.id));
                }
                graph.insert_node(event);
                Ok(())
            },
            &mut skipped,
        )?;
        self.load_rows(
            RELATIONSHIP_SELECT_SQL,
            "relationships",
            relationship_row_value,
            |value| {
                let relationship =
                    validate_relationship(&value).map_err(|err| err.to_string())?;
                graph.edges.push(relationship);
                Ok(())
            },
            &mut skipped,
        )?;

        Ok(LoadedGraph { graph, skipped })
    }

    fn save_person(&self, person: &Person) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM events WHERE id = ?1;",
            [person.id.to_string()],
        )?;
        tx.execute(
            "INSERT INTO people (
                id, first_name, middle_name, last_name, maiden_name, nickname,
                birth_date, death_date, gender, bio, attributes, tags, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                middle_name = excluded.middle_name,
                last_name = excluded.last_name,
                maiden_name = excluded.maiden_name,
                nickname = excluded.nickname,
                birth_date = excluded.birth_date,
                death_date = excluded.death_date,
                gender = excluded.gender,
                bio = excluded.bio,
                attributes = excluded.attributes,
                tags = excluded.tags,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at;",
            params![
                person.id.to_string(),
                person.name.first,
                person.name.middle,
                person.name.last,
                person.name.maiden,
                person.name.nickname,
                person.birth_date,
                person.death_date,
                person.gender,
                person.bio,
                serde_json::to_string(&person.attributes)?,
                serde_json::to_string(&person.tags)?,
                person.created_at,
                person.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn save_event(&self, event: &Event) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM people WHERE id = ?1;", [event.id.to_string()])?;
        tx.execute(
            "INSERT INTO events (
                id, title, date, description, location, participants, tags, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                date = excluded.date,
                description = excluded.description,
                location = excluded.location,
                participants = excluded.participants,
                tags = excluded.tags,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at;",
            params![
                event.id.to_string(),
                event.title,
                event.date,
                event.description,
                event.location,
                serde_json::to_string(&event.participants)?,
                serde_json::to_string(&event.tags)?,
                event.created_at,
                event.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn save_relationships(&self, relationships: &[Relationship]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM relationships;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO relationships (id, from_id, to_id, type, start_date, end_date, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            )?;
            for relationship in relationships {
                insert.execute(params![
                    relationship.id.to_string(),
                    relationship.from_id.to_string(),
                    relationship.to_id.to_string(),
                    relationship.kind.as_str(),
                    relationship.start_date,
                    relationship.end_date,
                    relationship.notes,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_node(&self, id: EntityId) -> RepoResult<bool> {
        let id = id.to_string();
        let people = self
            .conn
            .execute("DELETE FROM people WHERE id = ?1;", [&id])?;
        let events = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1;", [&id])?;
        Ok(people + events > 0)
    }
}

fn json_column(row: &Row<'_>, column: &str) -> rusqlite::Result<Result<Value, String>> {
    let text: String = row.get(column)?;
    Ok(serde_json::from_str(&text).map_err(|err| format!("invalid json in {column}: {err}")))
}

fn person_row_value(row: &Row<'_>) -> rusqlite::Result<Result<Value, String>> {
    let attributes = json_column(row, "attributes")?;
    let tags = json_column(row, "tags")?;
    let (attributes, tags) = match (attributes, tags) {
        (Ok(attributes), Ok(tags)) => (attributes, tags),
        (Err(reason), _) | (_, Err(reason)) => return Ok(Err(reason)),
    };

    Ok(Ok(json!({
        "id": row.get::<_, String>("id")?,
        "name": {
            "first": row.get::<_, String>("first_name")?,
            "middle": row.get::<_, Option<String>>("middle_name")?,
            "last": row.get::<_, String>("last_name")?,
            "maiden": row.get::<_, Option<String>>("maiden_name")?,
            "nickname": row.get::<_, Option<String>>("nickname")?,
        },
        "birthDate": row.get::<_, Option<String>>("birth_date")?,
        "deathDate": row.get::<_, Option<String>>("death_date")?,
        "gender": row.get::<_, Option<String>>("gender")?,
        "bio": row.get::<_, Option<String>>("bio")?,
        "attributes": attributes,
        "tags": tags,
        "createdAt": row.get::<_, Option<String>>("created_at")?,
        "updatedAt": row.get::<_, Option<String>>("updated_at")?,
    })))
}

fn event_row_value(row: &Row<'_>) -> rusqlite::Result<Result<Value, String>> {
    let participants = json_column(row, "participants")?;
    let tags = json_column(row, "tags")?;
    let (participants, tags) = match (participants, tags) {
        (Ok(participants), Ok(tags)) => (participants, tags),
        (Err(reason), _) | (_, Err(reason)) => return Ok(Err(reason)),
    };

    Ok(Ok(json!({
        "id": row.get::<_, String>("id")?,
        "title": row.get::<_, String>("title")?,
        "date": row.get::<_, Option<String>>("date")?,
        "description": row.get::<_, Option<String>>("description")?,
        "location": row.get::<_, Option<String>>("location")?,
        "participants": participants,
        "tags": tags,
        "createdAt": row.get::<_, Option<String>>("created_at")?,
        "updatedAt": row.get::<_, Option<String>>("updated_at")?,
    })))
}

fn relationship_row_value(row: &Row<'_>) -> rusqlite::Result<Result<Value, String>> {
    Ok(Ok(json!({
        "id": row.get::<_, String>("id")?,
        "fromId": row.get::<_, String>("from_id")?,
        "toId": row.get::<_, String>("to_id")?,
        "type": row.get::<_, String>("type")?,
        "startDate": row.get::<_, Option<String>>("start_date")?,
        "endDate": row.get::<_, Option<String>>("end_date")?,
        "notes": row.get::<_, Option<String>>("notes")?,
    })))
}
