//! Persistence adapters for the record set.
//!
//! # Responsibility
//! - Define the storage contract used to rebuild and update the graph.
//! - Isolate file-system and SQLite details from the graph and services.
//!
//! # Invariants
//! - A malformed record is skipped and reported, never fatal to a load.
//! - Relationships are persisted as one ordered collection.

pub mod graph_repo;
pub mod sqlite_repo;
pub mod vault_repo;
