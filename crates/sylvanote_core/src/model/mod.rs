//! Genealogical data model: people, events, and typed relationships.
//!
//! # Responsibility
//! - Define the canonical record shapes shared by graph, serialization and
//!   persistence layers.
//! - Convert untyped structured input into typed records with field-level
//!   validation.
//!
//! # Invariants
//! - Every person, event and relationship is identified by a stable UUID.
//! - People and events share one id space.
//! - `tags` is never absent on a constructed record.

pub mod node;
pub mod relationship;
pub mod validate;
