//! In-memory family graph and render topology.
//!
//! # Responsibility
//! - Own people, events and relationships with adjacency indices.
//! - Answer relationship-derived queries (parents, spouses, ancestors...).
//! - Derive the union-grouped topology used by tree rendering.
//!
//! # Invariants
//! - Indices are updated in the same call as the record they describe.
//! - Read queries never fail on dangling references unless the caller asks
//!   for the strict view.

pub mod engine;
pub mod family;
