//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and the in-memory graph into use-case APIs.
//! - Keep UI layers decoupled from storage details.

pub mod graph_service;
