//! Directed, typed relationship edges between people.
//!
//! # Invariants
//! - For parental kinds `from_id` is the parent and `to_id` the child.
//! - Spousal kinds are stored directed but read symmetrically.
//! - Endpoints are not required to resolve to a loaded entity.

use crate::model::node::EntityId;
use crate::model::validate::{validate_relationship, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one relationship record.
pub type RelationshipId = Uuid;

/// Closed set of relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    ParentOf,
    AdoptedParentOf,
    SpouseOf,
    DivorcedSpouseOf,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 4] = [
        Self::ParentOf,
        Self::AdoptedParentOf,
        Self::SpouseOf,
        Self::DivorcedSpouseOf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParentOf => "PARENT_OF",
            Self::AdoptedParentOf => "ADOPTED_PARENT_OF",
            Self::SpouseOf => "SPOUSE_OF",
            Self::DivorcedSpouseOf => "DIVORCED_SPOUSE_OF",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Biological or adoptive parent -> child edge.
    pub fn is_parental(self) -> bool {
        matches!(self, Self::ParentOf | Self::AdoptedParentOf)
    }
}

/// One relationship record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "serde_json::Value")]
pub struct Relationship {
    pub id: RelationshipId,
    pub from_id: EntityId,
    pub to_id: EntityId,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Relationship {
    /// Creates a relationship with a generated id.
    pub fn new(from_id: EntityId, to_id: EntityId, kind: RelationshipType) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_id,
            to_id,
            kind,
            start_date: None,
            end_date: None,
            notes: None,
        }
    }

    /// Whether `id` is either endpoint.
    pub fn touches(&self, id: EntityId) -> bool {
        self.from_id == id || self.to_id == id
    }
}

impl TryFrom<serde_json::Value> for Relationship {
    type Error = ValidationError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        validate_relationship(&value)
    }
}
