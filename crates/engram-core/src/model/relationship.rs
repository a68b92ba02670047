use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::EntityId;

/// Typed edge kinds between entities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    References,
    DependsOn,
    Contains,
    Produces,
    Documents,
    /// Created only by the governance layer (Questions/RFCs), never by a
    /// direct user command.
    Blocks,
    Fulfills,
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelationType::References => "references",
            RelationType::DependsOn => "depends_on",
            RelationType::Contains => "contains",
            RelationType::Produces => "produces",
            RelationType::Documents => "documents",
            RelationType::Blocks => "blocks",
            RelationType::Fulfills => "fulfills",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "references" => Ok(RelationType::References),
            "depends_on" => Ok(RelationType::DependsOn),
            "contains" => Ok(RelationType::Contains),
            "produces" => Ok(RelationType::Produces),
            "documents" => Ok(RelationType::Documents),
            "blocks" => Ok(RelationType::Blocks),
            "fulfills" => Ok(RelationType::Fulfills),
            other => Err(format!("unknown relationship type: {other}")),
        }
    }
}

/// A directed, typed edge. Immutable once created: edits are modeled as
/// delete-then-recreate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub id: EntityId,
    pub source_id: EntityId,
    pub source_kind: String,
    pub target_id: EntityId,
    pub target_kind: String,
    pub rel_type: RelationType,
    pub created_at: DateTime<Utc>,
    pub agent: String,
}

impl Relationship {
    pub fn new(
        source_id: EntityId,
        source_kind: impl Into<String>,
        target_id: EntityId,
        target_kind: impl Into<String>,
        rel_type: RelationType,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            source_id,
            source_kind: source_kind.into(),
            target_id,
            target_kind: target_kind.into(),
            rel_type,
            created_at: Utc::now(),
            agent: agent.into(),
        }
    }

    /// Identity triple used for duplicate suppression.
    pub fn triple(&self) -> (EntityId, EntityId, RelationType) {
        (self.source_id, self.target_id, self.rel_type)
    }
}
