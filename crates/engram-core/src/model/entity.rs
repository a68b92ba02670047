use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::execution::ExecutionResult;
use super::governance::{Question, Rfc};
use super::id::EntityId;
use super::notes::{Compliance, Context, Reasoning};
use super::task::Task;
use super::workflow::Workflow;

/// Governance-visible status carried on the entity envelope.
///
/// `Completed` and `Cancelled` are terminal. The blocked variants are
/// terminal with respect to agent-initiated transitions: only the
/// governance restore path (driven from the operator surface) exits them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Active,
    BlockedPendingHumanInput,
    BlockedPendingApproval,
    Completed,
    Cancelled,
}

impl EntityStatus {
    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            EntityStatus::BlockedPendingHumanInput | EntityStatus::BlockedPendingApproval
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EntityStatus::Completed | EntityStatus::Cancelled)
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityStatus::Active => "active",
            EntityStatus::BlockedPendingHumanInput => "blocked_pending_human_input",
            EntityStatus::BlockedPendingApproval => "blocked_pending_approval",
            EntityStatus::Completed => "completed",
            EntityStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Closed union of everything the store can hold. Adding a kind is a
/// compile-visible change everywhere entities are matched on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    Task(Task),
    Context(Context),
    Reasoning(Reasoning),
    Workflow(Workflow),
    ExecutionResult(ExecutionResult),
    Question(Question),
    Rfc(Rfc),
    Compliance(Compliance),
}

impl EntityKind {
    /// Stable name used in ref paths, filters, and relationship records.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EntityKind::Task(_) => "task",
            EntityKind::Context(_) => "context",
            EntityKind::Reasoning(_) => "reasoning",
            EntityKind::Workflow(_) => "workflow",
            EntityKind::ExecutionResult(_) => "execution_result",
            EntityKind::Question(_) => "question",
            EntityKind::Rfc(_) => "rfc",
            EntityKind::Compliance(_) => "compliance",
        }
    }

    /// The task this payload must reference, if the kind carries one.
    /// Used by the store to enforce referential integrity at create time.
    pub fn required_task_ref(&self) -> Option<EntityId> {
        match self {
            EntityKind::Reasoning(r) => Some(r.task_id),
            EntityKind::ExecutionResult(x) => Some(x.task_id),
            _ => None,
        }
    }

    /// Short human-readable label for listings.
    pub fn title(&self) -> &str {
        match self {
            EntityKind::Task(t) => &t.title,
            EntityKind::Context(c) => &c.title,
            EntityKind::Reasoning(r) => &r.title,
            EntityKind::Workflow(w) => &w.name,
            EntityKind::ExecutionResult(x) => &x.command,
            EntityKind::Question(q) => &q.question_text,
            EntityKind::Rfc(r) => &r.title,
            EntityKind::Compliance(c) => &c.standard,
        }
    }
}

/// The stored record: immutable core fields plus the mutable `status`.
/// Entities are never physically deleted, only marked Cancelled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: EntityStatus,
    pub agent: String,
    #[serde(flatten)]
    pub payload: EntityKind,
}

impl Entity {
    pub fn new(payload: EntityKind, agent: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(),
            created_at: now,
            updated_at: now,
            status: EntityStatus::Active,
            agent: agent.into(),
            payload,
        }
    }

    pub fn with_id(id: EntityId, payload: EntityKind, agent: impl Into<String>) -> Self {
        let mut e = Self::new(payload, agent);
        e.id = id;
        e
    }

    pub fn kind_name(&self) -> &'static str {
        self.payload.kind_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Priority, Task};

    #[test]
    fn test_entity_serde_roundtrip() {
        let entity = Entity::new(
            EntityKind::Task(Task::new("Add login", "JWT-based login flow", Priority::High)),
            "agent-7",
        );
        let json = serde_json::to_string_pretty(&entity).unwrap();
        let parsed: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(entity, parsed);
        assert_eq!(parsed.kind_name(), "task");
    }

    #[test]
    fn test_kind_tag_is_flattened() {
        let entity = Entity::new(
            EntityKind::Context(crate::model::notes::Context {
                title: "notes".into(),
                content: "stuff".into(),
                tags: vec![],
            }),
            "aider",
        );
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains("\"kind\":\"context\""));
    }

    #[test]
    fn test_status_predicates() {
        assert!(EntityStatus::BlockedPendingApproval.is_blocked());
        assert!(EntityStatus::BlockedPendingHumanInput.is_blocked());
        assert!(!EntityStatus::Active.is_blocked());
        assert!(EntityStatus::Cancelled.is_terminal());
        assert!(!EntityStatus::BlockedPendingApproval.is_terminal());
    }
}
