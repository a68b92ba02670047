//! The commit validation pipeline.
//!
//! Checks run in a fixed order and the first failure wins: reference →
//! existence → block status → relationship completeness → stage commit
//! policy. A blocked task short-circuits everything after it, so an
//! agent staring at a rejection always sees the governance state first.

use serde::Serialize;
use tracing::debug;

use engram_core::model::{EntityKind, RelationType};
use engram_core::{CoreError, GitStore};
use engram_workflow::{ChangeSet, WorkflowEngine, WorkflowError};

use crate::error::ValidateError;
use crate::message::extract_task_ref;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    NoTaskReference,
    TaskNotFound,
    TaskBlocked { status: String },
    IncompleteRelationships { missing: String },
    PolicyViolation { detail: String },
    Contention,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NoTaskReference => {
                write!(f, "commit message carries no [<task-uuid>] reference")
            }
            RejectReason::TaskNotFound => write!(f, "referenced task does not exist"),
            RejectReason::TaskBlocked { status } => {
                write!(f, "task is blocked ({status}); resolve governance first")
            }
            RejectReason::IncompleteRelationships { missing } => {
                write!(f, "task is missing required relationships: {missing}")
            }
            RejectReason::PolicyViolation { detail } => write!(f, "{detail}"),
            RejectReason::Contention => {
                write!(f, "store contention while validating; retry the commit")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Accept {
        task_id: String,
    },
    Reject {
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        #[serde(flatten)]
        reason: RejectReason,
    },
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept { .. })
    }

    fn reject(task_id: Option<String>, reason: RejectReason) -> Self {
        Verdict::Reject { task_id, reason }
    }
}

/// Validate a prospective commit against the store.
///
/// Only infrastructure failures surface as `Err`; every disallowed
/// commit is an `Ok(Reject)` with its reason, so hook callers can print
/// and exit non-zero without special-casing.
pub fn validate_commit(
    store: &GitStore,
    message: &str,
    changes: &ChangeSet,
) -> Result<Verdict, ValidateError> {
    let Some(task_id) = extract_task_ref(message) else {
        return Ok(Verdict::reject(None, RejectReason::NoTaskReference));
    };
    let id_str = task_id.to_string();

    let task = match store.get(task_id) {
        Ok(entity) => entity,
        Err(CoreError::NotFound { .. }) => {
            return Ok(Verdict::reject(Some(id_str), RejectReason::TaskNotFound))
        }
        Err(e) => return Err(e.into()),
    };
    if !matches!(task.payload, EntityKind::Task(_)) {
        return Ok(Verdict::reject(Some(id_str), RejectReason::TaskNotFound));
    }

    if task.status.is_blocked() {
        return Ok(Verdict::reject(
            Some(id_str),
            RejectReason::TaskBlocked {
                status: task.status.to_string(),
            },
        ));
    }

    let mut missing = Vec::new();
    if store
        .connected(task_id, Some(RelationType::References))?
        .is_empty()
    {
        missing.push("references");
    }
    if store
        .connected(task_id, Some(RelationType::Documents))?
        .is_empty()
    {
        missing.push("documents");
    }
    if !missing.is_empty() {
        return Ok(Verdict::reject(
            Some(id_str),
            RejectReason::IncompleteRelationships {
                missing: missing.join(", "),
            },
        ));
    }

    let engine = WorkflowEngine::new(store);
    match engine.can_commit(task_id, changes) {
        Ok(()) => {}
        // No workflow means no stage policy to enforce.
        Err(WorkflowError::NotAssigned { .. }) => {}
        Err(WorkflowError::PolicyViolation(detail)) => {
            return Ok(Verdict::reject(
                Some(id_str),
                RejectReason::PolicyViolation { detail },
            ))
        }
        Err(WorkflowError::Core(CoreError::Contention { .. })) => {
            return Ok(Verdict::reject(Some(id_str), RejectReason::Contention))
        }
        Err(e) => return Err(e.into()),
    }

    debug!(task_id = %id_str, "commit accepted");
    Ok(Verdict::Accept { task_id: id_str })
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::model::{
        Context, Entity, EntityId, EntityStatus, Priority, Task, Urgency,
    };
    use git2::Repository;
    use tempfile::TempDir;

    fn harness() -> (TempDir, GitStore) {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let store = GitStore::open(tmp.path(), "test-agent").unwrap();
        store.init().unwrap();
        (tmp, store)
    }

    fn task(store: &GitStore) -> EntityId {
        let entity = Entity::new(
            EntityKind::Task(Task::new("ship feature", "", Priority::High)),
            "test-agent",
        );
        store.create(&entity, false).unwrap()
    }

    fn context(store: &GitStore) -> EntityId {
        let entity = Entity::new(
            EntityKind::Context(Context {
                title: "notes".into(),
                content: "details".into(),
                tags: vec![],
            }),
            "test-agent",
        );
        store.create(&entity, false).unwrap()
    }

    /// Give the task the relationship pair the validator requires.
    fn fully_linked_task(store: &GitStore) -> EntityId {
        let t = task(store);
        let c1 = context(store);
        let c2 = context(store);
        store.link(t, c1, RelationType::References).unwrap();
        store.link(c2, t, RelationType::Documents).unwrap();
        t
    }

    fn msg(id: EntityId) -> String {
        format!("[{id}] implement the thing")
    }

    #[test]
    fn test_accepts_well_formed_commit() {
        let (_tmp, store) = harness();
        let t = fully_linked_task(&store);
        let verdict = validate_commit(&store, &msg(t), &ChangeSet::default()).unwrap();
        assert!(verdict.is_accept());
    }

    #[test]
    fn test_no_reference_and_malformed_reference() {
        let (_tmp, store) = harness();
        for message in ["no brackets here", "[12345] short", "[] empty"] {
            let verdict = validate_commit(&store, message, &ChangeSet::default()).unwrap();
            assert_eq!(
                verdict,
                Verdict::Reject {
                    task_id: None,
                    reason: RejectReason::NoTaskReference
                }
            );
        }
    }

    #[test]
    fn test_unknown_task_rejected() {
        let (_tmp, store) = harness();
        let verdict =
            validate_commit(&store, &msg(EntityId::new()), &ChangeSet::default()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject {
                reason: RejectReason::TaskNotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_non_task_entity_rejected() {
        let (_tmp, store) = harness();
        let c = context(&store);
        let verdict = validate_commit(&store, &msg(c), &ChangeSet::default()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject {
                reason: RejectReason::TaskNotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_blocked_task_short_circuits() {
        let (_tmp, store) = harness();
        // not linked at all: blocking must still win over relationships
        let t = task(&store);
        engram_govern::open_question(&store, "hold on?", t, Urgency::High).unwrap();

        let verdict = validate_commit(&store, &msg(t), &ChangeSet::default()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject {
                reason: RejectReason::TaskBlocked { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_incomplete_relationships_rejected() {
        let (_tmp, store) = harness();
        let t = task(&store);
        let verdict = validate_commit(&store, &msg(t), &ChangeSet::default()).unwrap();
        match verdict {
            Verdict::Reject {
                reason: RejectReason::IncompleteRelationships { missing },
                ..
            } => {
                assert!(missing.contains("references"));
                assert!(missing.contains("documents"));
            }
            other => panic!("expected incomplete-relationships rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_stage_policy_feeds_rejection() {
        let (_tmp, store) = harness();
        let t = fully_linked_task(&store);

        let wf = Entity::new(
            engram_core::model::EntityKind::Workflow(engram_workflow::default_workflow()),
            "test-agent",
        );
        let wf_id = store.create(&wf, false).unwrap();
        let engine = WorkflowEngine::new(&store);
        engine.assign(t, wf_id).unwrap();

        // requirements stage is EngramOnly: any tracked file violates
        let changes = ChangeSet::new(["src/main.rs"]);
        let verdict = validate_commit(&store, &msg(t), &changes).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject {
                reason: RejectReason::PolicyViolation { .. },
                ..
            }
        ));

        // and an empty change set passes
        let verdict = validate_commit(&store, &msg(t), &ChangeSet::default()).unwrap();
        assert!(verdict.is_accept());
    }

    #[test]
    fn test_terminal_task_is_not_blocked() {
        let (_tmp, store) = harness();
        let t = fully_linked_task(&store);
        store.update_status(t, EntityStatus::Completed).unwrap();
        // completed is terminal but not blocked; validation proceeds
        let verdict = validate_commit(&store, &msg(t), &ChangeSet::default()).unwrap();
        assert!(verdict.is_accept());
    }
}
