//! RFCs: multi-task approval gates.
//!
//! An RFC blocks the union of its listed tasks, its affected workflow
//! definitions, and their transitive dependents with
//! `BlockedPendingApproval` while it sits under review.
//! Approval and rejection both unwind the blocks; only `Implemented`
//! exists past approval, for audit.

use tracing::info;

use engram_core::model::{
    Entity, EntityId, EntityKind, EntityStatus, RelationType, ReviewState, Rfc,
};
use engram_core::GitStore;

use crate::cascade::GraphSnapshot;
use crate::error::GovernError;
use crate::ledger::{add_blocker, remove_blocker, Blocker, BlockerKind};

/// Open an RFC. Every listed task and workflow must exist; the review
/// starts directly in `UnderReview` since opening *is* the submission.
pub fn open_rfc(
    store: &GitStore,
    title: impl Into<String>,
    affected_workflows: Vec<EntityId>,
    blocked_tasks: Vec<EntityId>,
) -> Result<EntityId, GovernError> {
    for &id in blocked_tasks.iter().chain(&affected_workflows) {
        store.get(id)?;
    }

    let rfc = Entity::new(
        EntityKind::Rfc(Rfc {
            title: title.into(),
            affected_workflows: affected_workflows.clone(),
            blocked_tasks: blocked_tasks.clone(),
            review: ReviewState::UnderReview,
        }),
        store.agent(),
    );
    let rfc_id = store.create(&rfc, false)?;

    let snapshot = GraphSnapshot::capture(store)?;
    let affected =
        snapshot.affected_by_all(blocked_tasks.iter().chain(&affected_workflows).copied());
    for &entity_id in &affected {
        add_blocker(
            store,
            entity_id,
            Blocker {
                id: rfc_id,
                kind: BlockerKind::Rfc,
            },
        )?;
    }
    for &task_id in &blocked_tasks {
        store.link(rfc_id, task_id, RelationType::Blocks)?;
    }

    info!(%rfc_id, blocked = affected.len(), "opened RFC");
    Ok(rfc_id)
}

/// Approve and unwind. Operator surface only.
pub fn approve_rfc(store: &GitStore, rfc_id: EntityId) -> Result<bool, GovernError> {
    transition(store, rfc_id, ReviewState::Approved, true)
}

/// Reject and unwind. Operator surface only.
pub fn reject_rfc(store: &GitStore, rfc_id: EntityId) -> Result<bool, GovernError> {
    transition(store, rfc_id, ReviewState::Rejected, true)
}

/// Record that an approved RFC has been carried out.
pub fn mark_implemented(store: &GitStore, rfc_id: EntityId) -> Result<bool, GovernError> {
    transition(store, rfc_id, ReviewState::Implemented, false)
}

fn transition(
    store: &GitStore,
    rfc_id: EntityId,
    to: ReviewState,
    unwind: bool,
) -> Result<bool, GovernError> {
    let (entity, transitioned) = store.update_entity(rfc_id, |entity| {
        let EntityKind::Rfc(ref mut rfc) = entity.payload else {
            return Err(GovernError::NotAnRfc {
                id: rfc_id.to_string(),
            });
        };
        if rfc.review == to {
            return Ok(false);
        }
        if !rfc.review.can_transition_to(to) {
            return Err(GovernError::InvalidReview {
                id: rfc_id.to_string(),
                from: rfc.review,
                to,
            });
        }
        rfc.review = to;
        if to == ReviewState::Rejected {
            entity.status = EntityStatus::Cancelled;
        } else if to == ReviewState::Implemented {
            entity.status = EntityStatus::Completed;
        }
        Ok(true)
    })?;
    if !transitioned {
        return Ok(false);
    }
    if unwind {
        let EntityKind::Rfc(ref rfc) = entity.payload else {
            return Err(GovernError::NotAnRfc {
                id: rfc_id.to_string(),
            });
        };
        let mut roots = rfc.blocked_tasks.clone();
        roots.extend(rfc.affected_workflows.iter().copied());

        let snapshot = GraphSnapshot::capture(store)?;
        for entity_id in snapshot.affected_by_all(roots) {
            remove_blocker(store, entity_id, rfc_id)?;
        }
    }

    info!(%rfc_id, review = ?to, "RFC review transitioned");
    Ok(true)
}
