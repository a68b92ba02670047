//! Block ledgers.
//!
//! Each blocked entity carries one ledger record at
//! `refs/engram/blocks/<id>` holding the status it had before the first
//! blocker landed and the set of currently open blockers. Blocking and
//! unblocking are reference-counted: the prior status is written exactly
//! once and restored exactly once, when the last blocker is removed.
//! Mixed blockers resolve display precedence in favour of questions,
//! since human input gates approval anyway.

use serde::{Deserialize, Serialize};
use tracing::debug;

use engram_core::model::{EntityId, EntityStatus};
use engram_core::storage::refs;
use engram_core::{CoreError, GitStore};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockerKind {
    Question,
    Rfc,
}

impl BlockerKind {
    pub fn blocked_status(self) -> EntityStatus {
        match self {
            BlockerKind::Question => EntityStatus::BlockedPendingHumanInput,
            BlockerKind::Rfc => EntityStatus::BlockedPendingApproval,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blocker {
    pub id: EntityId,
    pub kind: BlockerKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockLedger {
    pub entity_id: EntityId,
    pub prior_status: EntityStatus,
    pub blockers: Vec<Blocker>,
}

impl BlockLedger {
    /// The status a still-blocked entity should display. Any open
    /// question outranks a pending RFC.
    pub fn blocked_status(&self) -> Option<EntityStatus> {
        if self.blockers.is_empty() {
            return None;
        }
        if self
            .blockers
            .iter()
            .any(|b| b.kind == BlockerKind::Question)
        {
            Some(EntityStatus::BlockedPendingHumanInput)
        } else {
            Some(EntityStatus::BlockedPendingApproval)
        }
    }
}

/// Read an entity's ledger, if any blocker is open against it.
pub fn read_ledger(
    store: &GitStore,
    entity_id: EntityId,
) -> Result<Option<BlockLedger>, CoreError> {
    Ok(store
        .read_record::<BlockLedger>(&refs::block_ref_name(&entity_id))?
        .map(|(ledger, _)| ledger))
}

/// Add a blocker to an entity's ledger and apply the blocked status.
///
/// Idempotent per blocker id: re-adding an already-recorded blocker only
/// re-applies the status, which makes an interrupted cascade safe to
/// re-run from the start.
pub fn add_blocker(
    store: &GitStore,
    entity_id: EntityId,
    blocker: Blocker,
) -> Result<(), CoreError> {
    let current = store.get(entity_id)?.status;
    if current.is_terminal() {
        // terminal entities have nothing left to block
        debug!(%entity_id, %current, "skipping blocker on terminal entity");
        return Ok(());
    }

    let ledger = store.update_record(
        &refs::block_ref_name(&entity_id),
        || BlockLedger {
            entity_id,
            prior_status: current,
            blockers: Vec::new(),
        },
        |ledger: &mut BlockLedger| {
            if !ledger.blockers.iter().any(|b| b.id == blocker.id) {
                ledger.blockers.push(blocker);
            }
            Ok(())
        },
    )?;

    if let Some(status) = ledger.blocked_status() {
        store.update_status(entity_id, status)?;
        debug!(%entity_id, %status, blockers = ledger.blockers.len(), "applied block");
    }
    Ok(())
}

/// Remove a blocker from an entity's ledger.
///
/// When the last blocker goes, the ledger record is deleted and the
/// recorded prior status restored; otherwise the remaining blockers
/// decide the displayed status. A missing ledger or absent blocker id is
/// a no-op, so resolution is idempotent.
pub fn remove_blocker(
    store: &GitStore,
    entity_id: EntityId,
    blocker_id: EntityId,
) -> Result<(), CoreError> {
    let ref_name = refs::block_ref_name(&entity_id);
    let Some((mut ledger, token)) = store.read_record::<BlockLedger>(&ref_name)? else {
        return Ok(());
    };
    let before = ledger.blockers.len();
    ledger.blockers.retain(|b| b.id != blocker_id);
    if ledger.blockers.len() == before {
        return Ok(());
    }

    if ledger.blockers.is_empty() {
        store.delete_record(&ref_name)?;
        store.update_status(entity_id, ledger.prior_status)?;
        debug!(%entity_id, restored = %ledger.prior_status, "last blocker removed");
    } else {
        store.write_record(&ref_name, &ledger, Some(&token))?;
        if let Some(status) = ledger.blocked_status() {
            store.update_status(entity_id, status)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::model::{Entity, EntityKind, Priority, Task};
    use git2::Repository;
    use tempfile::TempDir;

    fn harness() -> (TempDir, GitStore, EntityId) {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let store = GitStore::open(tmp.path(), "test-agent").unwrap();
        store.init().unwrap();
        let task = Entity::new(
            EntityKind::Task(Task::new("t", "d", Priority::Medium)),
            "test-agent",
        );
        let id = store.create(&task, false).unwrap();
        (tmp, store, id)
    }

    fn blocker(kind: BlockerKind) -> Blocker {
        Blocker {
            id: EntityId::new(),
            kind,
        }
    }

    #[test]
    fn test_refcount_two_blockers_restore_once() {
        let (_tmp, store, task) = harness();
        let q1 = blocker(BlockerKind::Question);
        let q2 = blocker(BlockerKind::Question);

        add_blocker(&store, task, q1).unwrap();
        add_blocker(&store, task, q2).unwrap();
        assert_eq!(
            store.get(task).unwrap().status,
            EntityStatus::BlockedPendingHumanInput
        );

        remove_blocker(&store, task, q1.id).unwrap();
        // still blocked by q2
        assert_eq!(
            store.get(task).unwrap().status,
            EntityStatus::BlockedPendingHumanInput
        );

        remove_blocker(&store, task, q2.id).unwrap();
        assert_eq!(store.get(task).unwrap().status, EntityStatus::Active);
        assert!(read_ledger(&store, task).unwrap().is_none());
    }

    #[test]
    fn test_question_outranks_rfc_in_mixed_ledger() {
        let (_tmp, store, task) = harness();
        let rfc = blocker(BlockerKind::Rfc);
        let question = blocker(BlockerKind::Question);

        add_blocker(&store, task, rfc).unwrap();
        assert_eq!(
            store.get(task).unwrap().status,
            EntityStatus::BlockedPendingApproval
        );

        add_blocker(&store, task, question).unwrap();
        assert_eq!(
            store.get(task).unwrap().status,
            EntityStatus::BlockedPendingHumanInput
        );

        // dropping the question falls back to the RFC's status
        remove_blocker(&store, task, question.id).unwrap();
        assert_eq!(
            store.get(task).unwrap().status,
            EntityStatus::BlockedPendingApproval
        );
    }

    #[test]
    fn test_add_is_idempotent_per_blocker() {
        let (_tmp, store, task) = harness();
        let q = blocker(BlockerKind::Question);
        add_blocker(&store, task, q).unwrap();
        add_blocker(&store, task, q).unwrap();

        let ledger = read_ledger(&store, task).unwrap().unwrap();
        assert_eq!(ledger.blockers.len(), 1);

        // one removal fully unblocks
        remove_blocker(&store, task, q.id).unwrap();
        assert_eq!(store.get(task).unwrap().status, EntityStatus::Active);
    }

    #[test]
    fn test_remove_unknown_blocker_is_noop() {
        let (_tmp, store, task) = harness();
        remove_blocker(&store, task, EntityId::new()).unwrap();
        assert_eq!(store.get(task).unwrap().status, EntityStatus::Active);
    }

    #[test]
    fn test_terminal_entity_is_not_blocked() {
        let (_tmp, store, task) = harness();
        store
            .update_status(task, EntityStatus::Completed)
            .unwrap();
        add_blocker(&store, task, blocker(BlockerKind::Question)).unwrap();
        assert_eq!(store.get(task).unwrap().status, EntityStatus::Completed);
        assert!(read_ledger(&store, task).unwrap().is_none());
    }
}
