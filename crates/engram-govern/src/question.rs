//! Hard-blocking questions.
//!
//! Opening a question freezes its target and every transitive dependent
//! until a human answers or cancels it. Agents can open questions; only
//! the operator surface resolves them.

use tracing::info;

use engram_core::model::{
    Entity, EntityId, EntityKind, Question, QuestionState, RelationType, Urgency,
};
use engram_core::GitStore;

use crate::cascade::GraphSnapshot;
use crate::error::GovernError;
use crate::ledger::{add_blocker, remove_blocker, Blocker, BlockerKind};

/// Raise a question against an entity, blocking it and its dependents.
/// A missing target is fatal; a question must block something real.
pub fn open_question(
    store: &GitStore,
    text: impl Into<String>,
    blocking_entity_id: EntityId,
    urgency: Urgency,
) -> Result<EntityId, GovernError> {
    store.get(blocking_entity_id)?;

    let question = Entity::new(
        EntityKind::Question(Question {
            question_text: text.into(),
            urgency,
            blocking_entity_id,
            state: QuestionState::Pending,
            answer: None,
        }),
        store.agent(),
    );
    let question_id = store.create(&question, false)?;

    let snapshot = GraphSnapshot::capture(store)?;
    let affected = snapshot.affected(blocking_entity_id);
    for &entity_id in &affected {
        add_blocker(
            store,
            entity_id,
            Blocker {
                id: question_id,
                kind: BlockerKind::Question,
            },
        )?;
    }
    store.link(question_id, blocking_entity_id, RelationType::Blocks)?;

    info!(%question_id, target = %blocking_entity_id, blocked = affected.len(),
          "opened blocking question");
    Ok(question_id)
}

/// Record a human answer and unwind the block cascade. Operator surface
/// only. Answering a non-pending question is a no-op and reports `false`.
pub fn answer_question(
    store: &GitStore,
    question_id: EntityId,
    answer: impl Into<String>,
) -> Result<bool, GovernError> {
    resolve(store, question_id, QuestionState::Answered, Some(answer.into()))
}

/// Withdraw a question without an answer, unwinding identically.
pub fn cancel_question(store: &GitStore, question_id: EntityId) -> Result<bool, GovernError> {
    resolve(store, question_id, QuestionState::Cancelled, None)
}

fn resolve(
    store: &GitStore,
    question_id: EntityId,
    final_state: QuestionState,
    answer: Option<String>,
) -> Result<bool, GovernError> {
    let (entity, resolved) = store.update_entity(question_id, |entity| {
        let EntityKind::Question(ref mut question) = entity.payload else {
            return Err(GovernError::NotAQuestion {
                id: question_id.to_string(),
            });
        };
        if question.state != QuestionState::Pending {
            return Ok(false);
        }
        question.state = final_state;
        question.answer = answer.clone();
        entity.status = match final_state {
            QuestionState::Answered => engram_core::model::EntityStatus::Completed,
            _ => engram_core::model::EntityStatus::Cancelled,
        };
        Ok(true)
    })?;
    if !resolved {
        return Ok(false);
    }
    let EntityKind::Question(ref question) = entity.payload else {
        return Err(GovernError::NotAQuestion {
            id: question_id.to_string(),
        });
    };
    let target = question.blocking_entity_id;

    // Recompute the cascade at resolution time: dependents added since the
    // question opened were blocked by later upserts and must unwind too.
    let snapshot = GraphSnapshot::capture(store)?;
    for entity_id in snapshot.affected(target) {
        remove_blocker(store, entity_id, question_id)?;
    }

    info!(%question_id, state = ?final_state, "question resolved");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::model::{EntityStatus, Priority, Task};
    use git2::Repository;
    use tempfile::TempDir;

    fn harness() -> (TempDir, GitStore) {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let store = GitStore::open(tmp.path(), "test-agent").unwrap();
        store.init().unwrap();
        (tmp, store)
    }

    fn task(store: &GitStore, title: &str) -> EntityId {
        let entity = Entity::new(
            EntityKind::Task(Task::new(title, "", Priority::Medium)),
            "test-agent",
        );
        store.create(&entity, false).unwrap()
    }

    #[test]
    fn test_question_blocks_target_and_dependents() {
        let (_tmp, store) = harness();
        let t1 = task(&store, "t1");
        let t2 = task(&store, "t2");
        let t3 = task(&store, "t3");
        // t2 depends on t1, t3 depends on t2
        store.link(t2, t1, RelationType::DependsOn).unwrap();
        store.link(t3, t2, RelationType::DependsOn).unwrap();

        let q = open_question(&store, "which auth scheme?", t1, Urgency::High).unwrap();

        for id in [t1, t2, t3] {
            assert_eq!(
                store.get(id).unwrap().status,
                EntityStatus::BlockedPendingHumanInput
            );
        }

        // answering restores the whole chain
        assert!(answer_question(&store, q, "use JWT").unwrap());
        for id in [t1, t2, t3] {
            assert_eq!(store.get(id).unwrap().status, EntityStatus::Active);
        }

        let answered = store.get(q).unwrap();
        let EntityKind::Question(payload) = answered.payload else {
            panic!("not a question");
        };
        assert_eq!(payload.state, QuestionState::Answered);
        assert_eq!(payload.answer.as_deref(), Some("use JWT"));
    }

    #[test]
    fn test_answer_is_idempotent() {
        let (_tmp, store) = harness();
        let t1 = task(&store, "t1");
        let q = open_question(&store, "q?", t1, Urgency::Low).unwrap();

        assert!(answer_question(&store, q, "a").unwrap());
        assert!(!answer_question(&store, q, "different answer").unwrap());
        assert!(!cancel_question(&store, q).unwrap());
        assert_eq!(store.get(t1).unwrap().status, EntityStatus::Active);
    }

    #[test]
    fn test_overlapping_questions_restore_once() {
        let (_tmp, store) = harness();
        let t1 = task(&store, "t1");
        let q1 = open_question(&store, "first?", t1, Urgency::Medium).unwrap();
        let q2 = open_question(&store, "second?", t1, Urgency::Medium).unwrap();

        assert!(answer_question(&store, q1, "a1").unwrap());
        assert_eq!(
            store.get(t1).unwrap().status,
            EntityStatus::BlockedPendingHumanInput
        );

        assert!(answer_question(&store, q2, "a2").unwrap());
        assert_eq!(store.get(t1).unwrap().status, EntityStatus::Active);
    }

    #[test]
    fn test_cancel_unwinds_without_answer() {
        let (_tmp, store) = harness();
        let t1 = task(&store, "t1");
        let q = open_question(&store, "nevermind?", t1, Urgency::Low).unwrap();

        assert!(cancel_question(&store, q).unwrap());
        assert_eq!(store.get(t1).unwrap().status, EntityStatus::Active);

        let cancelled = store.get(q).unwrap();
        assert_eq!(cancelled.status, EntityStatus::Cancelled);
    }

    #[test]
    fn test_missing_target_is_fatal() {
        let (_tmp, store) = harness();
        let result = open_question(&store, "about what?", EntityId::new(), Urgency::High);
        assert!(matches!(
            result,
            Err(GovernError::Core(engram_core::CoreError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_resolving_a_task_is_not_a_question() {
        let (_tmp, store) = harness();
        let t1 = task(&store, "t1");
        assert!(matches!(
            answer_question(&store, t1, "a"),
            Err(GovernError::NotAQuestion { .. })
        ));
    }
}
