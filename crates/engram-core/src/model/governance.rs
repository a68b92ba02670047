use serde::{Deserialize, Serialize};

use super::id::EntityId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionState {
    Pending,
    Answered,
    Cancelled,
}

/// A hard-blocking question raised by an agent. Its existence forces the
/// target entity (and all transitive dependents) into
/// `BlockedPendingHumanInput` until a human answers or cancels it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub question_text: String,
    pub urgency: Urgency,
    pub blocking_entity_id: EntityId,
    pub state: QuestionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Draft,
    UnderReview,
    Approved,
    Rejected,
    Implemented,
}

impl ReviewState {
    /// Review transitions are monotonic: Draft → UnderReview →
    /// Approved|Rejected, and Approved → Implemented.
    pub fn can_transition_to(self, next: ReviewState) -> bool {
        use ReviewState::*;
        matches!(
            (self, next),
            (Draft, UnderReview)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (Approved, Implemented)
        )
    }

    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            ReviewState::Approved | ReviewState::Rejected | ReviewState::Implemented
        )
    }
}

/// A request-for-comment blocking the listed tasks (and their dependents)
/// pending human approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rfc {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_workflows: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_tasks: Vec<EntityId>,
    pub review: ReviewState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_transitions_are_monotonic() {
        use ReviewState::*;
        assert!(Draft.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Approved));
        assert!(UnderReview.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Implemented));

        assert!(!Approved.can_transition_to(Draft));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Implemented.can_transition_to(UnderReview));
        assert!(!Draft.can_transition_to(Approved));
    }

    #[test]
    fn test_question_serde_roundtrip() {
        let q = Question {
            question_text: "Which token format do we standardize on?".into(),
            urgency: Urgency::High,
            blocking_entity_id: EntityId::new(),
            state: QuestionState::Pending,
            answer: None,
        };
        let json = serde_json::to_string(&q).unwrap();
        let parsed: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(q, parsed);
    }
}
