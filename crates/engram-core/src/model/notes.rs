use serde::{Deserialize, Serialize};

use super::id::EntityId;

/// Free-form contextual note attached to the memory store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Context {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A recorded reasoning chain for a task. Confidence is clamped to [0, 1]
/// at construction; serde accepts whatever was persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reasoning {
    pub title: String,
    pub content: String,
    pub confidence: f64,
    pub task_id: EntityId,
}

impl Reasoning {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        confidence: f64,
        task_id: EntityId,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            task_id,
        }
    }
}

/// Evidence that a piece of work satisfies an external standard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Compliance {
    pub standard: String,
    pub requirement: String,
    pub evidence: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let task_id = EntityId::new();
        let r = Reasoning::new("t", "c", 1.7, task_id);
        assert_eq!(r.confidence, 1.0);
        let r = Reasoning::new("t", "c", -0.3, task_id);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_context_serde_roundtrip() {
        let ctx = Context {
            title: "Auth research".into(),
            content: "Provider comparison notes".into(),
            tags: vec!["auth".into(), "research".into()],
        };
        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: Context = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, parsed);
    }
}
