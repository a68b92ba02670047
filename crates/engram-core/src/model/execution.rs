use serde::{Deserialize, Serialize};

use super::id::EntityId;

/// Final outcome of a single gate execution. There is deliberately no
/// `Pending` variant: a record only exists once the run has concluded,
/// and cancelled runs are downgraded to `Skipped`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    Passed,
    Failed { exit_code: i32 },
    TimedOut,
    Skipped { reason: String },
}

impl GateOutcome {
    /// Whether this outcome satisfies the gate's expectation is decided by
    /// the workflow engine; this only says the command itself exited zero.
    pub fn command_succeeded(&self) -> bool {
        matches!(self, GateOutcome::Passed)
    }
}

/// Audit record of one quality-gate execution, persisted regardless of
/// pass/fail and linked to its task with a `Documents` relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub task_id: EntityId,
    pub stage: String,
    pub command: String,
    #[serde(flatten)]
    pub outcome: GateOutcome,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_result_serde_roundtrip() {
        let result = ExecutionResult {
            task_id: EntityId::new(),
            stage: "red".into(),
            command: "cargo test".into(),
            outcome: GateOutcome::Failed { exit_code: 101 },
            stdout: "running 4 tests".into(),
            stderr: String::new(),
            duration_ms: 1840,
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ExecutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, parsed);
    }

    #[test]
    fn test_outcome_tagging() {
        let json = serde_json::to_string(&GateOutcome::Skipped {
            reason: "operator cancelled".into(),
        })
        .unwrap();
        assert!(json.contains("skipped"));
        assert!(json.contains("operator cancelled"));
    }
}
