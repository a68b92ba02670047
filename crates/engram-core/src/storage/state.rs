use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::EntityId;

use super::refs;
use super::store::GitStore;

/// Per-task workflow pointer record at refs/engram/state/<task-id>.
///
/// Holds the assignment and the latest satisfaction verdict per gate,
/// so commit-policy checks can consult "most recent gate run" without
/// re-executing anything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskWorkflowState {
    pub task_id: EntityId,
    pub workflow_id: EntityId,
    pub stage: String,
    /// Position of the gate in its stage -> whether the most recent
    /// execution satisfied the gate's expected result. Keyed by index
    /// rather than command, since two gates may share a command with
    /// different expectations.
    #[serde(default)]
    pub gate_results: BTreeMap<usize, bool>,
    pub updated_at: DateTime<Utc>,
}

impl TaskWorkflowState {
    pub fn new(task_id: EntityId, workflow_id: EntityId, initial_stage: impl Into<String>) -> Self {
        Self {
            task_id,
            workflow_id,
            stage: initial_stage.into(),
            gate_results: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }
}

impl GitStore {
    /// Read the workflow state for a task, if one has been assigned.
    pub fn task_state(&self, task_id: EntityId) -> Result<Option<TaskWorkflowState>, CoreError> {
        Ok(self
            .read_record::<TaskWorkflowState>(&refs::state_ref_name(&task_id))?
            .map(|(state, _)| state))
    }

    /// Create the state record for a fresh assignment. Fails with
    /// Contention if the task already has one (assignment races included).
    pub fn assign_task_state(&self, state: &TaskWorkflowState) -> Result<(), CoreError> {
        self.write_record(&refs::state_ref_name(&state.task_id), state, None)?;
        Ok(())
    }

    /// CAS-update the state record for a task.
    pub fn update_task_state<F>(&self, task_id: EntityId, mutate: F) -> Result<TaskWorkflowState, CoreError>
    where
        F: FnMut(&mut TaskWorkflowState) -> Result<(), CoreError>,
    {
        let ref_name = refs::state_ref_name(&task_id);
        if self.read_record::<TaskWorkflowState>(&ref_name)?.is_none() {
            return Err(CoreError::NotFound {
                id: format!("workflow state for task {task_id}"),
            });
        }
        let mut mutate = mutate;
        self.update_record(
            &ref_name,
            || unreachable!("existence checked above"),
            |state: &mut TaskWorkflowState| {
                mutate(state)?;
                state.updated_at = Utc::now();
                Ok(())
            },
        )
    }
}
