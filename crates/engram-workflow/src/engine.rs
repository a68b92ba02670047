//! Stage machine driving tasks through a workflow.
//!
//! The engine borrows a `GitStore` and keeps no state of its own; the
//! per-task stage pointer and gate verdicts live in the store's
//! `TaskWorkflowState` record, so any number of engine instances (or
//! processes) see the same picture.

use std::time::Duration;

use engram_core::model::{
    CommitPolicy, Entity, EntityId, EntityKind, ExecutionResult, ExpectedResult, Gate,
    RelationType, Stage, Transition, TransitionTrigger, Workflow,
};
use engram_core::storage::TaskWorkflowState;
use engram_core::GitStore;
use tracing::{debug, info};

use crate::error::WorkflowError;
use crate::gates::{satisfies, CancelToken, GateRun, GateRunner};
use crate::policy::{check_policy, ChangeSet};

/// Snapshot of where a task sits in its workflow.
#[derive(Debug, Clone)]
pub struct WorkflowStatus {
    pub state: TaskWorkflowState,
    pub workflow_name: String,
    pub stage: Stage,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

pub struct WorkflowEngine<'a> {
    store: &'a GitStore,
    runner: GateRunner,
}

impl<'a> WorkflowEngine<'a> {
    pub fn new(store: &'a GitStore) -> Self {
        let timeout = Duration::from_secs(store.settings().gate_timeout_secs);
        Self {
            store,
            runner: GateRunner::new(timeout),
        }
    }

    /// Bind a task to a workflow, positioning it at the initial stage.
    pub fn assign(
        &self,
        task_id: EntityId,
        workflow_id: EntityId,
    ) -> Result<TaskWorkflowState, WorkflowError> {
        let task = self.store.get(task_id)?;
        if !matches!(task.payload, EntityKind::Task(_)) {
            return Err(WorkflowError::NotATask {
                id: task_id.to_string(),
            });
        }
        let workflow = self.load_workflow(workflow_id)?;
        let initial = workflow
            .initial_stage()
            .ok_or_else(|| WorkflowError::UnknownStage {
                workflow: workflow.name.clone(),
                stage: "<initial>".into(),
            })?;

        let state = TaskWorkflowState::new(task_id, workflow_id, &initial.name);
        self.store.assign_task_state(&state)?;
        self.store.link(task_id, workflow_id, RelationType::Fulfills)?;
        info!(%task_id, workflow = %workflow.name, stage = %initial.name, "assigned workflow");
        Ok(state)
    }

    /// Where the task currently sits. Errors if no workflow is assigned.
    pub fn status(&self, task_id: EntityId) -> Result<WorkflowStatus, WorkflowError> {
        let state = self
            .store
            .task_state(task_id)?
            .ok_or_else(|| WorkflowError::NotAssigned {
                task_id: task_id.to_string(),
            })?;
        let workflow = self.load_workflow(state.workflow_id)?;
        let stage = workflow
            .stage(&state.stage)
            .ok_or_else(|| WorkflowError::UnknownStage {
                workflow: workflow.name.clone(),
                stage: state.stage.clone(),
            })?
            .clone();
        Ok(WorkflowStatus {
            state,
            workflow_name: workflow.name,
            stage,
        })
    }

    /// Manually advance the task along one of its stage's transitions.
    ///
    /// With no target, the stage must have exactly one transition. Taking
    /// an `AutoOnGateSuccess` edge by hand still requires the stage's
    /// required gates to be satisfied; a `Manual` edge does not.
    pub fn advance(
        &self,
        task_id: EntityId,
        target: Option<&str>,
    ) -> Result<TaskWorkflowState, WorkflowError> {
        let status = self.status(task_id)?;
        let stage = &status.stage;

        let transition = match target {
            Some(name) => stage
                .transitions
                .iter()
                .find(|t| t.to_stage == name)
                .ok_or_else(|| WorkflowError::NoTransition {
                    stage: stage.name.clone(),
                    detail: format!("no transition to '{name}'"),
                })?,
            None => match stage.transitions.as_slice() {
                [] => {
                    return Err(WorkflowError::NoTransition {
                        stage: stage.name.clone(),
                        detail: "stage is terminal".into(),
                    })
                }
                [only] => only,
                many => {
                    let choices: Vec<_> =
                        many.iter().map(|t| t.to_stage.as_str()).collect();
                    return Err(WorkflowError::NoTransition {
                        stage: stage.name.clone(),
                        detail: format!("ambiguous, specify one of: {}", choices.join(", ")),
                    });
                }
            },
        };

        if transition.trigger == TransitionTrigger::AutoOnGateSuccess
            && !gates_satisfied(stage, &status.state)
        {
            return Err(WorkflowError::NoTransition {
                stage: stage.name.clone(),
                detail: format!(
                    "transition to '{}' needs all required gates satisfied",
                    transition.to_stage
                ),
            });
        }

        self.enter_stage(task_id, &transition.to_stage)
    }

    /// Run every gate of the task's current stage, in declaration order.
    ///
    /// Each run is persisted as an `ExecutionResult` entity linked to the
    /// task, and the satisfaction verdict lands in the state record. When
    /// the batch leaves every required gate satisfied and the stage has an
    /// `AutoOnGateSuccess` transition, the task advances automatically.
    pub fn run_gates(
        &self,
        task_id: EntityId,
        cancel: &CancelToken,
    ) -> Result<Vec<GateRun>, WorkflowError> {
        let status = self.status(task_id)?;
        let stage = &status.stage;
        let mut runs = Vec::with_capacity(stage.quality_gates.len());

        for (gate_index, gate) in stage.quality_gates.iter().enumerate() {
            let run = self.runner.run(gate, cancel)?;
            self.record_run(task_id, &stage.name, gate_index, gate, &run)?;
            runs.push(run);
        }

        let state = self
            .store
            .task_state(task_id)?
            .ok_or_else(|| WorkflowError::NotAssigned {
                task_id: task_id.to_string(),
            })?;

        if gates_satisfied(stage, &state) {
            if let Some(auto) = auto_transition(stage) {
                info!(%task_id, from = %stage.name, to = %auto.to_stage,
                      "all required gates satisfied, auto-advancing");
                self.enter_stage(task_id, &auto.to_stage)?;
            }
        }

        Ok(runs)
    }

    /// Check a prospective commit's change set against the task's current
    /// stage policy. Pure read; nothing is executed.
    pub fn can_commit(
        &self,
        task_id: EntityId,
        changes: &ChangeSet,
    ) -> Result<(), WorkflowError> {
        let status = self.status(task_id)?;
        let satisfied = gates_satisfied(&status.stage, &status.state);
        check_policy(status.stage.commit_policy, changes, satisfied)
    }

    fn load_workflow(&self, workflow_id: EntityId) -> Result<Workflow, WorkflowError> {
        let entity = self.store.get(workflow_id)?;
        match entity.payload {
            EntityKind::Workflow(w) => Ok(w),
            _ => Err(WorkflowError::NotAWorkflow {
                id: workflow_id.to_string(),
            }),
        }
    }

    fn enter_stage(
        &self,
        task_id: EntityId,
        stage_name: &str,
    ) -> Result<TaskWorkflowState, WorkflowError> {
        let name = stage_name.to_string();
        let state = self.store.update_task_state(task_id, move |s| {
            s.stage = name.clone();
            s.gate_results.clear();
            Ok(())
        })?;
        debug!(%task_id, stage = %stage_name, "entered stage");
        Ok(state)
    }

    fn record_run(
        &self,
        task_id: EntityId,
        stage: &str,
        gate_index: usize,
        gate: &Gate,
        run: &GateRun,
    ) -> Result<(), WorkflowError> {
        let result = ExecutionResult {
            task_id,
            stage: stage.to_string(),
            command: run.command.clone(),
            outcome: run.outcome.clone(),
            stdout: run.stdout.clone(),
            stderr: run.stderr.clone(),
            duration_ms: run.duration_ms,
        };
        let entity = Entity::new(EntityKind::ExecutionResult(result), self.store.agent());
        let result_id = self.store.create(&entity, false)?;
        self.store.link(result_id, task_id, RelationType::Documents)?;

        let verdict = satisfies(&run.outcome, gate.expected);
        self.store.update_task_state(task_id, move |s| {
            s.gate_results.insert(gate_index, verdict);
            Ok(())
        })?;
        Ok(())
    }
}

/// All required gates of the stage have a recorded satisfying run.
/// Optional gates never hold a stage back. A stage with no required
/// gates is trivially satisfied.
pub fn gates_satisfied(stage: &Stage, state: &TaskWorkflowState) -> bool {
    stage
        .quality_gates
        .iter()
        .enumerate()
        .filter(|(_, g)| g.required)
        .all(|(idx, _)| state.gate_results.get(&idx) == Some(&true))
}

fn auto_transition(stage: &Stage) -> Option<&Transition> {
    stage
        .transitions
        .iter()
        .find(|t| t.trigger == TransitionTrigger::AutoOnGateSuccess)
}

/// The built-in TDD pipeline assigned to tasks that do not bring their
/// own workflow.
pub fn default_workflow() -> Workflow {
    Workflow {
        name: "tdd".into(),
        stages: vec![
            Stage {
                name: "requirements".into(),
                commit_policy: CommitPolicy::EngramOnly,
                quality_gates: vec![],
                transitions: vec![manual_to("planning")],
            },
            Stage {
                name: "planning".into(),
                commit_policy: CommitPolicy::ResearchArtifacts,
                quality_gates: vec![],
                transitions: vec![manual_to("red")],
            },
            Stage {
                name: "red".into(),
                commit_policy: CommitPolicy::TestsOnly,
                quality_gates: vec![Gate::required("cargo test", ExpectedResult::Failure)],
                transitions: vec![auto_to("green")],
            },
            Stage {
                name: "green".into(),
                commit_policy: CommitPolicy::CodeWithTests,
                quality_gates: vec![Gate::required("cargo test", ExpectedResult::Success)],
                transitions: vec![auto_to("refactor")],
            },
            Stage {
                name: "refactor".into(),
                commit_policy: CommitPolicy::CodeWithTests,
                quality_gates: vec![
                    Gate::required("cargo test", ExpectedResult::Success),
                    Gate::optional("cargo clippy", ExpectedResult::Success),
                ],
                transitions: vec![manual_to("integration")],
            },
            Stage {
                name: "integration".into(),
                commit_policy: CommitPolicy::FullValidation,
                quality_gates: vec![Gate::required("cargo test", ExpectedResult::Success)],
                transitions: vec![],
            },
        ],
    }
}

fn manual_to(stage: &str) -> Transition {
    Transition {
        to_stage: stage.into(),
        trigger: TransitionTrigger::Manual,
    }
}

fn auto_to(stage: &str) -> Transition {
    Transition {
        to_stage: stage.into(),
        trigger: TransitionTrigger::AutoOnGateSuccess,
    }
}
