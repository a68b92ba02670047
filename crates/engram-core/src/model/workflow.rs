use serde::{Deserialize, Serialize};

/// What a commit may contain while a task sits in a given stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Only memory-store changes; no tracked files at all.
    EngramOnly,
    /// Test files only (TDD red phase).
    TestsOnly,
    /// Production code must arrive together with tests, or behind green gates.
    CodeWithTests,
    /// Every required gate of the stage must have passed most recently.
    FullValidation,
    /// Documentation and notes only.
    ResearchArtifacts,
}

/// Expected outcome of a gate command. `Failure` models a red-phase test
/// run that must fail before implementation starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedResult {
    Success,
    Failure,
    Any,
}

/// An externally invocable command whose exit status gates stage
/// transitions. The store knows nothing about what the command does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Gate {
    pub command: String,
    pub required: bool,
    pub expected: ExpectedResult,
}

impl Gate {
    pub fn required(command: impl Into<String>, expected: ExpectedResult) -> Self {
        Self {
            command: command.into(),
            required: true,
            expected,
        }
    }

    pub fn optional(command: impl Into<String>, expected: ExpectedResult) -> Self {
        Self {
            command: command.into(),
            required: false,
            expected,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    Manual,
    AutoOnGateSuccess,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub to_stage: String,
    pub trigger: TransitionTrigger,
}

/// One named stage of a workflow. A stage with no transitions is terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stage {
    pub name: String,
    pub commit_policy: CommitPolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_gates: Vec<Gate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// Workflow payload: an ordered list of stages. The first stage is the
/// initial state for any task the workflow is assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    pub name: String,
    pub stages: Vec<Stage>,
}

impl Workflow {
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn initial_stage(&self) -> Option<&Stage> {
        self.stages.first()
    }
}
