//! Commit-policy enforcement.
//!
//! A `ChangeSet` is the list of paths staged for a commit; classification
//! is heuristic by path shape, mirroring how the hook sees the world. The
//! check itself is pure so the validator can call it without touching the
//! store.

use engram_core::model::CommitPolicy;

use crate::error::WorkflowError;

const CODE_EXTENSIONS: &[&str] = &[
    ".rs", ".py", ".js", ".ts", ".go", ".java", ".c", ".cpp", ".h", ".hpp",
];

/// The staged paths of a prospective commit.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub paths: Vec<String>,
}

impl ChangeSet {
    pub fn new(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn has_test_changes(&self) -> bool {
        self.paths.iter().any(|p| is_test_path(p))
    }

    pub fn has_source_changes(&self) -> bool {
        self.paths.iter().any(|p| is_code_path(p) && !is_test_path(p))
    }

    pub fn is_tests_only(&self) -> bool {
        !self.is_empty() && self.paths.iter().all(|p| is_test_path(p))
    }

    pub fn is_docs_only(&self) -> bool {
        !self.is_empty() && self.paths.iter().all(|p| is_docs_path(p))
    }
}

fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.starts_with("tests/")
        || lower.contains("/tests/")
        || lower.contains("_test.")
        || lower.contains(".test.")
        || lower.contains("spec")
        || lower
            .rsplit('/')
            .next()
            .map(|f| f.starts_with("test_"))
            .unwrap_or(false)
}

fn is_code_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    CODE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn is_docs_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".md") || lower.ends_with(".txt") || lower.starts_with("docs/")
}

/// Check a change set against a stage's commit policy.
///
/// `gates_satisfied` is the verdict of the current stage's required gates
/// at their most recent execution; it feeds the CodeWithTests escape
/// hatch and FullValidation.
pub fn check_policy(
    policy: CommitPolicy,
    changes: &ChangeSet,
    gates_satisfied: bool,
) -> Result<(), WorkflowError> {
    match policy {
        CommitPolicy::EngramOnly => {
            if !changes.is_empty() {
                return Err(WorkflowError::PolicyViolation(
                    "stage permits no tracked-file changes (memory-store updates only)".into(),
                ));
            }
        }
        CommitPolicy::TestsOnly => {
            if !changes.is_tests_only() {
                return Err(WorkflowError::PolicyViolation(
                    "stage permits test-file changes only".into(),
                ));
            }
        }
        CommitPolicy::CodeWithTests => {
            let paired = changes.has_test_changes() && changes.has_source_changes();
            if !paired && !gates_satisfied {
                return Err(WorkflowError::PolicyViolation(
                    "stage requires tests alongside code changes, or green required gates".into(),
                ));
            }
        }
        CommitPolicy::FullValidation => {
            if !gates_satisfied {
                return Err(WorkflowError::PolicyViolation(
                    "stage requires all required gates to have passed most recently".into(),
                ));
            }
        }
        CommitPolicy::ResearchArtifacts => {
            if !changes.is_docs_only() {
                return Err(WorkflowError::PolicyViolation(
                    "stage permits documentation and notes only".into(),
                ));
            }
        }
    }
    Ok(())
}
