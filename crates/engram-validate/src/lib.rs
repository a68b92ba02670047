//! Commit validation for Engram-governed repositories.
//!
//! Every commit must name its task with a bracketed UUID; validation
//! then checks the task's existence, governance status, relationship
//! completeness, and the commit policy of its current workflow stage.
//! Enforcement is wired into git through a commit-msg hook.

pub mod error;
pub mod hook;
pub mod message;
pub mod validator;

pub use error::ValidateError;
pub use hook::{hook_state, install_hook, uninstall_hook, HookState};
pub use message::extract_task_ref;
pub use validator::{validate_commit, RejectReason, Verdict};
