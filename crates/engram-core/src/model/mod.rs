pub mod entity;
pub mod execution;
pub mod governance;
pub mod id;
pub mod notes;
pub mod relationship;
pub mod task;
pub mod workflow;

pub use entity::{Entity, EntityKind, EntityStatus};
pub use execution::{ExecutionResult, GateOutcome};
pub use governance::{Question, QuestionState, ReviewState, Rfc, Urgency};
pub use id::EntityId;
pub use notes::{Compliance, Context, Reasoning};
pub use relationship::{RelationType, Relationship};
pub use task::{Priority, Task, TaskState};
pub use workflow::{CommitPolicy, ExpectedResult, Gate, Stage, Transition, TransitionTrigger, Workflow};
