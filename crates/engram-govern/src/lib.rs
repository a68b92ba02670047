//! Governance layer for Engram.
//!
//! Questions and RFCs are entities whose existence blocks other entities.
//! Blocking cascades across `DependsOn` dependents and is bookkept with
//! per-entity reference-counted ledgers, so overlapping blockers resolve
//! in any order and restore the original status exactly once. Resolution
//! verbs live on the operator surface; agents can only open.

pub mod cascade;
pub mod error;
pub mod ledger;
pub mod question;
pub mod rfc;

pub use cascade::GraphSnapshot;
pub use error::GovernError;
pub use ledger::{add_blocker, read_ledger, remove_blocker, BlockLedger, Blocker, BlockerKind};
pub use question::{answer_question, cancel_question, open_question};
pub use rfc::{approve_rfc, mark_implemented, open_rfc, reject_rfc};
