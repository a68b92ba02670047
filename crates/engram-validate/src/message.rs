//! Task-reference extraction from commit messages.
//!
//! A commit claims its task with a bracketed UUID anywhere in the
//! message, e.g. `[550e8400-e29b-41d4-a716-446655440000] fix login`.
//! Extraction never guesses: brackets that do not hold a parseable UUID
//! yield nothing.

use engram_core::model::EntityId;
use uuid::Uuid;

/// The first bracketed UUID in the message, if any.
pub fn extract_task_ref(message: &str) -> Option<EntityId> {
    let mut rest = message;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) => {
                if let Ok(uuid) = Uuid::parse_str(after[..close].trim()) {
                    return Some(EntityId(uuid));
                }
                rest = &after[close + 1..];
            }
            None => return None,
        }
    }
    None
}
