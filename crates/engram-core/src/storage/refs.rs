use git2::{Oid, Repository};

use crate::error::CoreError;
use crate::model::EntityId;

/// Ref namespace roots. Everything engram persists lives under
/// refs/engram/, so normal project history never carries store artifacts.
pub const ENTITY_REF_PREFIX: &str = "refs/engram/entities/";
pub const REL_REF_PREFIX: &str = "refs/engram/rel/";
pub const STATE_REF_PREFIX: &str = "refs/engram/state/";
pub const BLOCK_REF_PREFIX: &str = "refs/engram/blocks/";

/// Build the full ref name for an entity: refs/engram/entities/<ab>/<id>
pub fn entity_ref_name(id: &EntityId) -> String {
    format!("{ENTITY_REF_PREFIX}{}/{id}", id.fanout_prefix())
}

/// refs/engram/rel/<ab>/<id>
pub fn rel_ref_name(id: &EntityId) -> String {
    format!("{REL_REF_PREFIX}{}/{id}", id.fanout_prefix())
}

/// refs/engram/state/<task-id> — per-task workflow pointer record.
pub fn state_ref_name(task_id: &EntityId) -> String {
    format!("{STATE_REF_PREFIX}{task_id}")
}

/// refs/engram/blocks/<entity-id> — governance block ledger.
pub fn block_ref_name(entity_id: &EntityId) -> String {
    format!("{BLOCK_REF_PREFIX}{entity_id}")
}

/// List all refs under a fanned-out namespace. Returns (EntityId, blob Oid).
pub fn list_fanout_refs(repo: &Repository, prefix: &str) -> Result<Vec<(EntityId, Oid)>, CoreError> {
    let mut results = Vec::new();
    let pattern = format!("{prefix}*/*");
    let refs = repo.references_glob(&pattern)?;
    for reference in refs {
        let reference = reference?;
        if let (Some(name), Some(oid)) = (reference.name(), reference.target()) {
            if let Some(id_part) = name.strip_prefix(prefix) {
                // id_part is "ab/full-id"
                if let Some((_fanout, full_id)) = id_part.split_once('/') {
                    match EntityId::parse(full_id) {
                        Ok(id) => results.push((id, oid)),
                        Err(_) => tracing::warn!("Skipping ref with malformed id: {name}"),
                    }
                }
            }
        }
    }
    Ok(results)
}

/// Resolve an entity id prefix to a full id and its blob Oid.
/// Exact match wins; otherwise the prefix must be unique.
pub fn resolve_entity_prefix(
    repo: &Repository,
    id_or_prefix: &str,
) -> Result<(EntityId, Oid), CoreError> {
    if let Ok(exact) = EntityId::parse(id_or_prefix) {
        let ref_name = entity_ref_name(&exact);
        if let Ok(reference) = repo.find_reference(&ref_name) {
            if let Some(oid) = reference.target() {
                return Ok((exact, oid));
            }
        }
        return Err(CoreError::NotFound {
            id: id_or_prefix.to_string(),
        });
    }

    let all = list_fanout_refs(repo, ENTITY_REF_PREFIX)?;
    let matches: Vec<_> = all
        .iter()
        .filter(|(id, _)| id.to_hyphenated().starts_with(id_or_prefix))
        .collect();

    match matches.len() {
        0 => Err(CoreError::NotFound {
            id: id_or_prefix.to_string(),
        }),
        1 => Ok(*matches[0]),
        n => Err(CoreError::Parse(format!(
            "Ambiguous entity id prefix '{id_or_prefix}': {n} matches"
        ))),
    }
}
