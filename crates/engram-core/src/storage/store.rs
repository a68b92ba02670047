use std::path::Path;

use chrono::Utc;
use git2::{ErrorCode, Oid, Repository};

use crate::config::EngramConfig;
use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityStatus, Relationship};

use super::objects::{content_hash, read_json_blob, write_json_blob};
use super::refs;

/// Options for listing entities. Re-issuing the same filter against an
/// unchanged store returns the same sequence.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub kind: Option<String>,
    pub status: Option<EntityStatus>,
    pub agent: Option<String>,
    pub limit: Option<usize>,
}

/// Opaque handle to the ref value a record was read at. Passing it back to
/// a write makes that write a compare-and-swap against concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasToken(pub(crate) Oid);

/// The shared store handle: one Git repository holding every entity,
/// relationship, and governance record under refs/engram/. All components
/// take this as an explicit dependency; there is no process-wide singleton.
pub struct GitStore {
    repo: Repository,
    agent: String,
    settings: EngramConfig,
}

impl GitStore {
    /// Open the Git repository at the given path.
    pub fn open(path: &Path, agent: impl Into<String>) -> Result<Self, CoreError> {
        let repo = Repository::open(path)?;
        Self::from_repo(repo, agent)
    }

    /// Discover the Git repository from the current directory.
    pub fn discover(agent: impl Into<String>) -> Result<Self, CoreError> {
        let repo = Repository::discover(".")?;
        Self::from_repo(repo, agent)
    }

    fn from_repo(repo: Repository, agent: impl Into<String>) -> Result<Self, CoreError> {
        let settings = repo
            .config()
            .ok()
            .map(|c| EngramConfig::load(&c))
            .transpose()?
            .unwrap_or_default();
        let mut agent = agent.into();
        if agent.is_empty() {
            agent = settings
                .default_agent
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
        }
        Ok(Self {
            repo,
            agent,
            settings,
        })
    }

    /// Check if engram has been initialized in this repo.
    pub fn is_initialized(&self) -> bool {
        self.repo
            .config()
            .ok()
            .and_then(|c| c.get_bool("engram.enabled").ok())
            .unwrap_or(false)
    }

    /// Initialize engram: set config, schema version, and ref-sync refspecs.
    /// If `remote` is Some, only configure that specific remote.
    pub fn init_with_remote(&self, remote: Option<&str>) -> Result<(), CoreError> {
        let mut config = self.repo.config().map_err(CoreError::Git)?;
        EngramConfig::default_init().save(&mut config)?;
        config
            .set_i32("engram.version", 1)
            .map_err(CoreError::Git)?;
        self.configure_remotes_filtered(remote)?;
        Ok(())
    }

    pub fn init(&self) -> Result<(), CoreError> {
        self.init_with_remote(None)
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn settings(&self) -> &EngramConfig {
        &self.settings
    }

    /// The .git directory (hook installation lives there).
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    // --- Entity operations -------------------------------------------------

    /// Store a new entity. Referenced tasks must already exist. Re-creating
    /// the same id with a byte-identical payload (and no `force`) is a
    /// duplicate; `force` overwrites unconditionally.
    pub fn create(&self, entity: &Entity, force: bool) -> Result<EntityId, CoreError> {
        if let Some(task_id) = entity.payload.required_task_ref() {
            // Reasoning/ExecutionResult must point at a real task.
            self.get(task_id)?;
        }

        let ref_name = refs::entity_ref_name(&entity.id);
        if !force {
            if let Ok(reference) = self.repo.find_reference(&ref_name) {
                if let Some(oid) = reference.target() {
                    let existing: Entity = read_json_blob(&self.repo, oid)?;
                    if content_hash(&existing.payload)? == content_hash(&entity.payload)? {
                        return Err(CoreError::DuplicateEntity {
                            id: entity.id.to_string(),
                        });
                    }
                }
                // Same id, different payload: ids are immutable once taken.
                return Err(CoreError::DuplicateEntity {
                    id: entity.id.to_string(),
                });
            }
        }

        let blob = write_json_blob(&self.repo, entity)?;
        self.repo
            .reference(&ref_name, blob, force, &format!("engram: create {}", entity.kind_name()))
            .map_err(|e| CoreError::StorageWriteFailure(e.to_string()))?;
        tracing::debug!(id = %entity.id, kind = entity.kind_name(), "created entity");
        Ok(entity.id)
    }

    /// Read an entity by id.
    pub fn get(&self, id: EntityId) -> Result<Entity, CoreError> {
        let ref_name = refs::entity_ref_name(&id);
        let reference = self
            .repo
            .find_reference(&ref_name)
            .map_err(|_| CoreError::NotFound { id: id.to_string() })?;
        let oid = reference
            .target()
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
        read_json_blob(&self.repo, oid)
    }

    /// Resolve a full id or unique prefix to an entity id.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<EntityId, CoreError> {
        let (id, _oid) = refs::resolve_entity_prefix(&self.repo, id_or_prefix)?;
        Ok(id)
    }

    /// Status transition as compare-and-swap with bounded retry;
    /// concurrent writers surface as `Contention`.
    pub fn update_status(&self, id: EntityId, new_status: EntityStatus) -> Result<Entity, CoreError> {
        let ref_name = refs::entity_ref_name(&id);
        let retries = self.settings.cas_retries;

        for _attempt in 0..retries {
            let reference = self
                .repo
                .find_reference(&ref_name)
                .map_err(|_| CoreError::NotFound { id: id.to_string() })?;
            let old_oid = reference
                .target()
                .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
            let mut entity: Entity = read_json_blob(&self.repo, old_oid)?;

            if entity.status == new_status {
                return Ok(entity);
            }
            if entity.status.is_terminal() {
                return Err(CoreError::InvalidTransition {
                    id: id.to_string(),
                    from: entity.status.to_string(),
                    to: new_status.to_string(),
                });
            }

            entity.status = new_status;
            entity.updated_at = Utc::now();
            let blob = write_json_blob(&self.repo, &entity)?;

            match self
                .repo
                .reference_matching(&ref_name, blob, true, old_oid, "engram: update status")
            {
                Ok(_) => return Ok(entity),
                Err(e) if e.code() == ErrorCode::Modified => {
                    tracing::debug!(id = %id, "status CAS lost, retrying");
                    continue;
                }
                Err(e) => return Err(CoreError::StorageWriteFailure(e.to_string())),
            }
        }

        Err(CoreError::Contention {
            id: id.to_string(),
            attempts: retries,
        })
    }

    /// CAS read-modify-write over a whole entity. `mutate` sees the
    /// freshest copy on every retry and returns whether to write; `false`
    /// stops without touching the ref. `updated_at` is bumped on write.
    pub fn update_entity<E, F>(&self, id: EntityId, mut mutate: F) -> Result<(Entity, bool), E>
    where
        E: From<CoreError>,
        F: FnMut(&mut Entity) -> Result<bool, E>,
    {
        let ref_name = refs::entity_ref_name(&id);
        let retries = self.settings.cas_retries;

        for _attempt in 0..retries {
            let reference = self
                .repo
                .find_reference(&ref_name)
                .map_err(|_| CoreError::NotFound { id: id.to_string() })?;
            let old_oid = reference
                .target()
                .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
            let mut entity: Entity =
                read_json_blob(&self.repo, old_oid).map_err(CoreError::from)?;

            if !mutate(&mut entity)? {
                return Ok((entity, false));
            }
            entity.updated_at = Utc::now();
            let blob = write_json_blob(&self.repo, &entity).map_err(CoreError::from)?;

            match self
                .repo
                .reference_matching(&ref_name, blob, true, old_oid, "engram: update entity")
            {
                Ok(_) => return Ok((entity, true)),
                Err(e) if e.code() == ErrorCode::Modified => {
                    tracing::debug!(id = %id, "entity CAS lost, retrying");
                    continue;
                }
                Err(e) => return Err(CoreError::StorageWriteFailure(e.to_string()).into()),
            }
        }

        Err(CoreError::Contention {
            id: id.to_string(),
            attempts: retries,
        }
        .into())
    }

    /// List entities, newest first, optionally filtered.
    pub fn list(&self, filter: &EntityFilter) -> Result<Vec<Entity>, CoreError> {
        let all = refs::list_fanout_refs(&self.repo, refs::ENTITY_REF_PREFIX)?;
        let mut entities = Vec::with_capacity(all.len());

        for (_id, oid) in &all {
            let entity: Entity = match read_json_blob(&self.repo, *oid) {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entity: {e}");
                    continue;
                }
            };
            if let Some(kind) = &filter.kind {
                if entity.kind_name() != kind {
                    continue;
                }
            }
            if let Some(status) = filter.status {
                if entity.status != status {
                    continue;
                }
            }
            if let Some(agent) = &filter.agent {
                if !entity.agent.contains(agent.as_str()) {
                    continue;
                }
            }
            entities.push(entity);
        }

        entities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            entities.truncate(limit);
        }
        Ok(entities)
    }

    // --- Relationship persistence -----------------------------------------

    /// Persist a relationship record. Relationships are immutable once
    /// written; there is no update path.
    pub fn put_relationship(&self, rel: &Relationship) -> Result<(), CoreError> {
        let blob = write_json_blob(&self.repo, rel)?;
        self.repo
            .reference(
                &refs::rel_ref_name(&rel.id),
                blob,
                false,
                &format!("engram: link {}", rel.rel_type),
            )
            .map_err(|e| CoreError::StorageWriteFailure(e.to_string()))?;
        Ok(())
    }

    pub fn get_relationship(&self, id: EntityId) -> Result<Relationship, CoreError> {
        let ref_name = refs::rel_ref_name(&id);
        let reference = self
            .repo
            .find_reference(&ref_name)
            .map_err(|_| CoreError::NotFound { id: id.to_string() })?;
        let oid = reference
            .target()
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
        read_json_blob(&self.repo, oid)
    }

    /// All relationship records. Traversals build their adjacency from this.
    pub fn list_relationships(&self) -> Result<Vec<Relationship>, CoreError> {
        let all = refs::list_fanout_refs(&self.repo, refs::REL_REF_PREFIX)?;
        let mut rels = Vec::with_capacity(all.len());
        for (_id, oid) in &all {
            match read_json_blob(&self.repo, *oid) {
                Ok(r) => rels.push(r),
                Err(e) => tracing::warn!("Skipping unreadable relationship: {e}"),
            }
        }
        Ok(rels)
    }

    // --- Generic CAS records (workflow state, block ledgers) ---------------

    /// Read a JSON record at an arbitrary engram ref, with its CAS token.
    pub fn read_record<T: serde::de::DeserializeOwned>(
        &self,
        ref_name: &str,
    ) -> Result<Option<(T, CasToken)>, CoreError> {
        match self.repo.find_reference(ref_name) {
            Ok(reference) => match reference.target() {
                Some(oid) => Ok(Some((read_json_blob(&self.repo, oid)?, CasToken(oid)))),
                None => Ok(None),
            },
            Err(_) => Ok(None),
        }
    }

    /// Write a JSON record. With a token this is a compare-and-swap against
    /// the value previously read; without one the ref must not yet exist.
    pub fn write_record<T: serde::Serialize>(
        &self,
        ref_name: &str,
        value: &T,
        expected: Option<&CasToken>,
    ) -> Result<CasToken, CoreError> {
        let blob = write_json_blob(&self.repo, value)?;
        let result = match expected {
            Some(token) => self
                .repo
                .reference_matching(ref_name, blob, true, token.0, "engram: update record"),
            None => self.repo.reference(ref_name, blob, false, "engram: create record"),
        };
        match result {
            Ok(_) => Ok(CasToken(blob)),
            Err(e) if e.code() == ErrorCode::Modified || e.code() == ErrorCode::Exists => {
                Err(CoreError::Contention {
                    id: ref_name.to_string(),
                    attempts: 1,
                })
            }
            Err(e) => Err(CoreError::StorageWriteFailure(e.to_string())),
        }
    }

    /// Read-modify-write with bounded retry. `init` seeds the record when
    /// the ref does not exist yet.
    pub fn update_record<T, F>(
        &self,
        ref_name: &str,
        init: impl Fn() -> T,
        mut mutate: F,
    ) -> Result<T, CoreError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        F: FnMut(&mut T) -> Result<(), CoreError>,
    {
        let retries = self.settings.cas_retries;
        for _attempt in 0..retries {
            let (mut value, token) = match self.read_record::<T>(ref_name)? {
                Some((v, t)) => (v, Some(t)),
                None => (init(), None),
            };
            mutate(&mut value)?;
            match self.write_record(ref_name, &value, token.as_ref()) {
                Ok(_) => return Ok(value),
                Err(CoreError::Contention { .. }) => {
                    tracing::debug!("record CAS lost on {ref_name}, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(CoreError::Contention {
            id: ref_name.to_string(),
            attempts: retries,
        })
    }

    pub fn delete_record(&self, ref_name: &str) -> Result<bool, CoreError> {
        match self.repo.find_reference(ref_name) {
            Ok(mut reference) => {
                reference.delete()?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    // --- Remote refspecs ---------------------------------------------------

    /// Configure fetch/push refspecs for engram refs on remotes so the
    /// memory store travels with `git fetch`/`git push`.
    fn configure_remotes_filtered(&self, filter: Option<&str>) -> Result<(), CoreError> {
        let remotes = self.repo.remotes().map_err(CoreError::Git)?;
        let mut config = self.repo.config().map_err(CoreError::Git)?;

        for remote_name in remotes.iter().flatten() {
            if let Some(target) = filter {
                if remote_name != target {
                    continue;
                }
            }
            let fetch_refspec = "+refs/engram/*:refs/engram/*";
            let push_refspec = "refs/engram/*:refs/engram/*";

            for (key_kind, refspec) in [("fetch", fetch_refspec), ("push", push_refspec)] {
                let key = format!("remote.{remote_name}.{key_kind}");
                let exists = config
                    .entries(Some(&key))
                    .ok()
                    .map(|mut entries| {
                        let mut found = false;
                        while let Some(Ok(entry)) = entries.next() {
                            if entry.value() == Some(refspec) {
                                found = true;
                                break;
                            }
                        }
                        found
                    })
                    .unwrap_or(false);

                if !exists {
                    config
                        .set_multivar(&key, "^$", refspec)
                        .or_else(|_| {
                            if key_kind == "fetch" {
                                self.repo.remote_add_fetch(remote_name, refspec)
                            } else {
                                self.repo.remote_add_push(remote_name, refspec)
                            }
                        })
                        .map_err(CoreError::Git)?;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for GitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitStore")
            .field("git_dir", &self.repo.path())
            .field("agent", &self.agent)
            .finish()
    }
}
