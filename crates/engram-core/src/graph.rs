//! Relationship graph operations over the store.
//!
//! Edges are persisted as individual records (see `storage::store`); this
//! module adds the creation policy (duplicate suppression, self-reference
//! and missing-endpoint handling) and the traversal queries.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::CoreError;
use crate::model::{EntityId, RelationType, Relationship};
use crate::storage::GitStore;

impl GitStore {
    /// Create a typed edge between two entities.
    ///
    /// Returns `Ok(None)` on the documented skip-and-warn paths: a
    /// self-referential request, a duplicate `(source, target, type)`
    /// triple, or a missing endpoint when strict mode is off. A missing
    /// endpoint under strict mode is fatal.
    pub fn link(
        &self,
        source: EntityId,
        target: EntityId,
        rel_type: RelationType,
    ) -> Result<Option<Relationship>, CoreError> {
        if source == target {
            tracing::warn!(%source, %rel_type, "skipping self-referential relationship");
            return Ok(None);
        }

        let source_entity = match self.get(source) {
            Ok(e) => e,
            Err(CoreError::NotFound { id }) => {
                if self.settings().strict_relationships {
                    return Err(CoreError::MissingEndpoint { id });
                }
                tracing::warn!(%source, "skipping relationship: source does not exist");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let target_entity = match self.get(target) {
            Ok(e) => e,
            Err(CoreError::NotFound { id }) => {
                if self.settings().strict_relationships {
                    return Err(CoreError::MissingEndpoint { id });
                }
                tracing::warn!(%target, "skipping relationship: target does not exist");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if self.exists(source, target, rel_type)? {
            tracing::warn!(%source, %target, %rel_type, "skipping duplicate relationship");
            return Ok(None);
        }

        let rel = Relationship::new(
            source,
            source_entity.kind_name(),
            target,
            target_entity.kind_name(),
            rel_type,
            self.agent(),
        );
        self.put_relationship(&rel)?;
        tracing::debug!(id = %rel.id, %rel_type, "created relationship");
        Ok(Some(rel))
    }

    /// Whether the exact edge already exists. Direction matters: creating
    /// (A, B, t) never makes (B, A, t) exist.
    pub fn exists(
        &self,
        source: EntityId,
        target: EntityId,
        rel_type: RelationType,
    ) -> Result<bool, CoreError> {
        Ok(self
            .list_relationships()?
            .iter()
            .any(|r| r.triple() == (source, target, rel_type)))
    }

    /// All edges touching an entity from either end, optionally filtered
    /// by type.
    pub fn connected(
        &self,
        entity_id: EntityId,
        rel_type: Option<RelationType>,
    ) -> Result<Vec<Relationship>, CoreError> {
        let mut rels: Vec<_> = self
            .list_relationships()?
            .into_iter()
            .filter(|r| r.source_id == entity_id || r.target_id == entity_id)
            .filter(|r| rel_type.map_or(true, |t| r.rel_type == t))
            .collect();
        rels.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rels)
    }

    /// Edges of the given type pointing *at* an entity; their sources are
    /// its direct dependents when the type is DependsOn.
    pub fn incoming(
        &self,
        entity_id: EntityId,
        rel_type: RelationType,
    ) -> Result<Vec<Relationship>, CoreError> {
        Ok(self
            .list_relationships()?
            .into_iter()
            .filter(|r| r.target_id == entity_id && r.rel_type == rel_type)
            .collect())
    }

    /// Transitive closure over incoming edges of one type, BFS with a
    /// visited set so cycles terminate and every node appears once. For
    /// DependsOn this is the full dependent set used by block cascades;
    /// the start entity itself appears only if a cycle leads back to it.
    pub fn transitive_closure(
        &self,
        entity_id: EntityId,
        rel_type: RelationType,
    ) -> Result<HashSet<EntityId>, CoreError> {
        let mut dependents_of: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for rel in self.list_relationships()? {
            if rel.rel_type == rel_type {
                dependents_of.entry(rel.target_id).or_default().push(rel.source_id);
            }
        }

        let mut closure = HashSet::new();
        let mut queue = VecDeque::from([entity_id]);
        let mut visited = HashSet::from([entity_id]);

        while let Some(current) = queue.pop_front() {
            for &dependent in dependents_of.get(&current).into_iter().flatten() {
                closure.insert(dependent);
                if visited.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
        Ok(closure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngramConfig;
    use crate::model::{Entity, EntityKind, Priority, Task};
    use git2::Repository;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, GitStore) {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let store = GitStore::open(tmp.path(), "test-agent").unwrap();
        store.init().unwrap();
        (tmp, store)
    }

    fn make_task(store: &GitStore, title: &str) -> EntityId {
        let entity = Entity::new(
            EntityKind::Task(Task::new(title, "d", Priority::Medium)),
            "test-agent",
        );
        store.create(&entity, false).unwrap()
    }

    #[test]
    fn test_link_and_exists_directional() {
        let (_tmp, store) = test_store();
        let a = make_task(&store, "a");
        let b = make_task(&store, "b");

        let rel = store.link(a, b, RelationType::References).unwrap();
        assert!(rel.is_some());

        assert!(store.exists(a, b, RelationType::References).unwrap());
        // absence is not symmetric
        assert!(!store.exists(b, a, RelationType::References).unwrap());
        assert!(!store.exists(a, b, RelationType::DependsOn).unwrap());
    }

    #[test]
    fn test_self_reference_skipped() {
        let (_tmp, store) = test_store();
        let a = make_task(&store, "a");
        assert!(store.link(a, a, RelationType::DependsOn).unwrap().is_none());
        assert!(store.connected(a, None).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_triple_skipped() {
        let (_tmp, store) = test_store();
        let a = make_task(&store, "a");
        let b = make_task(&store, "b");
        assert!(store.link(a, b, RelationType::DependsOn).unwrap().is_some());
        assert!(store.link(a, b, RelationType::DependsOn).unwrap().is_none());
        assert_eq!(store.connected(a, None).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_endpoint_skips_unless_strict() {
        let (_tmp, store) = test_store();
        let a = make_task(&store, "a");
        let ghost = EntityId::new();
        assert!(store.link(a, ghost, RelationType::References).unwrap().is_none());
    }

    #[test]
    fn test_missing_endpoint_fatal_in_strict_mode() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        let mut config = repo.config().unwrap();
        let settings = EngramConfig {
            enabled: true,
            strict_relationships: true,
            ..EngramConfig::default()
        };
        settings.save(&mut config).unwrap();
        drop(config);
        drop(repo);

        let store = GitStore::open(tmp.path(), "test-agent").unwrap();
        let a = make_task(&store, "a");
        let err = store.link(a, EntityId::new(), RelationType::References).unwrap_err();
        assert!(matches!(err, CoreError::MissingEndpoint { .. }));
    }

    #[test]
    fn test_connected_filters_by_type() {
        let (_tmp, store) = test_store();
        let a = make_task(&store, "a");
        let b = make_task(&store, "b");
        let c = make_task(&store, "c");
        store.link(a, b, RelationType::References).unwrap();
        store.link(c, a, RelationType::DependsOn).unwrap();

        assert_eq!(store.connected(a, None).unwrap().len(), 2);
        assert_eq!(
            store.connected(a, Some(RelationType::DependsOn)).unwrap().len(),
            1
        );
        assert!(store
            .connected(b, Some(RelationType::DependsOn))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_transitive_closure_chain() {
        let (_tmp, store) = test_store();
        let t1 = make_task(&store, "t1");
        let t2 = make_task(&store, "t2");
        let t3 = make_task(&store, "t3");
        // t3 depends on t2 depends on t1
        store.link(t3, t2, RelationType::DependsOn).unwrap();
        store.link(t2, t1, RelationType::DependsOn).unwrap();

        let closure = store.transitive_closure(t1, RelationType::DependsOn).unwrap();
        assert_eq!(closure, HashSet::from([t2, t3]));
    }

    #[test]
    fn test_transitive_closure_terminates_on_cycle() {
        let (_tmp, store) = test_store();
        let a = make_task(&store, "a");
        let b = make_task(&store, "b");
        store.link(a, b, RelationType::DependsOn).unwrap();
        store.link(b, a, RelationType::DependsOn).unwrap();

        let closure = store.transitive_closure(a, RelationType::DependsOn).unwrap();
        assert_eq!(closure, HashSet::from([a, b]));
    }

    #[test]
    fn test_transitive_closure_diamond_has_no_duplicates() {
        let (_tmp, store) = test_store();
        let root = make_task(&store, "root");
        let left = make_task(&store, "left");
        let right = make_task(&store, "right");
        let top = make_task(&store, "top");
        store.link(left, root, RelationType::DependsOn).unwrap();
        store.link(right, root, RelationType::DependsOn).unwrap();
        store.link(top, left, RelationType::DependsOn).unwrap();
        store.link(top, right, RelationType::DependsOn).unwrap();

        let closure = store.transitive_closure(root, RelationType::DependsOn).unwrap();
        assert_eq!(closure, HashSet::from([left, right, top]));
    }
}
