//! Cascade planning.
//!
//! Blocking an entity must also block everything that transitively
//! depends on it. Planning is separated from application: a
//! `GraphSnapshot` is read once, the affected set is computed as pure
//! data, and only then are statuses and ledgers written. An interrupted
//! application can simply be re-run because ledger inserts are
//! idempotent.

use std::collections::{HashMap, HashSet, VecDeque};

use engram_core::model::{EntityId, RelationType};
use engram_core::{CoreError, GitStore};

/// Adjacency of `DependsOn` edges at one point in time, keyed by target:
/// `dependents_of[x]` are the entities that declared a dependency on x.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    dependents_of: HashMap<EntityId, Vec<EntityId>>,
}

impl GraphSnapshot {
    pub fn capture(store: &GitStore) -> Result<Self, CoreError> {
        let mut dependents_of: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for rel in store.list_relationships()? {
            if rel.rel_type == RelationType::DependsOn {
                dependents_of
                    .entry(rel.target_id)
                    .or_default()
                    .push(rel.source_id);
            }
        }
        Ok(Self { dependents_of })
    }

    #[cfg(test)]
    pub fn from_edges(edges: &[(EntityId, EntityId)]) -> Self {
        let mut dependents_of: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for &(source, target) in edges {
            dependents_of.entry(target).or_default().push(source);
        }
        Self { dependents_of }
    }

    /// The root plus every transitive dependent, each exactly once.
    /// BFS with a visited set, so dependency cycles terminate.
    pub fn affected(&self, root: EntityId) -> Vec<EntityId> {
        self.affected_by_all(std::iter::once(root))
    }

    /// Union of `affected` over several roots, deduplicated.
    pub fn affected_by_all(
        &self,
        roots: impl IntoIterator<Item = EntityId>,
    ) -> Vec<EntityId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();

        for root in roots {
            if seen.insert(root) {
                order.push(root);
                queue.push_back(root);
            }
        }
        while let Some(current) = queue.pop_front() {
            for &dep in self.dependents_of.get(&current).into_iter().flatten() {
                if seen.insert(dep) {
                    order.push(dep);
                    queue.push_back(dep);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affected_includes_root_and_transitive_dependents() {
        let (a, b, c, d) = (EntityId::new(), EntityId::new(), EntityId::new(), EntityId::new());
        // b depends on a, c depends on b; d is unrelated
        let snap = GraphSnapshot::from_edges(&[(b, a), (c, b), (d, d)]);
        let affected = snap.affected(a);
        assert_eq!(affected, vec![a, b, c]);
    }

    #[test]
    fn test_cycle_terminates() {
        let (a, b) = (EntityId::new(), EntityId::new());
        let snap = GraphSnapshot::from_edges(&[(a, b), (b, a)]);
        let affected = snap.affected(a);
        assert_eq!(affected.len(), 2);
        assert!(affected.contains(&a) && affected.contains(&b));
    }

    #[test]
    fn test_diamond_yields_each_node_once() {
        let (root, l, r, top) =
            (EntityId::new(), EntityId::new(), EntityId::new(), EntityId::new());
        let snap = GraphSnapshot::from_edges(&[(l, root), (r, root), (top, l), (top, r)]);
        let affected = snap.affected(root);
        assert_eq!(affected.len(), 4);
    }

    #[test]
    fn test_union_over_roots_dedupes() {
        let (a, b, c) = (EntityId::new(), EntityId::new(), EntityId::new());
        let snap = GraphSnapshot::from_edges(&[(c, a), (c, b)]);
        let affected = snap.affected_by_all([a, b]);
        assert_eq!(affected, vec![a, b, c]);
    }
}
