//! Cursor-based graph query algebra
//!
//! A [`Cursor`] is an unordered set of node identifiers over a
//! [`RelationStore`]. Operations are pure: each returns a new cursor and
//! never mutates the receiver. Traversal steps filter by relation type,
//! and [`Cursor::closure`] computes type-filtered reachability with a
//! worklist and a visited set, so cyclic graphs terminate.

use crate::graph::store::{RelationStore, StoreResult};
use crate::graph::types::{NodeId, TypeKey};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Set of type keys a traversal step accepts
///
/// Built from labels by [`RelationStore::type_filter`]; labels the registry
/// has never seen resolve to nothing and match no relation.
#[derive(Debug, Clone, Default)]
pub struct TypeFilter(FxHashSet<TypeKey>);

impl TypeFilter {
    pub(crate) fn new(keys: impl IntoIterator<Item = TypeKey>) -> Self {
        TypeFilter(keys.into_iter().collect())
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.0.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An unordered set of node identifiers bound to a store reference
#[derive(Clone)]
pub struct Cursor<'a> {
    store: &'a RelationStore,
    nodes: FxHashSet<NodeId>,
}

impl<'a> Cursor<'a> {
    /// Cursor positioned on a single node
    pub(crate) fn start(store: &'a RelationStore, node: NodeId) -> Self {
        let mut nodes = FxHashSet::default();
        nodes.insert(node);
        Cursor { store, nodes }
    }

    /// Cursor over an arbitrary node set
    pub fn from_nodes(store: &'a RelationStore, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Cursor {
            store,
            nodes: nodes.into_iter().collect(),
        }
    }

    fn with_nodes(&self, nodes: FxHashSet<NodeId>) -> Cursor<'a> {
        Cursor {
            store: self.store,
            nodes,
        }
    }

    /// One forward step: the union of every member's outgoing targets over
    /// relations whose label is in `types`
    pub fn step_forward(&self, types: &[&str]) -> StoreResult<Cursor<'a>> {
        let filter = self.store.type_filter(types);

        let mut next = FxHashSet::default();
        for &node in &self.nodes {
            next.extend(self.store.forward_neighbors(node, &filter)?);
        }
        Ok(self.with_nodes(next))
    }

    /// One backward step: the union of every member's incoming sources
    /// over relations whose label is in `types`
    pub fn step_backward(&self, types: &[&str]) -> StoreResult<Cursor<'a>> {
        let filter = self.store.type_filter(types);

        let mut next = FxHashSet::default();
        for &node in &self.nodes {
            next.extend(self.store.reverse_neighbors(node, &filter)?);
        }
        Ok(self.with_nodes(next))
    }

    /// Set union; the store reference carries from `self`
    pub fn union(&self, other: &Cursor<'a>) -> Cursor<'a> {
        self.with_nodes(self.nodes.union(&other.nodes).copied().collect())
    }

    /// Set difference
    pub fn difference(&self, other: &Cursor<'a>) -> Cursor<'a> {
        self.with_nodes(self.nodes.difference(&other.nodes).copied().collect())
    }

    /// Set intersection
    pub fn intersection(&self, other: &Cursor<'a>) -> Cursor<'a> {
        self.with_nodes(self.nodes.intersection(&other.nodes).copied().collect())
    }

    /// Every node reachable from this cursor by repeated type-filtered
    /// steps, the starting nodes included.
    ///
    /// The visited set doubles as the cycle guard: nodes enter the
    /// worklist at most once, so traversal terminates on any graph.
    /// Sibling visit order is unspecified; only the final set is.
    pub fn closure(&self, types: &[&str], forward: bool) -> StoreResult<Cursor<'a>> {
        let filter = self.store.type_filter(types);

        let mut visited = self.nodes.clone();
        let mut worklist: VecDeque<NodeId> = self.nodes.iter().copied().collect();

        while let Some(node) = worklist.pop_front() {
            let neighbors = if forward {
                self.store.forward_neighbors(node, &filter)?
            } else {
                self.store.reverse_neighbors(node, &filter)?
            };

            for next in neighbors {
                if visited.insert(next) {
                    worklist.push_back(next);
                }
            }
        }

        Ok(self.with_nodes(visited))
    }

    /// The cursor's node set as an order-irrelevant sequence
    pub fn results(&self) -> Vec<NodeId> {
        self.nodes.iter().copied().collect()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
