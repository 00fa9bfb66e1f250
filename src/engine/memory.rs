//! In-process edge storage engine
//!
//! Keeps a forward and a reverse ordered map per database, both keyed by
//! packed 18-byte keys, and serves per-node lookups as range scans bounded
//! by the packed node prefix.

use super::key::RelationKey;
use super::{EdgeEngine, EdgeIndex, EngineResult};
use crate::graph::types::{NodeId, TypeKey};
use std::collections::BTreeMap;

/// In-process engine; every index it opens lives on the heap of the
/// calling process
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryEngine;

impl EdgeEngine for MemoryEngine {
    fn open_index(&self) -> EngineResult<Box<dyn EdgeIndex>> {
        Ok(Box::new(MemoryIndex::new()))
    }
}

/// Ordered-map storage for a single database
#[derive(Debug, Default)]
pub struct MemoryIndex {
    /// `(source, target, type)` -> weight
    entries: BTreeMap<RelationKey, f64>,

    /// `(target, source, type)` -> weight; leads with the target so one
    /// range scan enumerates a node's in-edges
    rev_entries: BTreeMap<RelationKey, f64>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys leading with `node`; same-lead keys are contiguous in the
    /// packed ordering
    fn scan(map: &BTreeMap<RelationKey, f64>, node: NodeId) -> Vec<RelationKey> {
        map.range(RelationKey::floor(node)..)
            .take_while(|(key, _)| key.lead() == node)
            .map(|(key, _)| *key)
            .collect()
    }
}

impl EdgeIndex for MemoryIndex {
    fn insert(
        &mut self,
        source: NodeId,
        target: NodeId,
        type_key: TypeKey,
        weight: f64,
    ) -> EngineResult<()> {
        self.entries
            .insert(RelationKey::pack(source, target, type_key), weight);
        self.rev_entries
            .insert(RelationKey::pack(target, source, type_key), weight);
        Ok(())
    }

    fn remove(&mut self, source: NodeId, target: NodeId, type_key: TypeKey) -> EngineResult<()> {
        self.entries
            .remove(&RelationKey::pack(source, target, type_key));
        self.rev_entries
            .remove(&RelationKey::pack(target, source, type_key));
        Ok(())
    }

    fn forward_keys(&self, node: NodeId) -> EngineResult<Vec<RelationKey>> {
        Ok(Self::scan(&self.entries, node))
    }

    fn reverse_keys(&self, node: NodeId) -> EngineResult<Vec<RelationKey>> {
        Ok(Self::scan(&self.rev_entries, node))
    }

    fn weight_of(&self, key: &RelationKey) -> EngineResult<f64> {
        Ok(self.entries.get(key).copied().unwrap_or(0.0))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
