//! Edge storage engine interface
//!
//! The store delegates raw edge storage to an engine behind a capability
//! trait. An engine opens one index per database; the index is the database
//! handle, and dropping it releases all storage behind it.
//!
//! The lookup protocol is deliberately two-step: bulk accessors enumerate
//! packed identity keys only, and each weight is resolved through a second
//! per-key call. This keeps bulk enumeration free of dense per-field
//! allocation when the engine lives outside the store's memory space.

pub mod key;
pub mod memory;

// Re-export main types
pub use key::{RelationKey, KEY_LEN};
pub use memory::{MemoryEngine, MemoryIndex};

use crate::graph::types::{NodeId, TypeKey};
use thiserror::Error;

/// Errors surfaced by a storage engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine-side allocation or lookup failure
    #[error("storage engine failure: {0}")]
    Backend(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Factory for per-database edge storage
pub trait EdgeEngine: Send + Sync {
    /// Create the raw storage for one database
    fn open_index(&self) -> EngineResult<Box<dyn EdgeIndex>>;
}

/// Raw edge storage for a single database
pub trait EdgeIndex: Send + Sync {
    /// Upsert one relation; an existing `(source, target, type)` triple
    /// keeps a single entry and takes the new weight
    fn insert(
        &mut self,
        source: NodeId,
        target: NodeId,
        type_key: TypeKey,
        weight: f64,
    ) -> EngineResult<()>;

    /// Delete one relation; absent triples are left untouched
    fn remove(&mut self, source: NodeId, target: NodeId, type_key: TypeKey) -> EngineResult<()>;

    /// Identity keys of every relation whose source is `node`
    fn forward_keys(&self, node: NodeId) -> EngineResult<Vec<RelationKey>>;

    /// Keys of every relation whose target is `node`, packed target-first
    /// so one ordered scan covers a node's in-edges. Callers re-pack the
    /// identity key before resolving weights.
    fn reverse_keys(&self, node: NodeId) -> EngineResult<Vec<RelationKey>>;

    /// Weight stored under a forward identity key; 0.0 when absent
    fn weight_of(&self, key: &RelationKey) -> EngineResult<f64>;

    /// Number of relations in this database
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
