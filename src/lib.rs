//! Relgraph
//!
//! A typed, weighted, directed multigraph store with durable command-log
//! persistence and an algebraic traversal query layer.
//!
//! # Architecture
//!
//! - `graph`: relation type interning and the relation store (named,
//!   isolated databases with forward/reverse adjacency lookups)
//! - `engine`: the raw edge-storage capability interface plus the
//!   in-process ordered-map implementation
//! - `persistence`: the command log contract, an inert variant for
//!   ephemeral stores and a RocksDB-backed durable variant with startup
//!   replay
//! - `query`: cursors over node sets with type-filtered steps, set
//!   algebra and transitive closure
//!
//! # Example Usage
//!
//! ```rust
//! use relgraph::{NodeId, RelationStore, TypeRegistry};
//!
//! let store = RelationStore::in_memory(TypeRegistry::shared());
//! store.create_database("social").unwrap();
//! store.select_database("social").unwrap();
//!
//! store.insert(NodeId::new(0), NodeId::new(1), "follows", 0.8).unwrap();
//! store.insert(NodeId::new(1), NodeId::new(2), "follows", 0.5).unwrap();
//!
//! // Lookups resolve labels and weights back onto each relation
//! let out = store.forward_edges(NodeId::new(0)).unwrap();
//! assert_eq!(out[0].target, NodeId::new(1));
//!
//! // Reachability over a type-filtered traversal
//! let reachable = store.cursor(NodeId::new(0)).closure(&["follows"], true).unwrap();
//! assert_eq!(reachable.len(), 3);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod graph;
pub mod persistence;
pub mod query;

// Re-export main types for convenience
pub use engine::{
    EdgeEngine, EdgeIndex, EngineError, EngineResult, MemoryEngine, MemoryIndex, RelationKey,
    KEY_LEN,
};

pub use graph::{
    NodeId, Relation, RelationStore, RelationType, SharedRegistry, StoreError, StoreResult,
    TypeKey, TypeRegistry,
};

pub use persistence::{
    Command, CommandLog, DurableLog, LogError, LogResult, NullLog, PersistedRelation,
    RecoveredState,
};

pub use query::{Cursor, TypeFilter};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
