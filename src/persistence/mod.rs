//! Durable persistence via command logging
//!
//! Every mutating store operation maps to one [`Command`]. A command log
//! either discards them ([`NullLog`], for ephemeral stores) or commits each
//! one to a transactional tabular backend ([`DurableLog`]) before the call
//! returns. On startup the store drains the log back into memory:
//! databases first, then type registrations, then relations.

pub mod backend;

// Re-export main types
pub use backend::DurableLog;

use crate::graph::types::{NodeId, TypeKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum LogError {
    /// Backend error
    #[error("backend error: {0}")]
    Backend(#[from] rocksdb::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family missing from the backend
    #[error("missing column family: {0}")]
    ColumnFamily(String),

    /// Persisted data the backend cannot make sense of
    #[error("log corruption: {0}")]
    Corrupt(String),
}

pub type LogResult<T> = Result<T, LogError>;

/// One mutating store operation, recorded in the order issued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Create a named database
    CreateDatabase { name: String },

    /// Destroy a database and every relation in it
    DestroyDatabase { name: String },

    /// Bind a relation type label to its interned key
    RegisterType { label: String, key: TypeKey },

    /// Upsert one weighted relation
    InsertRelation {
        database: String,
        source: NodeId,
        target: NodeId,
        type_key: TypeKey,
        weight: f64,
    },

    /// Delete one relation if present
    RemoveRelation {
        database: String,
        source: NodeId,
        target: NodeId,
        type_key: TypeKey,
    },
}

/// One relation read back from the backend
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRelation {
    pub database: String,
    pub source: NodeId,
    pub target: NodeId,
    pub type_key: TypeKey,
    pub weight: f64,
}

/// Net state recovered from a backend, in replay order: databases are
/// applied first, then types, then relations
#[derive(Debug, Default)]
pub struct RecoveredState {
    pub databases: Vec<String>,
    pub types: Vec<(String, TypeKey)>,
    pub relations: Vec<PersistedRelation>,
}

impl RecoveredState {
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty() && self.types.is_empty() && self.relations.is_empty()
    }
}

/// Command log contract shared by the inert and durable variants
pub trait CommandLog: Send + Sync {
    /// Durably record one command before returning
    fn record(&self, command: &Command) -> LogResult<()>;

    /// Read back everything previously recorded
    fn load(&self) -> LogResult<RecoveredState>;
}

/// Inert log: records nothing, recovers nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl CommandLog for NullLog {
    fn record(&self, _command: &Command) -> LogResult<()> {
        Ok(())
    }

    fn load(&self) -> LogResult<RecoveredState> {
        Ok(RecoveredState::default())
    }
}
