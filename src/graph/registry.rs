//! Relation type interning
//!
//! Labels naming a kind of relation ("access", "follows") are interned to
//! compact 16-bit keys before they reach the storage engine. The mapping is
//! a bijection for the life of the process: keys come from a monotonically
//! increasing counter starting at 1 (key 0 is reserved), and a label's key
//! never changes or gets recycled once assigned.
//!
//! The registry is process-wide shared state. It is constructed once,
//! wrapped via [`TypeRegistry::shared`], and handed to every store so that
//! key assignment stays atomic across databases.

use super::types::TypeKey;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// All 65 535 keys have been assigned
    #[error("relation type table full")]
    TableFull,

    /// A key surfaced that was never interned. The registry is internally
    /// consistent by construction, so this is only reachable through
    /// corrupt or malformed replay data.
    #[error("unknown relation type key: {0}")]
    UnknownKey(u16),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Process-wide shared handle to a [`TypeRegistry`]
pub type SharedRegistry = Arc<Mutex<TypeRegistry>>;

/// Bidirectional label <-> key table with a monotonic key counter
#[derive(Debug, Default)]
pub struct TypeRegistry {
    keys: FxHashMap<String, TypeKey>,
    labels: FxHashMap<TypeKey, String>,
    counter: u16,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry behind the process-wide guard
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Look up the key of a label without interning it
    pub fn lookup(&self, label: &str) -> Option<TypeKey> {
        self.keys.get(label).copied()
    }

    /// Intern a label, assigning the next unused key on first use
    pub fn intern(&mut self, label: &str) -> RegistryResult<TypeKey> {
        if let Some(key) = self.keys.get(label) {
            return Ok(*key);
        }

        let next = self.counter.checked_add(1).ok_or(RegistryError::TableFull)?;
        self.counter = next;

        let key = TypeKey::new(next);
        self.keys.insert(label.to_string(), key);
        self.labels.insert(key, label.to_string());
        Ok(key)
    }

    /// Resolve a key back to its label; strict inverse of [`Self::intern`]
    pub fn label_of(&self, key: TypeKey) -> RegistryResult<&str> {
        self.labels
            .get(&key)
            .map(|s| s.as_str())
            .ok_or(RegistryError::UnknownKey(key.as_u16()))
    }

    /// Install a recovered mapping during replay.
    ///
    /// The counter is raised to at least `key` so keys assigned after
    /// replay can never collide with recovered ones, regardless of the
    /// order registrations are replayed in.
    pub fn register_known(&mut self, label: &str, key: TypeKey) {
        self.keys.insert(label.to_string(), key);
        self.labels.insert(key, label.to_string());
        self.counter = self.counter.max(key.as_u16());
    }

    /// Number of interned labels
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
