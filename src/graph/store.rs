//! Relation store: named databases of typed, weighted, directed relations
//!
//! The store owns a set of named, isolated databases and a selection
//! cursor over them; unqualified operations address the selected database.
//! Raw edge storage is delegated to an [`EdgeEngine`], type labels are
//! interned through the process-wide [`TypeRegistry`], and every mutation
//! is recorded to a [`CommandLog`] before the writer lock is released, so
//! the durable command order matches the order mutations became visible.
//!
//! Concurrency follows a single-writer/multi-reader discipline per
//! database: lookups and query steps take the database's read lock,
//! insert/remove take its write lock, and create/destroy take the
//! database map's write lock.

use crate::engine::{EdgeEngine, EdgeIndex, EngineError, MemoryEngine, RelationKey};
use crate::graph::registry::{RegistryError, SharedRegistry};
use crate::graph::types::{NodeId, Relation, TypeKey};
use crate::persistence::{Command, CommandLog, LogError, NullLog, PersistedRelation};
use crate::query::{Cursor, TypeFilter};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Operation referenced a database never created or already destroyed
    #[error("unknown database: {0}")]
    UnknownDatabase(String),

    /// A database with this name already exists
    #[error("database already exists: {0}")]
    DatabaseExists(String),

    /// An unqualified operation was issued with nothing selected
    #[error("no database selected")]
    NoDatabaseSelected,

    /// Type registry failure; an unknown key is corruption-class
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Engine failures are propagated unmodified; upserts are idempotent,
    /// so retrying is caller policy
    #[error("storage engine failure: {0}")]
    Engine(#[from] EngineError),

    /// The durable backend failed to commit. The in-memory mutation is
    /// already visible; the caller should treat the instance as
    /// durability-compromised until recovered.
    #[error("persistence failure: {0}")]
    Log(#[from] LogError),
}

pub type StoreResult<T> = Result<T, StoreError>;

type SharedIndex = Arc<RwLock<Box<dyn EdgeIndex>>>;

/// Typed, weighted, directed multigraph store over named databases
pub struct RelationStore {
    /// Process-wide label interning; key assignment is atomic under its
    /// mutex
    registry: SharedRegistry,

    /// Raw storage factory; one index per database
    engine: Box<dyn EdgeEngine>,

    /// Command log; inert for ephemeral stores
    log: Box<dyn CommandLog>,

    /// Live databases, each behind its own reader-writer lock
    databases: RwLock<FxHashMap<String, SharedIndex>>,

    /// Name of the database unqualified operations address
    selected: RwLock<Option<String>>,
}

impl RelationStore {
    /// Ephemeral store: in-process engine, inert log, nothing replayed
    pub fn in_memory(registry: SharedRegistry) -> Self {
        Self {
            registry,
            engine: Box::new(MemoryEngine),
            log: Box::new(NullLog),
            databases: RwLock::new(FxHashMap::default()),
            selected: RwLock::new(None),
        }
    }

    /// Open a store over an engine and a command log.
    ///
    /// The log is drained before any client operation is accepted:
    /// databases first, then type registrations (keeping their recovered
    /// keys), then relations. Replay goes through unlogged entry points,
    /// so nothing is re-recorded.
    pub fn open(
        registry: SharedRegistry,
        engine: Box<dyn EdgeEngine>,
        log: Box<dyn CommandLog>,
    ) -> StoreResult<Self> {
        let store = Self {
            registry,
            engine,
            log,
            databases: RwLock::new(FxHashMap::default()),
            selected: RwLock::new(None),
        };

        let state = store.log.load()?;
        let counts = (
            state.databases.len(),
            state.types.len(),
            state.relations.len(),
        );

        for name in &state.databases {
            store.create_database_replayed(name)?;
        }
        {
            let mut registry = store.registry.lock().unwrap();
            for (label, key) in &state.types {
                registry.register_known(label, *key);
            }
        }
        for relation in &state.relations {
            store.insert_replayed(relation)?;
        }

        info!(
            "Replayed {} databases, {} types, {} relations",
            counts.0, counts.1, counts.2
        );
        Ok(store)
    }

    /// Create a new empty database
    pub fn create_database(&self, name: &str) -> StoreResult<()> {
        let mut databases = self.databases.write().unwrap();
        if databases.contains_key(name) {
            return Err(StoreError::DatabaseExists(name.to_string()));
        }

        let index = self.engine.open_index()?;
        databases.insert(name.to_string(), Arc::new(RwLock::new(index)));

        // Recorded while the map lock is held, keeping log order aligned
        // with visibility order.
        self.log.record(&Command::CreateDatabase {
            name: name.to_string(),
        })?;

        debug!("Created database {}", name);
        Ok(())
    }

    /// Destroy a database, releasing all its storage
    pub fn destroy_database(&self, name: &str) -> StoreResult<()> {
        let mut databases = self.databases.write().unwrap();
        if databases.remove(name).is_none() {
            return Err(StoreError::UnknownDatabase(name.to_string()));
        }

        {
            let mut selected = self.selected.write().unwrap();
            if selected.as_deref() == Some(name) {
                *selected = None;
            }
        }

        self.log.record(&Command::DestroyDatabase {
            name: name.to_string(),
        })?;

        debug!("Destroyed database {}", name);
        Ok(())
    }

    /// Select the database unqualified operations address
    pub fn select_database(&self, name: &str) -> StoreResult<()> {
        let databases = self.databases.read().unwrap();
        if !databases.contains_key(name) {
            return Err(StoreError::UnknownDatabase(name.to_string()));
        }

        *self.selected.write().unwrap() = Some(name.to_string());
        Ok(())
    }

    /// Name of the currently selected database
    pub fn selected_database(&self) -> Option<String> {
        self.selected.read().unwrap().clone()
    }

    /// Names of all live databases
    pub fn database_names(&self) -> Vec<String> {
        self.databases.read().unwrap().keys().cloned().collect()
    }

    /// Upsert a relation into the selected database.
    ///
    /// The label is interned on first use; an existing `(source, target,
    /// type)` triple keeps one entry and takes the new weight.
    pub fn insert(
        &self,
        source: NodeId,
        target: NodeId,
        label: &str,
        weight: f64,
    ) -> StoreResult<()> {
        let (name, index) = self.selected_index()?;
        let mut index = index.write().unwrap();

        let type_key = self.intern(label)?;
        index.insert(source, target, type_key, weight)?;

        self.log.record(&Command::InsertRelation {
            database: name,
            source,
            target,
            type_key,
            weight,
        })?;
        Ok(())
    }

    /// Delete a relation from the selected database.
    ///
    /// The type key is resolved exactly as `insert` resolves it; a missing
    /// relation is a no-op, not an error.
    pub fn remove(&self, source: NodeId, target: NodeId, label: &str) -> StoreResult<()> {
        let (name, index) = self.selected_index()?;
        let mut index = index.write().unwrap();

        let type_key = self.intern(label)?;
        index.remove(source, target, type_key)?;

        self.log.record(&Command::RemoveRelation {
            database: name,
            source,
            target,
            type_key,
        })?;
        Ok(())
    }

    /// All relations whose source is `node`, with labels and weights
    /// resolved; empty when the node has no outgoing relations
    pub fn forward_edges(&self, node: NodeId) -> StoreResult<Vec<Relation>> {
        let (_, index) = self.selected_index()?;
        let index = index.read().unwrap();

        let keys = index.forward_keys(node)?;
        let registry = self.registry.lock().unwrap();

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let (source, target, type_key) = key.unpack();
            // Second step of the engine protocol: weight by identity key.
            let weight = index.weight_of(&key)?;
            let label = registry.label_of(type_key)?.to_string();
            out.push(Relation::new(source, target, label, weight));
        }
        Ok(out)
    }

    /// All relations whose target is `node`; symmetric to
    /// [`Self::forward_edges`]
    pub fn reverse_edges(&self, node: NodeId) -> StoreResult<Vec<Relation>> {
        let (_, index) = self.selected_index()?;
        let index = index.read().unwrap();

        let keys = index.reverse_keys(node)?;
        let registry = self.registry.lock().unwrap();

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            // Reverse keys lead with the target; re-pack the identity key
            // before resolving the weight.
            let (target, source, type_key) = key.unpack();
            let identity = RelationKey::pack(source, target, type_key);
            let weight = index.weight_of(&identity)?;
            let label = registry.label_of(type_key)?.to_string();
            out.push(Relation::new(source, target, label, weight));
        }
        Ok(out)
    }

    /// Number of relations in the selected database
    pub fn relation_count(&self) -> StoreResult<usize> {
        let (_, index) = self.selected_index()?;
        let index = index.read().unwrap();
        Ok(index.len())
    }

    /// Start a query cursor positioned on a single node
    pub fn cursor(&self, node: NodeId) -> Cursor<'_> {
        Cursor::start(self, node)
    }

    /// Resolve a set of labels to a traversal filter. Labels never seen by
    /// the registry resolve to nothing and match no relation; queries do
    /// not intern.
    pub fn type_filter(&self, labels: &[&str]) -> TypeFilter {
        let registry = self.registry.lock().unwrap();
        TypeFilter::new(labels.iter().filter_map(|label| registry.lookup(label)))
    }

    /// Targets of `node`'s outgoing relations whose type passes `filter`
    pub fn forward_neighbors(&self, node: NodeId, filter: &TypeFilter) -> StoreResult<Vec<NodeId>> {
        let (_, index) = self.selected_index()?;
        let index = index.read().unwrap();

        let mut out = Vec::new();
        for key in index.forward_keys(node)? {
            let (_, target, type_key) = key.unpack();
            if filter.contains(type_key) {
                out.push(target);
            }
        }
        Ok(out)
    }

    /// Sources of `node`'s incoming relations whose type passes `filter`
    pub fn reverse_neighbors(&self, node: NodeId, filter: &TypeFilter) -> StoreResult<Vec<NodeId>> {
        let (_, index) = self.selected_index()?;
        let index = index.read().unwrap();

        let mut out = Vec::new();
        for key in index.reverse_keys(node)? {
            let (_, source, type_key) = key.unpack();
            if filter.contains(type_key) {
                out.push(source);
            }
        }
        Ok(out)
    }

    /// Intern a label, recording the registration the first time a key is
    /// assigned
    fn intern(&self, label: &str) -> StoreResult<TypeKey> {
        let (key, fresh) = {
            let mut registry = self.registry.lock().unwrap();
            match registry.lookup(label) {
                Some(key) => (key, false),
                None => (registry.intern(label)?, true),
            }
        };

        if fresh {
            self.log.record(&Command::RegisterType {
                label: label.to_string(),
                key,
            })?;
        }
        Ok(key)
    }

    /// Replay entry point: create a database without recording
    fn create_database_replayed(&self, name: &str) -> StoreResult<()> {
        let mut databases = self.databases.write().unwrap();
        if databases.contains_key(name) {
            return Err(StoreError::DatabaseExists(name.to_string()));
        }

        let index = self.engine.open_index()?;
        databases.insert(name.to_string(), Arc::new(RwLock::new(index)));
        Ok(())
    }

    /// Replay entry point: apply a recovered relation with its already
    /// resolved type key, without interning or recording
    fn insert_replayed(&self, relation: &PersistedRelation) -> StoreResult<()> {
        let databases = self.databases.read().unwrap();
        let index = databases
            .get(&relation.database)
            .ok_or_else(|| StoreError::UnknownDatabase(relation.database.clone()))?;

        index.write().unwrap().insert(
            relation.source,
            relation.target,
            relation.type_key,
            relation.weight,
        )?;
        Ok(())
    }

    fn selected_index(&self) -> StoreResult<(String, SharedIndex)> {
        let name = self
            .selected
            .read()
            .unwrap()
            .clone()
            .ok_or(StoreError::NoDatabaseSelected)?;

        let index = self
            .databases
            .read()
            .unwrap()
            .get(&name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownDatabase(name.clone()))?;

        Ok((name, index))
    }
}
