//! Replay fidelity across simulated process restarts
//!
//! Each scope opens the durable log, mutates through the store, and drops
//! everything; the next scope reopens from the same path with a fresh
//! registry, the way a restarted process would.

use relgraph::{
    DurableLog, MemoryEngine, NodeId, Relation, RelationStore, SharedRegistry, TypeKey,
    TypeRegistry,
};
use std::path::Path;
use tempfile::TempDir;

fn node(id: u64) -> NodeId {
    NodeId::new(id)
}

fn open_store(path: &Path, registry: SharedRegistry) -> RelationStore {
    let log = DurableLog::open(path).unwrap();
    RelationStore::open(registry, Box::new(MemoryEngine), Box::new(log)).unwrap()
}

fn sorted_edges(mut edges: Vec<Relation>) -> Vec<Relation> {
    edges.sort_by_key(|r| (r.source, r.target, r.rel_type.clone()));
    edges
}

#[test]
fn test_replay_reproduces_the_edge_set() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = open_store(temp_dir.path(), TypeRegistry::shared());
        store.create_database("d").unwrap();
        store.select_database("d").unwrap();

        store.insert(node(0), node(1), "access", 0.2).unwrap();
        store.insert(node(2), node(1), "access", 0.3).unwrap();
        store.insert(node(1), node(4), "follows", 0.9).unwrap();
        store.remove(node(2), node(1), "access").unwrap();
    }

    let store = open_store(temp_dir.path(), TypeRegistry::shared());
    store.select_database("d").unwrap();

    assert_eq!(store.relation_count().unwrap(), 2);
    assert_eq!(
        sorted_edges(store.forward_edges(node(0)).unwrap()),
        vec![Relation::new(node(0), node(1), "access", 0.2)]
    );
    assert_eq!(
        sorted_edges(store.reverse_edges(node(4)).unwrap()),
        vec![Relation::new(node(1), node(4), "follows", 0.9)]
    );
    assert_eq!(store.reverse_edges(node(1)).unwrap().len(), 1);
}

#[test]
fn test_replay_preserves_the_type_mapping() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = open_store(temp_dir.path(), TypeRegistry::shared());
        store.create_database("d").unwrap();
        store.select_database("d").unwrap();
        store.insert(node(0), node(1), "access", 0.1).unwrap();
        store.insert(node(0), node(2), "follows", 0.2).unwrap();
    }

    let registry = TypeRegistry::shared();
    let store = open_store(temp_dir.path(), registry.clone());
    store.select_database("d").unwrap();

    {
        let registry = registry.lock().unwrap();
        assert_eq!(registry.lookup("access"), Some(TypeKey::new(1)));
        assert_eq!(registry.lookup("follows"), Some(TypeKey::new(2)));
    }

    // Fresh labels continue past the recovered keys
    store.insert(node(0), node(3), "blocks", 0.3).unwrap();
    assert_eq!(
        registry.lock().unwrap().lookup("blocks"),
        Some(TypeKey::new(3))
    );
}

#[test]
fn test_replayed_upsert_keeps_the_last_weight() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = open_store(temp_dir.path(), TypeRegistry::shared());
        store.create_database("d").unwrap();
        store.select_database("d").unwrap();
        store.insert(node(0), node(1), "access", 0.2).unwrap();
        store.insert(node(0), node(1), "access", 0.9).unwrap();
    }

    let store = open_store(temp_dir.path(), TypeRegistry::shared());
    store.select_database("d").unwrap();

    let edges = store.forward_edges(node(0)).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].weight, 0.9);
}

#[test]
fn test_destroyed_database_stays_destroyed() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = open_store(temp_dir.path(), TypeRegistry::shared());
        store.create_database("gone").unwrap();
        store.create_database("kept").unwrap();

        store.select_database("gone").unwrap();
        store.insert(node(0), node(1), "access", 0.2).unwrap();

        store.select_database("kept").unwrap();
        store.insert(node(5), node(6), "access", 0.4).unwrap();

        store.destroy_database("gone").unwrap();
    }

    let store = open_store(temp_dir.path(), TypeRegistry::shared());
    assert_eq!(store.database_names(), vec!["kept".to_string()]);

    store.select_database("kept").unwrap();
    assert_eq!(store.relation_count().unwrap(), 1);

    // Type registrations outlive the databases that used them
    let registry = TypeRegistry::shared();
    drop(store);
    let _store = open_store(temp_dir.path(), registry.clone());
    assert_eq!(registry.lock().unwrap().lookup("access"), Some(TypeKey::new(1)));
}

#[test]
fn test_replay_is_stable_across_repeated_restarts() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = open_store(temp_dir.path(), TypeRegistry::shared());
        store.create_database("d").unwrap();
        store.select_database("d").unwrap();
        store.insert(node(0), node(1), "access", 0.2).unwrap();
    }

    // Replaying must not re-record; state stays identical over restarts
    for _ in 0..3 {
        let store = open_store(temp_dir.path(), TypeRegistry::shared());
        store.select_database("d").unwrap();
        assert_eq!(store.relation_count().unwrap(), 1);
        assert_eq!(
            store.forward_edges(node(0)).unwrap(),
            vec![Relation::new(node(0), node(1), "access", 0.2)]
        );
    }
}
