//! RocksDB command log backend
//!
//! Four logical tables, one column family each: `meta` holds the
//! initialization marker, `types` the label -> key registrations,
//! `databases` the live database names, and `relations` one row per live
//! relation. Each recorded command maps to row inserts or deletes committed
//! in a single synchronous write batch, so an interrupted process neither
//! loses a committed command nor replays a partial one.
//!
//! Removed rows are physically deleted (destroying a database deletes its
//! name row and all its relation rows in the same batch), which keeps the
//! tables at net state: recovery is a straight read of the three data
//! tables, and relation order no longer matters because rows are keyed by
//! their identity triple.

use super::{Command, CommandLog, LogError, LogResult, PersistedRelation, RecoveredState};
use crate::graph::types::{NodeId, TypeKey};
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const CF_META: &str = "meta";
const CF_TYPES: &str = "types";
const CF_DATABASES: &str = "databases";
const CF_RELATIONS: &str = "relations";

const INIT_MARKER: &[u8] = b"init";
const LOG_FORMAT_VERSION: u32 = 1;

/// Serialized type registration row
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredType {
    label: String,
    key: u16,
}

/// Serialized relation row
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRelation {
    database: String,
    source: u64,
    target: u64,
    type_key: u16,
    weight: f64,
}

/// RocksDB-backed durable command log
pub struct DurableLog {
    db: DB,
    /// Sync every commit to disk before returning
    sync_writes: bool,
}

impl DurableLog {
    /// Open or create a log at `path`
    pub fn open(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        // Command rows are small; keep the write path lean
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);
        opts.set_min_write_buffer_number_to_merge(1);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
            ColumnFamilyDescriptor::new(CF_TYPES, Options::default()),
            ColumnFamilyDescriptor::new(CF_DATABASES, Options::default()),
            ColumnFamilyDescriptor::new(CF_RELATIONS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        let log = Self {
            db,
            sync_writes: true,
        };
        log.check_init_marker()?;

        info!("Opened command log at {:?}", path);
        Ok(log)
    }

    /// Toggle synchronous commits. Sync is on by default; turning it off
    /// trades durability of the last few commands for bulk-load speed.
    pub fn set_sync_mode(&mut self, sync: bool) {
        self.sync_writes = sync;
        debug!("Command log sync mode: {}", sync);
    }

    fn check_init_marker(&self) -> LogResult<()> {
        let cf = self.cf(CF_META)?;

        match self.db.get_cf(&cf, INIT_MARKER)? {
            Some(value) => {
                let version: u32 = bincode::deserialize(&value)?;
                if version != LOG_FORMAT_VERSION {
                    return Err(LogError::Corrupt(format!(
                        "unsupported log format version {}",
                        version
                    )));
                }
            }
            None => {
                let value = bincode::serialize(&LOG_FORMAT_VERSION)?;
                self.db.put_cf(&cf, INIT_MARKER, value)?;
            }
        }

        Ok(())
    }

    fn cf(&self, name: &str) -> LogResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LogError::ColumnFamily(name.to_string()))
    }

    /// Relation row key: database-prefixed, fixed-width hex so a database's
    /// rows group together lexicographically
    fn relation_row_key(database: &str, source: NodeId, target: NodeId, type_key: TypeKey) -> Vec<u8> {
        format!(
            "{}:{:016x}:{:016x}:{:04x}",
            database,
            source.as_u64(),
            target.as_u64(),
            type_key.as_u16()
        )
        .into_bytes()
    }

    /// Row keys of every relation belonging to `database`
    fn relation_keys_of(&self, database: &str) -> LogResult<Vec<Vec<u8>>> {
        let cf = self.cf(CF_RELATIONS)?;
        let prefix = format!("{}:", database);

        let mut keys = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            // The prefix scan over-matches names sharing a prefix; the
            // row's own database field decides.
            let stored: StoredRelation = bincode::deserialize(&value)?;
            if stored.database == database {
                keys.push(key.to_vec());
            }
        }

        Ok(keys)
    }
}

impl CommandLog for DurableLog {
    fn record(&self, command: &Command) -> LogResult<()> {
        let mut batch = WriteBatch::default();

        match command {
            Command::CreateDatabase { name } => {
                let cf = self.cf(CF_DATABASES)?;
                batch.put_cf(&cf, name.as_bytes(), b"");
            }
            Command::DestroyDatabase { name } => {
                let cf = self.cf(CF_DATABASES)?;
                batch.delete_cf(&cf, name.as_bytes());

                let relations_cf = self.cf(CF_RELATIONS)?;
                for key in self.relation_keys_of(name)? {
                    batch.delete_cf(&relations_cf, key);
                }
            }
            Command::RegisterType { label, key } => {
                let cf = self.cf(CF_TYPES)?;
                let stored = StoredType {
                    label: label.clone(),
                    key: key.as_u16(),
                };
                batch.put_cf(&cf, label.as_bytes(), bincode::serialize(&stored)?);
            }
            Command::InsertRelation {
                database,
                source,
                target,
                type_key,
                weight,
            } => {
                let cf = self.cf(CF_RELATIONS)?;
                let stored = StoredRelation {
                    database: database.clone(),
                    source: source.as_u64(),
                    target: target.as_u64(),
                    type_key: type_key.as_u16(),
                    weight: *weight,
                };
                let key = Self::relation_row_key(database, *source, *target, *type_key);
                batch.put_cf(&cf, key, bincode::serialize(&stored)?);
            }
            Command::RemoveRelation {
                database,
                source,
                target,
                type_key,
            } => {
                let cf = self.cf(CF_RELATIONS)?;
                let key = Self::relation_row_key(database, *source, *target, *type_key);
                batch.delete_cf(&cf, key);
            }
        }

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db.write_opt(batch, &write_opts)?;

        debug!("Recorded {:?}", command);
        Ok(())
    }

    fn load(&self) -> LogResult<RecoveredState> {
        let mut state = RecoveredState::default();

        let cf = self.cf(CF_DATABASES)?;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item?;
            let name = String::from_utf8(key.to_vec())
                .map_err(|_| LogError::Corrupt("database name is not UTF-8".to_string()))?;
            state.databases.push(name);
        }

        let cf = self.cf(CF_TYPES)?;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            let stored: StoredType = bincode::deserialize(&value)?;
            state.types.push((stored.label, TypeKey::new(stored.key)));
        }

        let cf = self.cf(CF_RELATIONS)?;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            let stored: StoredRelation = bincode::deserialize(&value)?;
            state.relations.push(PersistedRelation {
                database: stored.database,
                source: NodeId::new(stored.source),
                target: NodeId::new(stored.target),
                type_key: TypeKey::new(stored.type_key),
                weight: stored.weight,
            });
        }

        info!(
            "Loaded {} databases, {} types, {} relations from command log",
            state.databases.len(),
            state.types.len(),
            state.relations.len()
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn insert_command(database: &str, source: u64, target: u64, key: u16, weight: f64) -> Command {
        Command::InsertRelation {
            database: database.to_string(),
            source: NodeId::new(source),
            target: NodeId::new(target),
            type_key: TypeKey::new(key),
            weight,
        }
    }

    #[test]
    fn test_open_empty_log() {
        let temp_dir = TempDir::new().unwrap();
        let log = DurableLog::open(temp_dir.path()).unwrap();
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_record_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let log = DurableLog::open(temp_dir.path()).unwrap();

        log.record(&Command::CreateDatabase {
            name: "d".to_string(),
        })
        .unwrap();
        log.record(&Command::RegisterType {
            label: "access".to_string(),
            key: TypeKey::new(1),
        })
        .unwrap();
        log.record(&insert_command("d", 0, 1, 1, 0.2)).unwrap();

        let state = log.load().unwrap();
        assert_eq!(state.databases, vec!["d".to_string()]);
        assert_eq!(state.types, vec![("access".to_string(), TypeKey::new(1))]);
        assert_eq!(state.relations.len(), 1);
        assert_eq!(state.relations[0].weight, 0.2);
    }

    #[test]
    fn test_insert_is_an_upsert_row() {
        let temp_dir = TempDir::new().unwrap();
        let log = DurableLog::open(temp_dir.path()).unwrap();

        log.record(&insert_command("d", 0, 1, 1, 0.2)).unwrap();
        log.record(&insert_command("d", 0, 1, 1, 0.9)).unwrap();

        let state = log.load().unwrap();
        assert_eq!(state.relations.len(), 1);
        assert_eq!(state.relations[0].weight, 0.9);
    }

    #[test]
    fn test_remove_deletes_the_row() {
        let temp_dir = TempDir::new().unwrap();
        let log = DurableLog::open(temp_dir.path()).unwrap();

        log.record(&insert_command("d", 0, 1, 1, 0.2)).unwrap();
        log.record(&Command::RemoveRelation {
            database: "d".to_string(),
            source: NodeId::new(0),
            target: NodeId::new(1),
            type_key: TypeKey::new(1),
        })
        .unwrap();

        assert!(log.load().unwrap().relations.is_empty());
    }

    #[test]
    fn test_destroy_deletes_only_that_database() {
        let temp_dir = TempDir::new().unwrap();
        let log = DurableLog::open(temp_dir.path()).unwrap();

        log.record(&Command::CreateDatabase {
            name: "d".to_string(),
        })
        .unwrap();
        log.record(&Command::CreateDatabase {
            name: "keep".to_string(),
        })
        .unwrap();
        log.record(&insert_command("d", 0, 1, 1, 0.2)).unwrap();
        log.record(&insert_command("keep", 5, 6, 1, 0.4)).unwrap();

        log.record(&Command::DestroyDatabase {
            name: "d".to_string(),
        })
        .unwrap();

        let state = log.load().unwrap();
        assert_eq!(state.databases, vec!["keep".to_string()]);
        assert_eq!(state.relations.len(), 1);
        assert_eq!(state.relations[0].database, "keep");
    }

    #[test]
    fn test_destroy_spares_prefix_sharing_names() {
        let temp_dir = TempDir::new().unwrap();
        let log = DurableLog::open(temp_dir.path()).unwrap();

        log.record(&insert_command("a", 0, 1, 1, 0.1)).unwrap();
        log.record(&insert_command("a:b", 0, 1, 1, 0.2)).unwrap();

        log.record(&Command::DestroyDatabase {
            name: "a".to_string(),
        })
        .unwrap();

        let state = log.load().unwrap();
        assert_eq!(state.relations.len(), 1);
        assert_eq!(state.relations[0].database, "a:b");
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let log = DurableLog::open(temp_dir.path()).unwrap();
            log.record(&Command::CreateDatabase {
                name: "d".to_string(),
            })
            .unwrap();
            log.record(&insert_command("d", 0, 1, 1, 0.2)).unwrap();
        }

        let log = DurableLog::open(temp_dir.path()).unwrap();
        let state = log.load().unwrap();
        assert_eq!(state.databases, vec!["d".to_string()]);
        assert_eq!(state.relations.len(), 1);
    }
}
