//! Database: tables, commits, snapshots

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::errors::{StoreError, StoreResult};
use super::snapshot::Snapshot;
use crate::mvcc::{CommitAuthority, CommitId, ReadView, Version, VersionChain};
use crate::value::{Row, Schema, Value};

/// Metadata of one commit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitRecord {
    pub id: CommitId,
    pub committed_at: DateTime<Utc>,
    pub message: String,
}

/// A pending set of writes applied atomically by [`Database::commit`]
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

#[derive(Debug, Clone)]
enum WriteOp {
    Put { table: String, row: Row },
    Delete { table: String, key: Value },
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `row`, replacing any row with the same primary key
    pub fn put(mut self, table: impl Into<String>, row: Row) -> Self {
        self.ops.push(WriteOp::Put {
            table: table.into(),
            row,
        });
        self
    }

    /// Deletes the row whose primary key equals `key`
    pub fn delete(mut self, table: impl Into<String>, key: impl Into<Value>) -> Self {
        self.ops.push(WriteOp::Delete {
            table: table.into(),
            key: key.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// One table's schema and version chains keyed by primary key
#[derive(Debug)]
pub(crate) struct TableData {
    pub(crate) schema: Schema,
    primary_key: usize,
    pub(crate) chains: BTreeMap<String, VersionChain>,
}

#[derive(Debug, Default)]
pub(crate) struct DatabaseState {
    pub(crate) tables: HashMap<String, TableData>,
    authority: CommitAuthority,
    log: Vec<CommitRecord>,
}

impl DatabaseState {
    pub(crate) fn table(&self, name: &str) -> StoreResult<&TableData> {
        self.tables
            .get(&normalize(name))
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }
}

/// Shared handle to the database state
pub(crate) type SharedState = Arc<RwLock<DatabaseState>>;

pub(crate) fn read_state(state: &SharedState) -> StoreResult<RwLockReadGuard<'_, DatabaseState>> {
    state.read().map_err(|_| StoreError::LockPoisoned)
}

fn write_state(state: &SharedState) -> StoreResult<RwLockWriteGuard<'_, DatabaseState>> {
    state.write().map_err(|_| StoreError::LockPoisoned)
}

/// Table names are case-insensitive
pub(crate) fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Renders a primary key value into the chain key
fn chain_key(table: &str, value: &Value) -> StoreResult<String> {
    match value {
        Value::Null => Err(StoreError::NullPrimaryKey(table.to_string())),
        Value::Text(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}

/// In-memory multi-version database.
///
/// Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct Database {
    state: SharedState,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table whose primary key is the column at `primary_key`
    pub fn create_table(&self, name: &str, schema: Schema, primary_key: usize) -> StoreResult<()> {
        if primary_key >= schema.len() {
            return Err(StoreError::InvalidPrimaryKey {
                table: name.to_string(),
                index: primary_key,
            });
        }

        let mut state = write_state(&self.state)?;
        let key = normalize(name);
        if state.tables.contains_key(&key) {
            return Err(StoreError::TableExists(name.to_string()));
        }
        state.tables.insert(
            key,
            TableData {
                schema,
                primary_key,
                chains: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Applies `batch` atomically under a new commit identity.
    ///
    /// Every write is validated before any is applied; a failing batch leaves
    /// the database untouched.
    pub fn commit(&self, batch: WriteBatch, message: impl Into<String>) -> StoreResult<CommitId> {
        let mut state = write_state(&self.state)?;

        let mut staged = Vec::with_capacity(batch.ops.len());
        for op in batch.ops {
            let (table_name, key, row) = match op {
                WriteOp::Put { table, row } => {
                    let data = state.table(&table)?;
                    data.schema
                        .validate(&row)
                        .map_err(|source| StoreError::InvalidRow {
                            table: table.clone(),
                            source,
                        })?;
                    let key = chain_key(&table, &row.values()[data.primary_key])?;
                    (table, key, Some(row))
                }
                WriteOp::Delete { table, key } => {
                    state.table(&table)?;
                    let key = chain_key(&table, &key)?;
                    (table, key, None)
                }
            };
            staged.push((normalize(&table_name), key, row));
        }

        let commit_id = state.authority.next_commit_id();
        for (table, key, row) in staged {
            let Some(data) = state.tables.get_mut(&table) else {
                continue;
            };
            let version = match row {
                Some(row) => Version::with_row(key.clone(), row, commit_id),
                None => Version::with_tombstone(key.clone(), commit_id),
            };
            data.chains
                .entry(key.clone())
                .or_insert_with(|| VersionChain::new(key))
                .push(version);
        }

        let record = CommitRecord {
            id: commit_id,
            committed_at: Utc::now(),
            message: message.into(),
        };
        debug!(commit = %commit_id, message = %record.message, "committed write batch");
        state.log.push(record);

        Ok(commit_id)
    }

    /// Returns the latest commit identity
    pub fn head(&self) -> StoreResult<CommitId> {
        Ok(read_state(&self.state)?.authority.highest())
    }

    /// Returns all commit records, oldest first
    pub fn log(&self) -> StoreResult<Vec<CommitRecord>> {
        Ok(read_state(&self.state)?.log.clone())
    }

    /// Snapshot of the latest commit
    pub fn snapshot(&self) -> StoreResult<Snapshot> {
        let head = self.head()?;
        Ok(Snapshot::new(self.state.clone(), ReadView::new(head)))
    }

    /// Snapshot as of `commit`; `CommitId::ORIGIN` is the empty database
    pub fn snapshot_at(&self, commit: CommitId) -> StoreResult<Snapshot> {
        if commit > self.head()? {
            return Err(StoreError::UnknownCommit(commit));
        }
        Ok(Snapshot::new(self.state.clone(), ReadView::new(commit)))
    }
}
