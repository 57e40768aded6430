use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::{Mutex, RwLock},
};
use uuid::Uuid;

use crate::{
    core::utils::PathResolver,
    errors::{FinanceError, Result},
    ledger::{Catalog, Transaction, TransactionPatch},
    utils::persistence::{read_json, write_json_atomic},
};

use super::{memory::InMemoryRepository, TransactionFilter, TransactionRepository};

pub const STORE_SCHEMA_VERSION: u32 = 1;

/// On-disk layout of a ledger file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// File-backed repository. Every successful write rewrites the whole snapshot
/// atomically; reads are served from memory.
///
/// A write whose snapshot cannot be saved is undone in memory as well, so callers
/// never observe rows that an `Err` reported as not written.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    inner: InMemoryRepository,
    catalog: RwLock<Catalog>,
    writes: Mutex<()>,
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot: StoreSnapshot = read_json(&path)?.unwrap_or_else(|| StoreSnapshot {
            schema_version: STORE_SCHEMA_VERSION,
            catalog: Catalog::with_default_goals(),
            ..StoreSnapshot::default()
        });
        if snapshot.schema_version > STORE_SCHEMA_VERSION {
            return Err(FinanceError::Storage(format!(
                "ledger `{}` is from a newer schema version ({})",
                path.display(),
                snapshot.schema_version
            )));
        }
        let inner = InMemoryRepository::from_rows(snapshot.transactions);
        for account in &snapshot.catalog.accounts {
            inner.register_account(account.id)?;
        }
        tracing::debug!(path = %path.display(), "opened json ledger");
        Ok(Self {
            path,
            inner,
            catalog: RwLock::new(snapshot.catalog),
            writes: Mutex::new(()),
        })
    }

    /// Opens `ledger.json` under the data directory (`$FINTRACK_HOME` or `~/.fintrack`).
    pub fn open_default() -> Result<Self> {
        Self::open(PathResolver::store_file_in(&PathResolver::base_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> Result<Catalog> {
        Ok(self
            .catalog
            .read()
            .map_err(|_| FinanceError::Storage("catalog lock poisoned".into()))?
            .clone())
    }

    /// Replaces the stored catalog; its accounts become the only ones rows may reference.
    /// Nothing changes in memory unless the new snapshot was saved.
    pub fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        let _guard = self.lock_writes()?;
        self.persist(catalog.clone(), self.inner.snapshot()?)?;
        for account in &catalog.accounts {
            self.inner.register_account(account.id)?;
        }
        *self
            .catalog
            .write()
            .map_err(|_| FinanceError::Storage("catalog lock poisoned".into()))? = catalog.clone();
        Ok(())
    }

    /// Applies `write` to the in-memory rows and saves the result, restoring the
    /// previous rows when saving fails.
    fn commit<T>(&self, write: impl FnOnce(&InMemoryRepository) -> Result<T>) -> Result<T> {
        let _guard = self.lock_writes()?;
        let before = self.inner.snapshot()?;
        let outcome = write(&self.inner)?;
        if let Err(err) = self.persist(self.catalog()?, self.inner.snapshot()?) {
            tracing::warn!(path = %self.path.display(), error = %err, "ledger save failed; write rolled back");
            self.inner.replace_rows(before)?;
            return Err(err);
        }
        Ok(outcome)
    }

    fn lock_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.writes
            .lock()
            .map_err(|_| FinanceError::Storage("write lock poisoned".into()))
    }

    fn persist(&self, catalog: Catalog, transactions: Vec<Transaction>) -> Result<()> {
        let snapshot = StoreSnapshot {
            schema_version: STORE_SCHEMA_VERSION,
            saved_at: Some(Utc::now()),
            catalog,
            transactions,
        };
        write_json_atomic(&snapshot, &self.path)
    }
}

impl TransactionRepository for JsonStore {
    fn query(&self, filter: &TransactionFilter, order_by_date_desc: bool) -> Result<Vec<Transaction>> {
        self.inner.query(filter, order_by_date_desc)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        self.inner.find_by_id(id)
    }

    fn insert_one(&self, txn: Transaction) -> Result<Transaction> {
        self.commit(|rows| rows.insert_one(txn))
    }

    fn insert_many(&self, batch: Vec<Transaction>) -> Result<Vec<Transaction>> {
        self.commit(|rows| rows.insert_many(batch))
    }

    fn update_by_id(&self, id: Uuid, patch: &TransactionPatch) -> Result<Transaction> {
        self.commit(|rows| rows.update_by_id(id, patch))
    }

    fn delete_by_id(&self, id: Uuid) -> Result<()> {
        self.commit(|rows| rows.delete_by_id(id))
    }

    fn delete_where(&self, filter: &TransactionFilter) -> Result<usize> {
        self.commit(|rows| rows.delete_where(filter))
    }
}
