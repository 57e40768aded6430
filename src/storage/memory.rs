use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::{sort_rows, TransactionFilter, TransactionRepository};
use crate::errors::{FinanceError, Result};
use crate::ledger::{Transaction, TransactionPatch};

/// Repository kept entirely in memory.
///
/// When accounts are registered, inserts and updates referencing any other account are
/// rejected the way a foreign key would reject them.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    rows: RwLock<Vec<Transaction>>,
    known_accounts: RwLock<Option<HashSet<Uuid>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            known_accounts: RwLock::new(Some(accounts.into_iter().collect())),
        }
    }

    pub fn from_rows(rows: Vec<Transaction>) -> Self {
        Self {
            rows: RwLock::new(rows),
            known_accounts: RwLock::new(None),
        }
    }

    pub fn register_account(&self, account_id: Uuid) -> Result<()> {
        let mut known = self
            .known_accounts
            .write()
            .map_err(|_| poisoned("accounts"))?;
        known.get_or_insert_with(HashSet::new).insert(account_id);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Vec<Transaction>> {
        Ok(self.read()?.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Swaps in `rows` wholesale, used to undo a write whose persistence failed.
    pub(crate) fn replace_rows(&self, rows: Vec<Transaction>) -> Result<()> {
        *self.write()? = rows;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Transaction>>> {
        self.rows.read().map_err(|_| poisoned("transactions"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Transaction>>> {
        self.rows.write().map_err(|_| poisoned("transactions"))
    }

    fn check_account(&self, account_id: Uuid) -> Result<()> {
        let known = self
            .known_accounts
            .read()
            .map_err(|_| poisoned("accounts"))?;
        match known.as_ref() {
            Some(accounts) if !accounts.contains(&account_id) => Err(
                FinanceError::ConstraintViolation(format!("unknown account {account_id}")),
            ),
            _ => Ok(()),
        }
    }

    fn check_insert(&self, existing: &[Transaction], rows: &[Transaction]) -> Result<()> {
        let mut ids: HashSet<Uuid> = existing.iter().map(|r| r.id).collect();
        for row in rows {
            if !ids.insert(row.id) {
                return Err(FinanceError::ConstraintViolation(format!(
                    "duplicate transaction id {}",
                    row.id
                )));
            }
            self.check_account(row.account_id)?;
        }
        Ok(())
    }
}

impl TransactionRepository for InMemoryRepository {
    fn query(&self, filter: &TransactionFilter, order_by_date_desc: bool) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .read()?
            .iter()
            .filter(|txn| filter.matches(txn))
            .cloned()
            .collect();
        sort_rows(&mut rows, order_by_date_desc);
        Ok(rows)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        Ok(self.read()?.iter().find(|txn| txn.id == id).cloned())
    }

    fn insert_one(&self, txn: Transaction) -> Result<Transaction> {
        let mut rows = self.write()?;
        self.check_insert(&rows, std::slice::from_ref(&txn))?;
        rows.push(txn.clone());
        Ok(txn)
    }

    fn insert_many(&self, batch: Vec<Transaction>) -> Result<Vec<Transaction>> {
        let mut rows = self.write()?;
        self.check_insert(&rows, &batch)?;
        rows.extend(batch.iter().cloned());
        Ok(batch)
    }

    fn update_by_id(&self, id: Uuid, patch: &TransactionPatch) -> Result<Transaction> {
        if let Some(account_id) = patch.account_id {
            self.check_account(account_id)?;
        }
        let mut rows = self.write()?;
        let row = rows
            .iter_mut()
            .find(|txn| txn.id == id)
            .ok_or(FinanceError::NotFound(id))?;
        row.apply(patch);
        Ok(row.clone())
    }

    fn delete_by_id(&self, id: Uuid) -> Result<()> {
        let mut rows = self.write()?;
        let pos = rows
            .iter()
            .position(|txn| txn.id == id)
            .ok_or(FinanceError::NotFound(id))?;
        rows.remove(pos);
        Ok(())
    }

    fn delete_where(&self, filter: &TransactionFilter) -> Result<usize> {
        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|txn| !filter.matches(txn));
        Ok(before - rows.len())
    }
}

fn poisoned(what: &str) -> FinanceError {
    FinanceError::Storage(format!("{what} lock poisoned"))
}
