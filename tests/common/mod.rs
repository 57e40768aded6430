#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;
use fintrack_core::{
    config::Config,
    core::{FinanceSession, FixedClock},
    errors::{FinanceError, Result},
    ledger::{
        Account, Catalog, RecurrencePlan, RecurringStrategy, Transaction, TransactionInput,
        TransactionKind, TransactionPatch, YearMonth,
    },
    storage::{InMemoryRepository, TransactionFilter, TransactionRepository},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).expect("valid month")
}

pub struct Fixture<R: TransactionRepository = InMemoryRepository> {
    pub session: FinanceSession<R, FixedClock>,
    pub user: Uuid,
    pub account: Uuid,
}

/// A session over an in-memory store whose clock reads `today`.
pub fn fixture(today: NaiveDate, strategy: RecurringStrategy) -> Fixture {
    let user = Uuid::new_v4();
    let mut catalog = Catalog::with_default_goals();
    let account = catalog.add_account(Account::new(user, "Checking"));
    let repo = InMemoryRepository::with_accounts([account]);
    fixture_with(repo, user, account, catalog, today, strategy)
}

pub fn fixture_with<R: TransactionRepository>(
    repo: R,
    user: Uuid,
    account: Uuid,
    catalog: Catalog,
    today: NaiveDate,
    strategy: RecurringStrategy,
) -> Fixture<R> {
    let config = Config {
        recurring_strategy: strategy,
        ..Config::default()
    };
    let session = FinanceSession::with_clock(repo, user, config, catalog, FixedClock::on(today));
    Fixture {
        session,
        user,
        account,
    }
}

impl<R: TransactionRepository> Fixture<R> {
    pub fn expense(&self, description: &str, on: NaiveDate, amount: &str) -> TransactionInput {
        TransactionInput::new(description, on, amount, TransactionKind::Expense, self.account)
    }

    pub fn income(&self, description: &str, on: NaiveDate, amount: &str) -> TransactionInput {
        TransactionInput::new(description, on, amount, TransactionKind::Income, self.account)
            .paid(true)
    }

    pub fn recurring_expense(&self, description: &str, on: NaiveDate, amount: &str) -> Uuid {
        self.session
            .create_transaction(self.expense(description, on, amount).with_plan(RecurrencePlan::Recurring))
            .expect("create recurring expense")
            .primary_id()
            .expect("template id")
    }

    pub fn rows(&self) -> Vec<Transaction> {
        self.session
            .repository()
            .query(&TransactionFilter::for_user(self.user), false)
            .expect("query rows")
    }
}

/// Repository whose batch inserts can be switched to fail, for exercising partial writes.
#[derive(Default)]
pub struct FlakyRepository {
    pub inner: InMemoryRepository,
    pub fail_batches: AtomicBool,
}

impl FlakyRepository {
    pub fn failing_batches() -> Self {
        let repo = Self::default();
        repo.fail_batches.store(true, Ordering::SeqCst);
        repo
    }
}

impl TransactionRepository for FlakyRepository {
    fn query(&self, filter: &TransactionFilter, order_by_date_desc: bool) -> Result<Vec<Transaction>> {
        self.inner.query(filter, order_by_date_desc)
    }

    fn insert_one(&self, txn: Transaction) -> Result<Transaction> {
        self.inner.insert_one(txn)
    }

    fn insert_many(&self, rows: Vec<Transaction>) -> Result<Vec<Transaction>> {
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(FinanceError::ConstraintViolation("batch rejected".into()));
        }
        self.inner.insert_many(rows)
    }

    fn update_by_id(&self, id: Uuid, patch: &TransactionPatch) -> Result<Transaction> {
        self.inner.update_by_id(id, patch)
    }

    fn delete_by_id(&self, id: Uuid) -> Result<()> {
        self.inner.delete_by_id(id)
    }

    fn delete_where(&self, filter: &TransactionFilter) -> Result<usize> {
        self.inner.delete_where(filter)
    }
}
