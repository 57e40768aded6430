pub mod json_backend;
pub mod memory;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    errors::Result,
    ledger::{DateWindow, RecurrenceType, Transaction, TransactionPatch},
};

/// Row-level persistence boundary for transactions.
///
/// Implementations must apply `insert_many` all-or-nothing and report absent ids on
/// update/delete as `FinanceError::NotFound`.
pub trait TransactionRepository: Send + Sync {
    fn query(&self, filter: &TransactionFilter, order_by_date_desc: bool) -> Result<Vec<Transaction>>;
    fn insert_one(&self, txn: Transaction) -> Result<Transaction>;
    fn insert_many(&self, rows: Vec<Transaction>) -> Result<Vec<Transaction>>;
    fn update_by_id(&self, id: Uuid, patch: &TransactionPatch) -> Result<Transaction>;
    fn delete_by_id(&self, id: Uuid) -> Result<()>;
    fn delete_where(&self, filter: &TransactionFilter) -> Result<usize>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        let filter = TransactionFilter::default().ids(vec![id]);
        Ok(self.query(&filter, false)?.into_iter().next())
    }
}

/// Conjunction of optional predicates over stored rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub user_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_type_not: Option<RecurrenceType>,
    pub parent_transaction_id_is_null: Option<bool>,
    pub parent_transaction_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub description_contains: Option<String>,
    pub is_paid: Option<bool>,
    pub hide_from_reports: Option<bool>,
    pub ids: Option<Vec<Uuid>>,
}

impl TransactionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn within(mut self, window: &DateWindow) -> Self {
        self.date_from = Some(window.start);
        self.date_to = Some(window.end);
        self
    }

    pub fn from_date(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn to_date(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn recurrence(mut self, recurrence_type: RecurrenceType) -> Self {
        self.recurrence_type = Some(recurrence_type);
        self
    }

    pub fn excluding_recurrence(mut self, recurrence_type: RecurrenceType) -> Self {
        self.recurrence_type_not = Some(recurrence_type);
        self
    }

    pub fn roots_only(mut self, roots: bool) -> Self {
        self.parent_transaction_id_is_null = Some(roots);
        self
    }

    pub fn child_of(mut self, parent: Uuid) -> Self {
        self.parent_transaction_id = Some(parent);
        self
    }

    pub fn tag(mut self, tag_id: Uuid) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn goal(mut self, goal_id: Uuid) -> Self {
        self.goal_id = Some(goal_id);
        self
    }

    pub fn description_contains(mut self, needle: impl Into<String>) -> Self {
        self.description_contains = Some(needle.into());
        self
    }

    pub fn paid(mut self, is_paid: bool) -> Self {
        self.is_paid = Some(is_paid);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hide_from_reports = Some(hidden);
        self
    }

    pub fn ids(mut self, ids: Vec<Uuid>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// False when the recurrence predicates rule out recurring rows, and with them
    /// every template.
    pub fn admits_recurring(&self) -> bool {
        self.recurrence_type.map_or(true, |rt| rt == RecurrenceType::Recurring)
            && self.recurrence_type_not != Some(RecurrenceType::Recurring)
    }

    /// Templates matching the non-date predicates; template dates are checked against
    /// the window during expansion instead.
    pub fn templates_through(&self, end: NaiveDate) -> Self {
        Self {
            date_from: None,
            date_to: Some(end),
            recurrence_type: Some(RecurrenceType::Recurring),
            recurrence_type_not: None,
            parent_transaction_id_is_null: Some(true),
            parent_transaction_id: None,
            hide_from_reports: None,
            ids: None,
            ..self.clone()
        }
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        if self.user_id.is_some_and(|user| txn.user_id != user) {
            return false;
        }
        if self.date_from.is_some_and(|from| txn.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| txn.date > to) {
            return false;
        }
        if self.recurrence_type.is_some_and(|rt| txn.recurrence_type != rt) {
            return false;
        }
        if self.recurrence_type_not.is_some_and(|rt| txn.recurrence_type == rt) {
            return false;
        }
        if self
            .parent_transaction_id_is_null
            .is_some_and(|is_null| txn.parent_transaction_id.is_none() != is_null)
        {
            return false;
        }
        if self
            .parent_transaction_id
            .is_some_and(|parent| txn.parent_transaction_id != Some(parent))
        {
            return false;
        }
        if self.tag_id.is_some_and(|tag| txn.tag_id != Some(tag)) {
            return false;
        }
        if self.account_id.is_some_and(|account| txn.account_id != account) {
            return false;
        }
        if self.goal_id.is_some_and(|goal| txn.goal_id != Some(goal)) {
            return false;
        }
        if let Some(needle) = &self.description_contains {
            if !txn
                .description
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if self.is_paid.is_some_and(|paid| txn.is_paid != paid) {
            return false;
        }
        if self
            .hide_from_reports
            .is_some_and(|hidden| txn.hide_from_reports != hidden)
        {
            return false;
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&txn.id) {
                return false;
            }
        }
        true
    }
}

/// Orders rows by date (newest first when `descending`), breaking ties by creation time.
pub(crate) fn sort_rows(rows: &mut [Transaction], descending: bool) {
    rows.sort_by(|a, b| {
        let ordering = a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

pub use json_backend::{JsonStore, StoreSnapshot, STORE_SCHEMA_VERSION};
pub use memory::InMemoryRepository;
