use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::date_math::YearMonth;
use super::transaction::{RecurrenceType, Transaction, TransactionKind};
use crate::currency::Money;

/// One dated appearance of a transaction, either a stored row or a month of a
/// recurring template computed at read time.
#[derive(Debug, Clone, PartialEq)]
pub enum Occurrence {
    Persisted(Transaction),
    Virtual { origin: Transaction, date: NaiveDate },
}

/// Addresses an occurrence without parsing synthetic id strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OccurrenceKey {
    Persisted { id: Uuid },
    Virtual { template_id: Uuid, month: YearMonth },
}

impl OccurrenceKey {
    pub fn persisted(id: Uuid) -> Self {
        OccurrenceKey::Persisted { id }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, OccurrenceKey::Virtual { .. })
    }
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccurrenceKey::Persisted { id } => write!(f, "{id}"),
            OccurrenceKey::Virtual { template_id, month } => write!(f, "{template_id}_{month}"),
        }
    }
}

impl Occurrence {
    pub fn key(&self) -> OccurrenceKey {
        match self {
            Occurrence::Persisted(txn) => OccurrenceKey::Persisted { id: txn.id },
            Occurrence::Virtual { origin, date } => OccurrenceKey::Virtual {
                template_id: origin.id,
                month: YearMonth::of(*date),
            },
        }
    }

    /// The stored row behind this occurrence (the template for virtual ones).
    pub fn source(&self) -> &Transaction {
        match self {
            Occurrence::Persisted(txn) => txn,
            Occurrence::Virtual { origin, .. } => origin,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Occurrence::Virtual { .. })
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Occurrence::Persisted(txn) => txn.date,
            Occurrence::Virtual { date, .. } => *date,
        }
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date())
    }

    pub fn amount(&self) -> Money {
        self.source().amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.source().kind
    }

    pub fn is_income(&self) -> bool {
        self.kind() == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind() == TransactionKind::Expense
    }

    pub fn is_paid(&self) -> bool {
        self.source().is_paid
    }

    pub fn description(&self) -> &str {
        &self.source().description
    }

    pub fn tag_id(&self) -> Option<Uuid> {
        self.source().tag_id
    }

    pub fn goal_id(&self) -> Option<Uuid> {
        self.source().goal_id
    }

    pub fn account_id(&self) -> Uuid {
        self.source().account_id
    }

    pub fn recurrence_type(&self) -> RecurrenceType {
        self.source().recurrence_type
    }

    pub fn installment_total(&self) -> Option<u32> {
        self.source().installment_total
    }

    /// Virtual occurrences always report; the template's own hidden flag only keeps
    /// the template row out of totals.
    pub fn hide_from_reports(&self) -> bool {
        match self {
            Occurrence::Persisted(txn) => txn.hide_from_reports,
            Occurrence::Virtual { .. } => false,
        }
    }

    pub fn counts_in_reports(&self) -> bool {
        !self.hide_from_reports()
    }

    /// Id of the recurring template or installment seed this occurrence came from.
    pub fn origin_id(&self) -> Option<Uuid> {
        match self {
            Occurrence::Persisted(txn) => txn.parent_transaction_id,
            Occurrence::Virtual { origin, .. } => Some(origin.id),
        }
    }

    /// Converts a virtual occurrence into the instance row that would represent it.
    pub fn into_instance(self) -> Transaction {
        match self {
            Occurrence::Persisted(txn) => txn,
            Occurrence::Virtual { origin, date } => {
                let mut instance = origin.clone();
                instance.id = Uuid::new_v4();
                instance.date = date;
                instance.parent_transaction_id = Some(origin.id);
                instance.hide_from_reports = false;
                instance.skipped_months.clear();
                instance.ends_after = None;
                instance
            }
        }
    }
}
