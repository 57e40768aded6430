use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::date_math::{occurrence_date, shift_months, DateWindow, YearMonth};
use super::occurrence::Occurrence;
use super::transaction::{DraftFields, RecurrenceType, Transaction, TransactionDraft};

pub const DEFAULT_MATERIALIZE_HORIZON: u32 = 24;
const MAX_VIRTUAL_MONTHS: usize = 1200;

/// How recurring commitments are represented in storage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RecurringStrategy {
    /// Persist only the template; reads synthesize each month on demand.
    #[default]
    Virtual,
    /// Persist the template plus a fixed horizon of instance rows. Months past the
    /// horizon are still synthesized on read.
    Materialized { horizon_months: u32 },
}

impl RecurringStrategy {
    pub fn materialized() -> Self {
        RecurringStrategy::Materialized {
            horizon_months: DEFAULT_MATERIALIZE_HORIZON,
        }
    }
}

/// Rows to persist for one new entry.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesPlan {
    Single(Transaction),
    Installments(Vec<Transaction>),
    Recurring {
        template: Transaction,
        instances: Vec<Transaction>,
    },
}

impl SeriesPlan {
    /// Id of the row that identifies the whole entry.
    pub fn primary_id(&self) -> Option<Uuid> {
        match self {
            SeriesPlan::Single(txn) => Some(txn.id),
            SeriesPlan::Installments(rows) => rows.first().map(|r| r.id),
            SeriesPlan::Recurring { template, .. } => Some(template.id),
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            SeriesPlan::Single(_) => 1,
            SeriesPlan::Installments(rows) => rows.len(),
            SeriesPlan::Recurring { instances, .. } => 1 + instances.len(),
        }
    }
}

/// Expands validated drafts into the rows each recurrence type persists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesExpander {
    strategy: RecurringStrategy,
}

impl SeriesExpander {
    pub fn new(strategy: RecurringStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> RecurringStrategy {
        self.strategy
    }

    pub fn expand(&self, draft: &TransactionDraft, now: DateTime<Utc>) -> SeriesPlan {
        match draft {
            TransactionDraft::Single(fields) => {
                SeriesPlan::Single(fields.to_transaction(RecurrenceType::Single, now))
            }
            TransactionDraft::Installment {
                fields,
                installments,
            } => SeriesPlan::Installments(expand_installments(fields, *installments, now)),
            TransactionDraft::Recurring(fields) => {
                let mut template = fields.to_transaction(RecurrenceType::Recurring, now);
                template.hide_from_reports = true;
                let instances = match self.strategy {
                    RecurringStrategy::Virtual => Vec::new(),
                    RecurringStrategy::Materialized { horizon_months } => {
                        materialize_horizon(&template, horizon_months)
                    }
                };
                SeriesPlan::Recurring {
                    template,
                    instances,
                }
            }
        }
    }
}

fn expand_installments(fields: &DraftFields, installments: u32, now: DateTime<Utc>) -> Vec<Transaction> {
    let shares = fields.amount.split_even(installments);
    let mut rows = Vec::with_capacity(installments as usize);
    let mut series_id = None;
    for (idx, share) in shares.into_iter().enumerate() {
        let mut row = fields.to_transaction(RecurrenceType::Installment, now);
        row.date = shift_months(fields.date, idx as i32);
        row.amount = share;
        row.installment_total = Some(installments);
        row.installment_current = Some(idx as u32 + 1);
        row.description = format!("{} ({}/{})", fields.description, idx + 1, installments);
        match series_id {
            None => series_id = Some(row.id),
            Some(seed) => row.parent_transaction_id = Some(seed),
        }
        rows.push(row);
    }
    rows
}

fn materialize_horizon(template: &Transaction, horizon_months: u32) -> Vec<Transaction> {
    (0..horizon_months)
        .map(|idx| {
            let mut instance = template.clone();
            instance.id = Uuid::new_v4();
            instance.date = shift_months(template.date, idx as i32);
            instance.parent_transaction_id = Some(template.id);
            instance.hide_from_reports = false;
            instance
        })
        .collect()
}

/// Dates on which an active recurring template falls inside `window`.
pub fn template_dates_in_window(template: &Transaction, window: &DateWindow) -> Vec<NaiveDate> {
    if !template.is_recurring_template() || template.date > window.end {
        return Vec::new();
    }
    let first = window.first_month().max(template.month());
    first
        .months_through(window.last_month())
        .into_iter()
        .take(MAX_VIRTUAL_MONTHS)
        .filter(|month| template.is_active_in(*month))
        .map(|month| occurrence_date(template.date.day(), month))
        .filter(|date| window.contains(*date) && *date >= template.date)
        .collect()
}

/// Virtual occurrences for `template` within `window`, skipping months already
/// represented by a stored instance.
pub fn virtual_occurrences(
    template: &Transaction,
    window: &DateWindow,
    covered: &HashSet<YearMonth>,
) -> Vec<Occurrence> {
    template_dates_in_window(template, window)
        .into_iter()
        .filter(|date| !covered.contains(&YearMonth::of(*date)))
        .map(|date| Occurrence::Virtual {
            origin: template.clone(),
            date,
        })
        .collect()
}

/// Builds the effective set for `window`: stored rows in range (templates excluded),
/// plus one virtual occurrence per active template month that has no stored instance.
///
/// `materialized` lists recurring instance rows from the months the window touches;
/// it only feeds deduplication and may overlap `rows`. The result is sorted by date,
/// most recent first.
pub fn effective_occurrences(
    rows: Vec<Transaction>,
    templates: &[Transaction],
    materialized: &[Transaction],
    window: &DateWindow,
) -> Vec<Occurrence> {
    let mut covered: HashMap<Uuid, HashSet<YearMonth>> = HashMap::new();
    for instance in rows
        .iter()
        .chain(materialized.iter())
        .filter(|txn| txn.is_recurring_instance())
    {
        if let Some(parent) = instance.parent_transaction_id {
            covered.entry(parent).or_default().insert(instance.month());
        }
    }

    let mut seen = HashSet::new();
    let mut result: Vec<Occurrence> = rows
        .into_iter()
        .filter(|txn| !txn.is_recurring_template() && window.contains(txn.date))
        .filter(|txn| seen.insert(txn.id))
        .map(Occurrence::Persisted)
        .collect();

    let empty = HashSet::new();
    let mut template_ids = HashSet::new();
    for template in templates
        .iter()
        .filter(|t| t.is_recurring_template())
        .filter(|t| template_ids.insert(t.id))
    {
        let months = covered.get(&template.id).unwrap_or(&empty);
        result.extend(virtual_occurrences(template, window, months));
    }

    sort_most_recent_first(&mut result);
    result
}

pub fn sort_most_recent_first(occurrences: &mut [Occurrence]) {
    occurrences.sort_by(|a, b| {
        b.date()
            .cmp(&a.date())
            .then_with(|| a.description().cmp(b.description()))
            .then_with(|| a.source().id.cmp(&b.source().id))
    });
}
