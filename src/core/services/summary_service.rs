//! Pure reductions over an effective occurrence set.
//!
//! Every function here skips occurrences hidden from reports and is independent of
//! input order.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

use crate::currency::Money;
use crate::ledger::{Goal, Occurrence, RecurrenceType, Transaction, YearMonth};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyTotals {
    /// Paid income only.
    pub income: Money,
    /// Every expense, paid or not.
    pub expenses: Money,
    pub paid_expenses: Money,
    pub unpaid_expenses: Money,
}

impl MonthlyTotals {
    fn record(&mut self, occurrence: &Occurrence) {
        if occurrence.is_income() {
            if occurrence.is_paid() {
                self.income += occurrence.amount();
            }
        } else {
            self.expenses += occurrence.amount();
            if occurrence.is_paid() {
                self.paid_expenses += occurrence.amount();
            } else {
                self.unpaid_expenses += occurrence.amount();
            }
        }
    }

    pub fn balance(&self) -> Money {
        self.income - self.expenses
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryPoint {
    pub month: YearMonth,
    pub label: String,
    pub income: Money,
    pub expenses: Money,
}

impl HistoryPoint {
    fn empty(month: YearMonth) -> Self {
        Self {
            month,
            label: format!("{} {}", month.short_label(), month.year()),
            income: Money::ZERO,
            expenses: Money::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthAmount {
    pub month: YearMonth,
    pub amount: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: YearMonth,
    pub count: usize,
}

/// Recurring versus installment spend in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitmentPoint {
    pub month: YearMonth,
    pub recurring: Money,
    pub installments: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalSeriesPoint {
    pub month: YearMonth,
    pub spent: Money,
    pub limit: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalSeries {
    pub goal_id: Uuid,
    pub name: String,
    pub points: Vec<GoalSeriesPoint>,
}

pub struct AggregationEngine;

impl AggregationEngine {
    pub fn monthly_totals(occurrences: &[Occurrence]) -> MonthlyTotals {
        let mut totals = MonthlyTotals::default();
        for occurrence in reportable(occurrences) {
            totals.record(occurrence);
        }
        totals
    }

    /// Expense totals keyed by tag name; untagged or unknown tags fall under
    /// `uncategorized`.
    pub fn by_tag(
        occurrences: &[Occurrence],
        tag_names: &HashMap<Uuid, String>,
        uncategorized: &str,
    ) -> BTreeMap<String, Money> {
        let mut totals = BTreeMap::new();
        for occurrence in reportable(occurrences).filter(|o| o.is_expense()) {
            let name = occurrence
                .tag_id()
                .and_then(|id| tag_names.get(&id))
                .map(String::as_str)
                .unwrap_or(uncategorized);
            *totals.entry(name.to_string()).or_insert(Money::ZERO) += occurrence.amount();
        }
        totals
    }

    /// One bucket per month in `months`, summed with `monthly_totals` semantics.
    /// Occurrences outside the listed months are ignored.
    pub fn history(occurrences: &[Occurrence], months: &[YearMonth]) -> Vec<HistoryPoint> {
        let mut buckets: BTreeMap<YearMonth, MonthlyTotals> =
            months.iter().map(|m| (*m, MonthlyTotals::default())).collect();
        for occurrence in reportable(occurrences) {
            if let Some(bucket) = buckets.get_mut(&occurrence.month()) {
                bucket.record(occurrence);
            }
        }
        months
            .iter()
            .map(|month| {
                let totals = buckets.get(month).copied().unwrap_or_default();
                HistoryPoint {
                    income: totals.income,
                    expenses: totals.expenses,
                    ..HistoryPoint::empty(*month)
                }
            })
            .collect()
    }

    /// History computed from stored rows without expanding templates: non-recurring rows
    /// fill their own month, and each template adds its amount to every bucket it is
    /// active in. Materialized recurring instances are ignored since the template
    /// already stands for them. Agrees with [`AggregationEngine::history`] over the
    /// expanded set only while no instance has been stored with its own edits: a month
    /// whose paid flag was toggled still reports the template's values here.
    pub fn history_replicated(
        rows: &[Transaction],
        templates: &[Transaction],
        months: &[YearMonth],
    ) -> Vec<HistoryPoint> {
        let mut points: Vec<HistoryPoint> = months.iter().map(|m| HistoryPoint::empty(*m)).collect();
        let index: HashMap<YearMonth, usize> =
            months.iter().enumerate().map(|(idx, m)| (*m, idx)).collect();

        for row in rows
            .iter()
            .filter(|r| r.recurrence_type != RecurrenceType::Recurring && !r.hide_from_reports)
        {
            if let Some(idx) = index.get(&row.month()) {
                add(&mut points[*idx], row);
            }
        }
        for template in templates.iter().filter(|t| t.is_recurring_template()) {
            for point in points.iter_mut() {
                if template.is_active_in(point.month) {
                    add(point, template);
                }
            }
        }
        points
    }

    /// Expense amounts per goal id.
    pub fn goal_spend(occurrences: &[Occurrence]) -> HashMap<Uuid, Money> {
        let mut spend = HashMap::new();
        for occurrence in reportable(occurrences).filter(|o| o.is_expense()) {
            if let Some(goal_id) = occurrence.goal_id() {
                *spend.entry(goal_id).or_insert(Money::ZERO) += occurrence.amount();
            }
        }
        spend
    }

    pub fn commitments(occurrences: &[Occurrence], months: &[YearMonth]) -> Vec<CommitmentPoint> {
        let mut points: BTreeMap<YearMonth, CommitmentPoint> = months
            .iter()
            .map(|m| {
                (
                    *m,
                    CommitmentPoint {
                        month: *m,
                        recurring: Money::ZERO,
                        installments: Money::ZERO,
                    },
                )
            })
            .collect();
        for occurrence in reportable(occurrences) {
            let Some(point) = points.get_mut(&occurrence.month()) else {
                continue;
            };
            match occurrence.recurrence_type() {
                RecurrenceType::Recurring => point.recurring += occurrence.amount(),
                RecurrenceType::Installment if occurrence.installment_total().unwrap_or(0) > 1 => {
                    point.installments += occurrence.amount()
                }
                _ => {}
            }
        }
        months.iter().filter_map(|m| points.get(m).copied()).collect()
    }

    pub fn paid_income_series(occurrences: &[Occurrence], months: &[YearMonth]) -> Vec<MonthAmount> {
        let mut sums = zeroed(months);
        for occurrence in reportable(occurrences).filter(|o| o.is_income() && o.is_paid()) {
            if let Some(sum) = sums.get_mut(&occurrence.month()) {
                *sum += occurrence.amount();
            }
        }
        months
            .iter()
            .map(|m| MonthAmount {
                month: *m,
                amount: sums.get(m).copied().unwrap_or_default(),
            })
            .collect()
    }

    /// Number of expenses per month, the input of the spending heatmap.
    pub fn expense_counts(occurrences: &[Occurrence], months: &[YearMonth]) -> Vec<MonthCount> {
        let mut counts: HashMap<YearMonth, usize> = months.iter().map(|m| (*m, 0)).collect();
        for occurrence in reportable(occurrences).filter(|o| o.is_expense()) {
            if let Some(count) = counts.get_mut(&occurrence.month()) {
                *count += 1;
            }
        }
        months
            .iter()
            .map(|m| MonthCount {
                month: *m,
                count: counts.get(m).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Per goal, monthly spend against a flat limit of `income × percentage`.
    pub fn goal_series(
        occurrences: &[Occurrence],
        goals: &[(&Goal, u8)],
        income: Money,
        months: &[YearMonth],
    ) -> Vec<GoalSeries> {
        goals
            .iter()
            .map(|(goal, percentage)| {
                let limit = income.percent(*percentage);
                let mut spent = zeroed(months);
                for occurrence in reportable(occurrences)
                    .filter(|o| o.is_expense() && o.goal_id() == Some(goal.id))
                {
                    if let Some(sum) = spent.get_mut(&occurrence.month()) {
                        *sum += occurrence.amount();
                    }
                }
                GoalSeries {
                    goal_id: goal.id,
                    name: goal.name.clone(),
                    points: months
                        .iter()
                        .map(|m| GoalSeriesPoint {
                            month: *m,
                            spent: spent.get(m).copied().unwrap_or_default(),
                            limit,
                        })
                        .collect(),
                }
            })
            .collect()
    }

    /// The `limit` most recent reportable occurrences, newest first.
    pub fn recent(occurrences: &[Occurrence], limit: usize) -> Vec<Occurrence> {
        let mut recent: Vec<Occurrence> = reportable(occurrences).cloned().collect();
        crate::ledger::recurring::sort_most_recent_first(&mut recent);
        recent.truncate(limit);
        recent
    }
}

fn reportable(occurrences: &[Occurrence]) -> impl Iterator<Item = &Occurrence> {
    occurrences.iter().filter(|o| o.counts_in_reports())
}

fn add(point: &mut HistoryPoint, txn: &Transaction) {
    if txn.is_income() {
        if txn.is_paid {
            point.income += txn.amount;
        }
    } else {
        point.expenses += txn.amount;
    }
}

fn zeroed(months: &[YearMonth]) -> HashMap<YearMonth, Money> {
    months.iter().map(|m| (*m, Money::ZERO)).collect()
}
