use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::summary_service::MonthlyTotals;
use crate::currency::Money;
use crate::ledger::{Occurrence, YearMonth};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Expenses reached the configured share of income.
    NearLimit,
    /// Expenses reached or passed income.
    Exceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub month: YearMonth,
    pub income: Money,
    pub expenses: Money,
}

/// Which alerts already fired, so each fires at most once per month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    fired: HashSet<(YearMonth, AlertKind)>,
}

impl AlertState {
    pub fn has_fired(&self, month: YearMonth, kind: AlertKind) -> bool {
        self.fired.contains(&(month, kind))
    }

    /// Records the alert; false when it had already fired.
    pub fn mark(&mut self, month: YearMonth, kind: AlertKind) -> bool {
        self.fired.insert((month, kind))
    }

    pub fn clear_month(&mut self, month: YearMonth) {
        self.fired.retain(|(m, _)| *m != month);
    }
}

pub struct AlertService;

impl AlertService {
    /// Alerts newly due for `month`. Nothing fires while the month has no expenses.
    pub fn evaluate(
        month: YearMonth,
        totals: &MonthlyTotals,
        threshold_percent: u8,
        state: &mut AlertState,
    ) -> Vec<Alert> {
        if !totals.expenses.is_positive() {
            return Vec::new();
        }
        let mut alerts = Vec::new();
        let mut fire = |kind| {
            if state.mark(month, kind) {
                alerts.push(Alert {
                    kind,
                    month,
                    income: totals.income,
                    expenses: totals.expenses,
                });
            }
        };
        if totals.expenses >= totals.income.percent(threshold_percent) {
            fire(AlertKind::NearLimit);
        }
        if totals.expenses >= totals.income {
            fire(AlertKind::Exceeded);
        }
        alerts
    }

    /// Reportable occurrences dated exactly `date`.
    pub fn due_on(occurrences: &[Occurrence], date: NaiveDate) -> Vec<Occurrence> {
        occurrences
            .iter()
            .filter(|o| o.counts_in_reports() && o.date() == date)
            .cloned()
            .collect()
    }
}
