use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::occurrence::OccurrenceKey;
use super::transaction::{RecurrenceType, Transaction, TransactionPatch};
use crate::errors::{FinanceError, Result};

/// Which part of a series a delete request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteScope {
    OnlyThis,
    ThisAndFuture,
    EntireSeries,
}

/// One repository write needed to carry out a deletion.
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionStep {
    DeleteRow(Uuid),
    /// Rows whose parent is `series_id`, optionally only those dated on or after
    /// `from`. `include_root` also removes the row whose id is `series_id`.
    DeleteSeries {
        series_id: Uuid,
        from: Option<NaiveDate>,
        include_root: bool,
    },
    /// Keeps a recurring template from regenerating removed months.
    UpdateTemplate {
        template_id: Uuid,
        patch: TransactionPatch,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletionPlan {
    pub target: Uuid,
    pub scope: Option<DeleteScope>,
    pub steps: Vec<DeletionStep>,
}

/// Returns the stored id behind `key`, refusing keys that name a virtual occurrence.
pub fn persisted_id(key: &OccurrenceKey) -> Result<Uuid> {
    match key {
        OccurrenceKey::Persisted { id } => Ok(*id),
        OccurrenceKey::Virtual { .. } => Err(FinanceError::NotDeletable(*key)),
    }
}

/// Resolves a delete request for `target`.
///
/// `template` is the recurring template `target` hangs off, when it still exists.
/// Rows outside any series ignore `scope`; series members require one. A template
/// stands for its whole commitment, so it can only be removed together with its
/// instances.
pub fn resolve(
    target: &Transaction,
    template: Option<&Transaction>,
    scope: Option<DeleteScope>,
) -> Result<DeletionPlan> {
    let plan = |steps| DeletionPlan {
        target: target.id,
        scope,
        steps,
    };

    if target.is_recurring_template() {
        return match scope {
            None | Some(DeleteScope::EntireSeries) => Ok(plan(vec![DeletionStep::DeleteSeries {
                series_id: target.id,
                from: None,
                include_root: true,
            }])),
            Some(other) => Err(FinanceError::validation(format!(
                "a recurring template can only be deleted with its entire series, not {other:?}"
            ))),
        };
    }

    let Some(series_id) = target.series_id() else {
        return Ok(plan(vec![DeletionStep::DeleteRow(target.id)]));
    };
    let scope_value = scope.ok_or_else(|| {
        FinanceError::validation(format!(
            "transaction {} belongs to a series; choose only-this, this-and-future or entire-series",
            target.id
        ))
    })?;

    let steps = match (target.recurrence_type, scope_value) {
        (_, DeleteScope::EntireSeries) => vec![DeletionStep::DeleteSeries {
            series_id,
            from: None,
            include_root: true,
        }],
        (RecurrenceType::Recurring, DeleteScope::OnlyThis) => {
            let mut steps = vec![DeletionStep::DeleteRow(target.id)];
            if let Some(template) = template.filter(|t| t.id == series_id) {
                let mut skipped = template.skipped_months.clone();
                if !skipped.contains(&target.month()) {
                    skipped.push(target.month());
                    skipped.sort();
                }
                steps.push(DeletionStep::UpdateTemplate {
                    template_id: template.id,
                    patch: TransactionPatch {
                        skipped_months: Some(skipped),
                        ..TransactionPatch::default()
                    },
                });
            }
            steps
        }
        (RecurrenceType::Recurring, DeleteScope::ThisAndFuture) => {
            let mut steps = vec![DeletionStep::DeleteSeries {
                series_id,
                from: Some(target.date),
                include_root: false,
            }];
            if let Some(template) = template.filter(|t| t.id == series_id) {
                let last_active = target.month().pred();
                let ends_after = match template.ends_after {
                    Some(current) if current < last_active => current,
                    _ => last_active,
                };
                steps.push(DeletionStep::UpdateTemplate {
                    template_id: template.id,
                    patch: TransactionPatch {
                        ends_after: Some(Some(ends_after)),
                        ..TransactionPatch::default()
                    },
                });
            }
            steps
        }
        (_, DeleteScope::OnlyThis) => vec![DeletionStep::DeleteRow(target.id)],
        (_, DeleteScope::ThisAndFuture) => vec![DeletionStep::DeleteSeries {
            series_id,
            from: Some(target.date),
            include_root: target.id == series_id,
        }],
    };
    Ok(plan(steps))
}
