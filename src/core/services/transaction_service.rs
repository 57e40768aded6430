//! Business logic for writing transactions and reading the effective set.

use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{FinanceError, Result};
use crate::ledger::deletion::{self, DeleteScope, DeletionPlan, DeletionStep};
use crate::ledger::{
    effective_occurrences, occurrence_date, DateWindow, Occurrence, OccurrenceKey, RecurrenceType,
    SeriesExpander, SeriesPlan, Transaction, TransactionDraft, TransactionPatch, YearMonth,
};
use crate::storage::{TransactionFilter, TransactionRepository};

/// Validated write operations over a [`TransactionRepository`].
pub struct TransactionService;

impl TransactionService {
    /// Persists the rows a draft expands into and returns the plan that was written.
    ///
    /// Installment batches go through one atomic `insert_many`. A recurring template is
    /// written before its materialized instances; if the instances fail the template
    /// stays behind and the error is reported as `PartialSeriesFailure`.
    pub fn create<R>(
        repo: &R,
        expander: &SeriesExpander,
        draft: &TransactionDraft,
        now: DateTime<Utc>,
    ) -> Result<SeriesPlan>
    where
        R: TransactionRepository + ?Sized,
    {
        let plan = expander.expand(draft, now);
        match &plan {
            SeriesPlan::Single(txn) => {
                repo.insert_one(txn.clone())?;
            }
            SeriesPlan::Installments(rows) => {
                repo.insert_many(rows.clone())?;
            }
            SeriesPlan::Recurring {
                template,
                instances,
            } => {
                repo.insert_one(template.clone())?;
                if !instances.is_empty() {
                    repo.insert_many(instances.clone()).map_err(|source| {
                        warn!(template_id = %template.id, error = %source, "recurring instances failed after template insert");
                        FinanceError::PartialSeriesFailure {
                            template_id: template.id,
                            source: Box::new(source),
                        }
                    })?;
                }
            }
        }
        info!(
            recurrence = ?draft.recurrence_type(),
            rows = plan.row_count(),
            primary_id = ?plan.primary_id(),
            "transaction created"
        );
        Ok(plan)
    }

    /// Applies a field-by-field update. Series are never re-expanded.
    pub fn update<R>(repo: &R, id: Uuid, patch: &TransactionPatch) -> Result<Transaction>
    where
        R: TransactionRepository + ?Sized,
    {
        patch.validate()?;
        if patch.is_empty() {
            return repo.find_by_id(id)?.ok_or(FinanceError::NotFound(id));
        }
        let updated = repo.update_by_id(id, patch)?;
        debug!(%id, "transaction updated");
        Ok(updated)
    }

    /// Resolves and executes a delete request, returning the executed plan.
    pub fn delete<R>(repo: &R, key: OccurrenceKey, scope: Option<DeleteScope>) -> Result<DeletionPlan>
    where
        R: TransactionRepository + ?Sized,
    {
        let id = deletion::persisted_id(&key)?;
        let target = repo.find_by_id(id)?.ok_or(FinanceError::NotFound(id))?;
        let template = match target.parent_transaction_id {
            Some(parent) if target.recurrence_type == RecurrenceType::Recurring => repo.find_by_id(parent)?,
            _ => None,
        };
        let plan = deletion::resolve(&target, template.as_ref(), scope)?;
        let base = TransactionFilter::for_user(target.user_id);
        let mut removed = 0usize;
        for step in &plan.steps {
            match step {
                DeletionStep::DeleteRow(row) => {
                    repo.delete_by_id(*row)?;
                    removed += 1;
                }
                DeletionStep::DeleteSeries {
                    series_id,
                    from,
                    include_root,
                } => {
                    let mut children = base.clone().child_of(*series_id);
                    children.date_from = *from;
                    removed += repo.delete_where(&children)?;
                    if *include_root {
                        let mut root = base.clone().ids(vec![*series_id]);
                        root.date_from = *from;
                        removed += repo.delete_where(&root)?;
                    }
                }
                DeletionStep::UpdateTemplate { template_id, patch } => {
                    repo.update_by_id(*template_id, patch)?;
                }
            }
        }
        info!(occurrence = %key, ?scope, removed, "transaction deleted");
        Ok(plan)
    }

    /// Sets the paid flag on one occurrence.
    ///
    /// A virtual occurrence is materialized into an instance row carrying the flag; if
    /// its month already has a stored instance, that row is updated instead.
    pub fn set_paid<R>(repo: &R, key: OccurrenceKey, is_paid: bool) -> Result<Transaction>
    where
        R: TransactionRepository + ?Sized,
    {
        let patch = TransactionPatch::paid(is_paid);
        match key {
            OccurrenceKey::Persisted { id } => {
                let updated = repo.update_by_id(id, &patch)?;
                debug!(%id, is_paid, "paid flag updated");
                Ok(updated)
            }
            OccurrenceKey::Virtual { template_id, month } => {
                let template = repo
                    .find_by_id(template_id)?
                    .ok_or(FinanceError::NotFound(template_id))?;
                if !template.is_active_in(month) {
                    return Err(FinanceError::validation(format!(
                        "template {template_id} has no occurrence in {month}"
                    )));
                }
                if let Some(existing) = Self::stored_instance(repo, &template, month)? {
                    return repo.update_by_id(existing.id, &patch);
                }
                let mut instance = Occurrence::Virtual {
                    date: occurrence_date(template.date.day(), month),
                    origin: template,
                }
                .into_instance();
                instance.is_paid = is_paid;
                let saved = repo.insert_one(instance)?;
                info!(occurrence = %key, instance_id = %saved.id, is_paid, "virtual occurrence materialized");
                Ok(saved)
            }
        }
    }

    /// Effective occurrences in `window` for the rows `criteria` selects.
    ///
    /// `criteria` supplies the user and any search predicates; its date bounds are
    /// replaced by the window. Templates are matched by the same predicates so virtual
    /// occurrences honour them too; criteria that exclude recurring rows skip them.
    pub fn effective<R>(repo: &R, criteria: &TransactionFilter, window: &DateWindow) -> Result<Vec<Occurrence>>
    where
        R: TransactionRepository + ?Sized,
    {
        let rows = repo.query(&criteria.clone().within(window), true)?;
        if !criteria.admits_recurring() {
            return Ok(effective_occurrences(rows, &[], &[], window));
        }
        let templates = repo.query(&criteria.templates_through(window.end), false)?;
        let covering = window.covering_months();
        let materialized = repo.query(
            &TransactionFilter {
                user_id: criteria.user_id,
                ..TransactionFilter::default()
            }
            .within(&covering)
            .recurrence(RecurrenceType::Recurring)
            .roots_only(false),
            false,
        )?;
        Ok(effective_occurrences(rows, &templates, &materialized, window))
    }

    fn stored_instance<R>(repo: &R, template: &Transaction, month: YearMonth) -> Result<Option<Transaction>>
    where
        R: TransactionRepository + ?Sized,
    {
        let filter = TransactionFilter::for_user(template.user_id)
            .child_of(template.id)
            .within(&DateWindow::month(month));
        Ok(repo.query(&filter, false)?.into_iter().next())
    }
}
