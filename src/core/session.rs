//! Consumer-facing facade tying the repository, configuration and per-session state
//! together.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use super::services::{
    AggregationEngine, Alert, AlertService, AlertState, CommitmentPoint, GoalAllocator, GoalProgress,
    GoalSeries, HistoryPoint, MonthAmount, MonthCount, MonthlyTotals, TransactionService,
};
use super::time::{Clock, SystemClock};
use crate::config::Config;
use crate::currency::Money;
use crate::errors::Result;
use crate::ledger::{
    Catalog, DateWindow, DeleteScope, DeletionPlan, GoalConfig, Occurrence, OccurrenceKey,
    RecurrenceType, SeriesExpander, SeriesPlan, Transaction, TransactionDraft, TransactionInput,
    TransactionPatch, YearMonth,
};
use crate::storage::{TransactionFilter, TransactionRepository};

/// Identifies one issued query; only the most recently issued ticket is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryTicket(u64);

/// Hands out tickets so results of superseded queries can be dropped on arrival.
#[derive(Debug, Clone, Default)]
pub struct QueryTracker {
    latest: Arc<AtomicU64>,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> QueryTicket {
        QueryTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub totals: MonthlyTotals,
    pub by_tag: BTreeMap<String, Money>,
    pub history: Vec<HistoryPoint>,
}

/// Everything a dashboard screen renders for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub window: DateWindow,
    pub totals: MonthlyTotals,
    pub by_tag: BTreeMap<String, Money>,
    pub history: Vec<HistoryPoint>,
    pub goals: Vec<GoalProgress>,
    pub recent: Vec<Occurrence>,
    pub commitments: Vec<CommitmentPoint>,
    pub paid_income: Vec<MonthAmount>,
    pub expense_counts: Vec<MonthCount>,
    pub goal_series: Vec<GoalSeries>,
}

/// Optional predicates for transaction searches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub tag_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub description: Option<String>,
    pub is_paid: Option<bool>,
    pub recurrence_type: Option<RecurrenceType>,
}

impl SearchCriteria {
    fn into_filter(self, user_id: Uuid) -> TransactionFilter {
        TransactionFilter {
            tag_id: self.tag_id,
            account_id: self.account_id,
            goal_id: self.goal_id,
            description_contains: self.description.filter(|d| !d.trim().is_empty()),
            is_paid: self.is_paid,
            recurrence_type: self.recurrence_type,
            ..TransactionFilter::for_user(user_id)
        }
    }
}

/// One user's view of the ledger.
pub struct FinanceSession<R, C = SystemClock> {
    repo: R,
    user_id: Uuid,
    config: Config,
    catalog: Catalog,
    clock: C,
    expander: SeriesExpander,
    tracker: QueryTracker,
    alerts: AlertState,
}

impl<R: TransactionRepository> FinanceSession<R, SystemClock> {
    pub fn open(repo: R, user_id: Uuid, config: Config, catalog: Catalog) -> Self {
        Self::with_clock(repo, user_id, config, catalog, SystemClock)
    }
}

impl<R: TransactionRepository, C: Clock> FinanceSession<R, C> {
    pub fn with_clock(repo: R, user_id: Uuid, config: Config, catalog: Catalog, clock: C) -> Self {
        let expander = SeriesExpander::new(config.recurring_strategy);
        Self {
            repo,
            user_id,
            config,
            catalog,
            clock,
            expander,
            tracker: QueryTracker::new(),
            alerts: AlertState::default(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn tracker(&self) -> &QueryTracker {
        &self.tracker
    }

    pub fn alert_state(&self) -> &AlertState {
        &self.alerts
    }

    pub fn set_goal_percentages(&mut self, configs: Vec<GoalConfig>) -> Result<()> {
        self.catalog.set_goal_percentages(configs)?;
        info!(user_id = %self.user_id, "goal percentages updated");
        Ok(())
    }

    /// Stored and virtual occurrences in `window`, newest first.
    pub fn get_effective_transactions(&self, window: &DateWindow) -> Result<Vec<Occurrence>> {
        TransactionService::effective(&self.repo, &TransactionFilter::for_user(self.user_id), window)
    }

    pub fn search(&self, window: &DateWindow, criteria: SearchCriteria) -> Result<Vec<Occurrence>> {
        TransactionService::effective(&self.repo, &criteria.into_filter(self.user_id), window)
    }

    pub fn get_aggregates(&self, window: &DateWindow) -> Result<Aggregates> {
        let occurrences = self.get_effective_transactions(window)?;
        Ok(Aggregates {
            totals: AggregationEngine::monthly_totals(&occurrences),
            by_tag: self.by_tag(&occurrences),
            history: self.history()?,
        })
    }

    pub fn get_goals_progress(&self, window: &DateWindow) -> Result<Vec<GoalProgress>> {
        let occurrences = self.get_effective_transactions(window)?;
        Ok(self.goals_progress(&occurrences))
    }

    /// History buckets ending at the current month, built from the expanded set.
    pub fn history(&self) -> Result<Vec<HistoryPoint>> {
        let window = self.history_window();
        let occurrences = self.get_effective_transactions(&window)?;
        Ok(AggregationEngine::history(&occurrences, &window.months()))
    }

    /// History over the same buckets computed by replicating template amounts instead of
    /// expanding them.
    pub fn history_replicated(&self) -> Result<Vec<HistoryPoint>> {
        let window = self.history_window();
        let user = TransactionFilter::for_user(self.user_id);
        let rows = self.repo.query(&user.clone().within(&window), false)?;
        let templates = self.repo.query(&user.templates_through(window.end), false)?;
        Ok(AggregationEngine::history_replicated(&rows, &templates, &window.months()))
    }

    pub fn create_transaction(&self, input: TransactionInput) -> Result<SeriesPlan> {
        let draft = TransactionDraft::from_input(self.user_id, input, &self.config.locale)?;
        TransactionService::create(&self.repo, &self.expander, &draft, self.clock.now())
    }

    pub fn update_transaction(&self, id: Uuid, patch: &TransactionPatch) -> Result<Transaction> {
        TransactionService::update(&self.repo, id, patch)
    }

    pub fn delete_transaction(&self, key: OccurrenceKey, scope: Option<DeleteScope>) -> Result<DeletionPlan> {
        TransactionService::delete(&self.repo, key, scope)
    }

    pub fn set_paid(&self, key: OccurrenceKey, is_paid: bool) -> Result<Transaction> {
        TransactionService::set_paid(&self.repo, key, is_paid)
    }

    /// Starts a dashboard query, superseding any query issued earlier.
    pub fn begin_query(&self) -> QueryTicket {
        self.tracker.issue()
    }

    /// Builds the dashboard for `window`, or `None` when `ticket` was superseded while
    /// the data was being read.
    pub fn dashboard(&self, window: &DateWindow, ticket: QueryTicket) -> Result<Option<DashboardSnapshot>> {
        let occurrences = self.get_effective_transactions(window)?;
        let history_window = self.history_window();
        let yearly = self.get_effective_transactions(&history_window)?;
        let months = history_window.months();

        let totals = AggregationEngine::monthly_totals(&occurrences);
        let goals: Vec<_> = self
            .catalog
            .goals_in_order()
            .into_iter()
            .map(|goal| (goal, self.catalog.percentage_for(goal.id)))
            .collect();
        let snapshot = DashboardSnapshot {
            window: *window,
            totals,
            by_tag: self.by_tag(&occurrences),
            history: AggregationEngine::history(&yearly, &months),
            goals: self.goals_progress(&occurrences),
            recent: AggregationEngine::recent(&occurrences, self.config.recent_limit),
            commitments: AggregationEngine::commitments(&yearly, &months),
            paid_income: AggregationEngine::paid_income_series(&yearly, &months),
            expense_counts: AggregationEngine::expense_counts(&yearly, &months),
            goal_series: AggregationEngine::goal_series(&yearly, &goals, totals.income, &months),
        };

        if !self.tracker.is_current(ticket) {
            debug!(?ticket, "dashboard result superseded; discarding");
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    /// Alerts newly triggered by `month`'s totals.
    pub fn goal_alerts(&mut self, month: YearMonth) -> Result<Vec<Alert>> {
        let occurrences = self.get_effective_transactions(&DateWindow::month(month))?;
        let totals = AggregationEngine::monthly_totals(&occurrences);
        let alerts = AlertService::evaluate(
            month,
            &totals,
            self.config.alert_threshold_percent,
            &mut self.alerts,
        );
        for alert in &alerts {
            info!(kind = ?alert.kind, %month, expenses = %alert.expenses, income = %alert.income, "goal alert");
        }
        Ok(alerts)
    }

    pub fn due_on(&self, date: NaiveDate) -> Result<Vec<Occurrence>> {
        let window = DateWindow::new(date, date)?;
        let occurrences = self.get_effective_transactions(&window)?;
        Ok(AlertService::due_on(&occurrences, date))
    }

    fn history_window(&self) -> DateWindow {
        DateWindow::trailing_months(YearMonth::of(self.clock.today()), self.config.history_months)
    }

    fn by_tag(&self, occurrences: &[Occurrence]) -> BTreeMap<String, Money> {
        AggregationEngine::by_tag(
            occurrences,
            &self.catalog.tag_names(),
            &self.config.uncategorized_label,
        )
    }

    fn goals_progress(&self, occurrences: &[Occurrence]) -> Vec<GoalProgress> {
        let income = AggregationEngine::monthly_totals(occurrences).income;
        GoalAllocator::allocate(&self.catalog, income, &AggregationEngine::goal_spend(occurrences))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let tracker = QueryTracker::new();
        let first = tracker.issue();
        assert!(tracker.is_current(first));
        let second = tracker.issue();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn cloned_trackers_share_state() {
        let tracker = QueryTracker::new();
        let clone = tracker.clone();
        let ticket = tracker.issue();
        clone.issue();
        assert!(!tracker.is_current(ticket));
    }

    #[test]
    fn blank_description_is_not_a_filter() {
        let user = Uuid::new_v4();
        let filter = SearchCriteria {
            description: Some("  ".into()),
            ..SearchCriteria::default()
        }
        .into_filter(user);
        assert_eq!(filter, TransactionFilter::for_user(user));
    }
}
