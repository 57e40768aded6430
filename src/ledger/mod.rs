//! Ledger domain models, date arithmetic, and series expansion rules.

pub mod catalog;
pub mod date_math;
pub mod deletion;
pub mod occurrence;
pub mod recurring;
pub mod transaction;

pub use catalog::{default_goals, validate_goal_config, Account, Catalog, Goal, GoalConfig, Tag};
pub use date_math::{
    checked_shift_months, clamp_day, last_day_of_month, month_key, occurrence_date, parse_date,
    shift_months, DateWindow, YearMonth,
};
pub use deletion::{DeleteScope, DeletionPlan, DeletionStep};
pub use occurrence::{Occurrence, OccurrenceKey};
pub use recurring::{
    effective_occurrences, RecurringStrategy, SeriesExpander, SeriesPlan,
    DEFAULT_MATERIALIZE_HORIZON,
};
pub use transaction::{
    DraftFields, RecurrencePlan, RecurrenceType, Transaction, TransactionDraft, TransactionInput,
    TransactionKind, TransactionPatch,
};
