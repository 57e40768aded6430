pub mod alert_service;
pub mod goal_service;
pub mod summary_service;
pub mod transaction_service;

pub use alert_service::{Alert, AlertKind, AlertService, AlertState};
pub use goal_service::{GoalAllocator, GoalProgress};
pub use summary_service::{
    AggregationEngine, CommitmentPoint, GoalSeries, GoalSeriesPoint, HistoryPoint, MonthAmount,
    MonthCount, MonthlyTotals,
};
pub use transaction_service::TransactionService;
