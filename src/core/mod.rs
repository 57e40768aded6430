//! Services, session facade and supporting utilities built on the ledger types.

pub mod services;
pub mod session;
pub mod time;
pub mod utils;

pub use session::{Aggregates, DashboardSnapshot, FinanceSession, QueryTicket, QueryTracker, SearchCriteria};
pub use time::{Clock, FixedClock, SystemClock};
