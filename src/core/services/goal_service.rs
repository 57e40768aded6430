use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::currency::Money;
use crate::ledger::Catalog;

/// Budget position of one goal for a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal_id: Uuid,
    pub name: String,
    pub percentage: u8,
    pub ceiling: Money,
    pub spent: Money,
    /// Negative when the goal is overspent.
    pub remaining: Money,
    pub progress_percent: f64,
    pub over_budget: bool,
}

pub struct GoalAllocator;

impl GoalAllocator {
    pub fn ceiling(income: Money, percentage: u8) -> Money {
        income.percent(percentage)
    }

    pub fn progress(goal_id: Uuid, name: impl Into<String>, percentage: u8, income: Money, spent: Money) -> GoalProgress {
        let ceiling = Self::ceiling(income, percentage);
        let remaining = ceiling - spent;
        GoalProgress {
            goal_id,
            name: name.into(),
            percentage,
            ceiling,
            spent,
            remaining,
            progress_percent: spent.ratio_percent(ceiling),
            over_budget: remaining.is_negative(),
        }
    }

    /// Progress for every goal in display order; unconfigured goals get 0%.
    pub fn allocate(catalog: &Catalog, income: Money, spend: &HashMap<Uuid, Money>) -> Vec<GoalProgress> {
        catalog
            .goals_in_order()
            .into_iter()
            .map(|goal| {
                Self::progress(
                    goal.id,
                    goal.name.clone(),
                    catalog.percentage_for(goal.id),
                    income,
                    spend.get(&goal.id).copied().unwrap_or_default(),
                )
            })
            .collect()
    }
}
