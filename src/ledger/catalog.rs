use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FinanceError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

impl Account {
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
        }
    }
}

/// A budget envelope receiving a share of income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub name: String,
    pub display_order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalConfig {
    pub goal_id: Uuid,
    pub percentage: u8,
}

static DEFAULT_GOALS: Lazy<Vec<Goal>> = Lazy::new(|| {
    [
        "Financial Freedom",
        "Fixed Costs",
        "Comfort",
        "Goals",
        "Pleasures",
        "Knowledge",
    ]
    .iter()
    .enumerate()
    .map(|(idx, name)| Goal {
        id: Uuid::from_u128(0x601_0000 + idx as u128 + 1),
        name: (*name).to_string(),
        display_order: idx as u32 + 1,
    })
    .collect()
});

pub fn default_goals() -> &'static [Goal] {
    &DEFAULT_GOALS
}

/// Checks a percentage split before it is saved: every share within 0..=100 and the
/// shares summing to exactly 100.
pub fn validate_goal_config(configs: &[GoalConfig]) -> Result<()> {
    if let Some(bad) = configs.iter().find(|c| c.percentage > 100) {
        return Err(FinanceError::validation(format!(
            "goal {} has percentage {} outside 0..=100",
            bad.goal_id, bad.percentage
        )));
    }
    let total: u32 = configs.iter().map(|c| c.percentage as u32).sum();
    if total != 100 {
        return Err(FinanceError::validation(format!(
            "goal percentages must sum to exactly 100, got {total}"
        )));
    }
    Ok(())
}

/// Accounts, tags, goals and their percentage split for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub accounts: Vec<Account>,
    pub tags: Vec<Tag>,
    pub goals: Vec<Goal>,
    pub goal_configs: Vec<GoalConfig>,
}

impl Catalog {
    pub fn with_default_goals() -> Self {
        Self {
            goals: default_goals().to_vec(),
            ..Self::default()
        }
    }

    pub fn add_account(&mut self, account: Account) -> Uuid {
        let id = account.id;
        self.accounts.push(account);
        id
    }

    pub fn add_tag(&mut self, tag: Tag) -> Uuid {
        let id = tag.id;
        self.tags.push(tag);
        id
    }

    pub fn rename_tag(&mut self, id: Uuid, name: impl Into<String>) -> Result<()> {
        let tag = self
            .tags
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(FinanceError::NotFound(id))?;
        tag.name = name.into();
        Ok(())
    }

    pub fn remove_tag(&mut self, id: Uuid) -> Option<Tag> {
        let pos = self.tags.iter().position(|t| t.id == id)?;
        Some(self.tags.remove(pos))
    }

    pub fn remove_account(&mut self, id: Uuid) -> Option<Account> {
        let pos = self.accounts.iter().position(|a| a.id == id)?;
        Some(self.accounts.remove(pos))
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn tag_name(&self, id: Uuid) -> Option<&str> {
        self.tags.iter().find(|t| t.id == id).map(|t| t.name.as_str())
    }

    pub fn tag_names(&self) -> HashMap<Uuid, String> {
        self.tags.iter().map(|t| (t.id, t.name.clone())).collect()
    }

    pub fn goals_in_order(&self) -> Vec<&Goal> {
        let mut goals: Vec<&Goal> = self.goals.iter().collect();
        goals.sort_by_key(|g| g.display_order);
        goals
    }

    pub fn percentage_for(&self, goal_id: Uuid) -> u8 {
        self.goal_configs
            .iter()
            .find(|c| c.goal_id == goal_id)
            .map(|c| c.percentage)
            .unwrap_or(0)
    }

    /// Replaces the whole split; rejected unless it is a valid 100% allocation over
    /// known goals.
    pub fn set_goal_percentages(&mut self, configs: Vec<GoalConfig>) -> Result<()> {
        validate_goal_config(&configs)?;
        if let Some(unknown) = configs
            .iter()
            .find(|c| !self.goals.iter().any(|g| g.id == c.goal_id))
        {
            return Err(FinanceError::NotFound(unknown.goal_id));
        }
        self.goal_configs = configs;
        Ok(())
    }
}
