use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    core::utils::PathResolver,
    currency::LocaleConfig,
    errors::{FinanceError, Result},
    ledger::RecurringStrategy,
    utils::persistence::{read_json, write_json_atomic},
};

/// Per-installation preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: LocaleConfig,
    pub currency: String,
    pub recurring_strategy: RecurringStrategy,
    /// Number of monthly buckets in history charts.
    pub history_months: u32,
    pub uncategorized_label: String,
    /// Share of income spent at which a near-limit alert fires.
    pub alert_threshold_percent: u8,
    pub recent_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: LocaleConfig::default(),
            currency: "USD".into(),
            recurring_strategy: RecurringStrategy::Virtual,
            history_months: 12,
            uncategorized_label: "Uncategorized".into(),
            alert_threshold_percent: 90,
            recent_limit: 5,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.history_months == 0 {
            return Err(FinanceError::Config("history_months must be at least 1".into()));
        }
        if self.alert_threshold_percent == 0 || self.alert_threshold_percent > 100 {
            return Err(FinanceError::Config(format!(
                "alert_threshold_percent must be within 1..=100, got {}",
                self.alert_threshold_percent
            )));
        }
        if self.locale.decimal_separator == self.locale.grouping_separator {
            return Err(FinanceError::Config(
                "decimal and grouping separators must differ".into(),
            ));
        }
        if let RecurringStrategy::Materialized { horizon_months: 0 } = self.recurring_strategy {
            return Err(FinanceError::Config(
                "materialized horizon must be at least one month".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Self {
        Self {
            path: PathResolver::config_file_in(&base),
        }
    }

    /// Loads the saved configuration, falling back to defaults when none exists.
    pub fn load(&self) -> Result<Config> {
        let config = read_json::<Config>(&self.path)?.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        write_json_atomic(config, &self.path)?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
