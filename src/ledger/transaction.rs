use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::date_math::YearMonth;
use crate::currency::{LocaleConfig, Money};
use crate::errors::{FinanceError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    #[default]
    Single,
    Recurring,
    Installment,
}

/// A persisted ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<Uuid>,
    pub description: String,
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_current: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_transaction_id: Option<Uuid>,
    #[serde(default)]
    pub hide_from_reports: bool,
    #[serde(default)]
    pub is_paid: bool,
    /// Months removed from a recurring template's series.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_months: Vec<YearMonth>,
    /// Last month a recurring template is active in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_after: Option<YearMonth>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        account_id: Uuid,
        description: impl Into<String>,
        date: NaiveDate,
        amount: Money,
        kind: TransactionKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_id,
            tag_id: None,
            goal_id: None,
            description: description.into(),
            date,
            amount,
            kind,
            recurrence_type: RecurrenceType::Single,
            installment_total: None,
            installment_current: None,
            parent_transaction_id: None,
            hide_from_reports: false,
            is_paid: false,
            skipped_months: Vec::new(),
            ends_after: None,
            created_at: Utc::now(),
        }
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// The hidden row that stands for a whole recurring commitment.
    pub fn is_recurring_template(&self) -> bool {
        self.recurrence_type == RecurrenceType::Recurring && self.parent_transaction_id.is_none()
    }

    pub fn is_recurring_instance(&self) -> bool {
        self.recurrence_type == RecurrenceType::Recurring && self.parent_transaction_id.is_some()
    }

    pub fn is_installment_seed(&self) -> bool {
        self.recurrence_type == RecurrenceType::Installment && self.parent_transaction_id.is_none()
    }

    /// Identifier shared by every row of the series this row belongs to.
    pub fn series_id(&self) -> Option<Uuid> {
        match self.recurrence_type {
            RecurrenceType::Single => None,
            RecurrenceType::Recurring | RecurrenceType::Installment => {
                Some(self.parent_transaction_id.unwrap_or(self.id))
            }
        }
    }

    /// Whether a recurring template contributes to `month`.
    pub fn is_active_in(&self, month: YearMonth) -> bool {
        if !self.is_recurring_template() || month < self.month() {
            return false;
        }
        if self.ends_after.is_some_and(|end| month > end) {
            return false;
        }
        !self.skipped_months.contains(&month)
    }

    pub fn apply(&mut self, patch: &TransactionPatch) {
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(account_id) = patch.account_id {
            self.account_id = account_id;
        }
        if let Some(tag_id) = patch.tag_id {
            self.tag_id = tag_id;
        }
        if let Some(goal_id) = patch.goal_id {
            self.goal_id = goal_id;
        }
        if let Some(hide) = patch.hide_from_reports {
            self.hide_from_reports = hide;
        }
        if let Some(paid) = patch.is_paid {
            self.is_paid = paid;
        }
        if let Some(skipped) = &patch.skipped_months {
            self.skipped_months = skipped.clone();
        }
        if let Some(ends_after) = patch.ends_after {
            self.ends_after = ends_after;
        }
    }
}

/// Field-by-field update. `None` leaves a field untouched; nested options clear it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub kind: Option<TransactionKind>,
    pub account_id: Option<Uuid>,
    pub tag_id: Option<Option<Uuid>>,
    pub goal_id: Option<Option<Uuid>>,
    pub hide_from_reports: Option<bool>,
    pub is_paid: Option<bool>,
    pub skipped_months: Option<Vec<YearMonth>>,
    pub ends_after: Option<Option<YearMonth>>,
}

impl TransactionPatch {
    pub fn paid(is_paid: bool) -> Self {
        Self {
            is_paid: Some(is_paid),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                return Err(FinanceError::validation("description must not be empty"));
            }
        }
        if let Some(amount) = self.amount {
            if !amount.is_positive() {
                return Err(FinanceError::validation("amount must be positive"));
            }
        }
        Ok(())
    }
}

/// How a new entry repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrencePlan {
    #[default]
    Single,
    Installment {
        count: u32,
    },
    Recurring,
}

/// Raw values captured by an entry form, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub description: String,
    pub date: NaiveDate,
    pub amount: String,
    pub kind: TransactionKind,
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub tag_id: Option<Uuid>,
    #[serde(default)]
    pub goal_id: Option<Uuid>,
    #[serde(default)]
    pub hide_from_reports: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub plan: RecurrencePlan,
}

impl TransactionInput {
    pub fn new(
        description: impl Into<String>,
        date: NaiveDate,
        amount: impl Into<String>,
        kind: TransactionKind,
        account_id: Uuid,
    ) -> Self {
        Self {
            description: description.into(),
            date,
            amount: amount.into(),
            kind,
            account_id: Some(account_id),
            tag_id: None,
            goal_id: None,
            hide_from_reports: false,
            is_paid: false,
            plan: RecurrencePlan::Single,
        }
    }

    pub fn with_plan(mut self, plan: RecurrencePlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_tag(mut self, tag_id: Uuid) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    pub fn with_goal(mut self, goal_id: Uuid) -> Self {
        self.goal_id = Some(goal_id);
        self
    }

    pub fn paid(mut self, is_paid: bool) -> Self {
        self.is_paid = is_paid;
        self
    }

    pub fn hidden(mut self, hide: bool) -> Self {
        self.hide_from_reports = hide;
        self
    }
}

/// Fields common to every validated draft.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftFields {
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub tag_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub description: String,
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: TransactionKind,
    pub hide_from_reports: bool,
    pub is_paid: bool,
}

impl DraftFields {
    pub(crate) fn to_transaction(&self, recurrence_type: RecurrenceType, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            account_id: self.account_id,
            tag_id: self.tag_id,
            goal_id: self.goal_id,
            description: self.description.clone(),
            date: self.date,
            amount: self.amount,
            kind: self.kind,
            recurrence_type,
            installment_total: None,
            installment_current: None,
            parent_transaction_id: None,
            hide_from_reports: self.hide_from_reports,
            is_paid: self.is_paid,
            skipped_months: Vec::new(),
            ends_after: None,
            created_at: now,
        }
    }
}

/// A validated entry; each variant carries only what its recurrence needs.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionDraft {
    Single(DraftFields),
    Installment { fields: DraftFields, installments: u32 },
    Recurring(DraftFields),
}

impl TransactionDraft {
    /// Validates form input. Nothing is written when this fails.
    pub fn from_input(user_id: Uuid, input: TransactionInput, locale: &LocaleConfig) -> Result<Self> {
        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(FinanceError::validation("description is required"));
        }
        let account_id = input
            .account_id
            .ok_or_else(|| FinanceError::validation("account is required"))?;
        let amount = Money::parse(&input.amount, locale)?;
        if !amount.is_positive() {
            return Err(FinanceError::validation("amount must be greater than zero"));
        }
        let fields = DraftFields {
            user_id,
            account_id,
            tag_id: input.tag_id,
            goal_id: input.goal_id,
            description,
            date: input.date,
            amount,
            kind: input.kind,
            hide_from_reports: input.hide_from_reports,
            is_paid: input.is_paid,
        };
        match input.plan {
            RecurrencePlan::Single => Ok(TransactionDraft::Single(fields)),
            RecurrencePlan::Installment { count } if count < 2 => Err(FinanceError::validation(
                format!("installment count must be at least 2, got {count}"),
            )),
            RecurrencePlan::Installment { count } => Ok(TransactionDraft::Installment {
                fields,
                installments: count,
            }),
            RecurrencePlan::Recurring => Ok(TransactionDraft::Recurring(fields)),
        }
    }

    pub fn fields(&self) -> &DraftFields {
        match self {
            TransactionDraft::Single(fields) | TransactionDraft::Recurring(fields) => fields,
            TransactionDraft::Installment { fields, .. } => fields,
        }
    }

    pub fn recurrence_type(&self) -> RecurrenceType {
        match self {
            TransactionDraft::Single(_) => RecurrenceType::Single,
            TransactionDraft::Installment { .. } => RecurrenceType::Installment,
            TransactionDraft::Recurring(_) => RecurrenceType::Recurring,
        }
    }
}
