//! Spending limit for one category over a time window.
//!
//! # Invariants
//! - `spent` is an accumulated cache; `FinanceRepository::refresh_budget_spent`
//!   recomputes it from transactions.
//! - The window is inclusive on both ends.

use crate::clock::Clock;
use crate::model::category::CategoryId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BudgetId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
    Custom,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
            Self::Custom => "CUSTOM",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" => Some(Self::Yearly),
            "CUSTOM" => Some(Self::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub name: String,
    pub category_id: CategoryId,
    /// Limit for the window.
    pub amount: f64,
    pub spent: f64,
    pub period: BudgetPeriod,
    pub start_date: i64,
    pub end_date: i64,
}

impl Budget {
    pub fn new(
        name: impl Into<String>,
        category_id: CategoryId,
        amount: f64,
        period: BudgetPeriod,
        start_date: i64,
        end_date: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category_id,
            amount,
            spent: 0.0,
            period,
            start_date,
            end_date,
        }
    }

    /// `spent / amount * 100`; zero when the limit is not positive.
    pub fn spent_percentage(&self) -> f64 {
        if self.amount <= 0.0 {
            return 0.0;
        }
        self.spent / self.amount * 100.0
    }

    pub fn remaining_amount(&self) -> f64 {
        self.amount - self.spent
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.amount
    }

    pub fn is_active(&self, clock: &dyn Clock) -> bool {
        self.contains(clock.now_millis())
    }

    pub fn contains(&self, epoch_ms: i64) -> bool {
        (self.start_date..=self.end_date).contains(&epoch_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ValidationError::InvalidAmount(self.amount));
        }
        if self.end_date < self.start_date {
            return Err(ValidationError::InvalidWindow {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}
