//! Money movement record.
//!
//! # Responsibility
//! - Hold one income or expense entry with its category reference.
//! - Derive display amount, tag list and "is today" from stored fields.
//!
//! # Invariants
//! - `amount` is stored unsigned; the sign comes from `kind`.
//! - `tags` is a free-text comma list; `tag_list()` is its only parser.

use crate::clock::Clock;
use crate::model::category::CategoryId;
use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest amount accepted by `is_valid_amount`.
pub const MIN_AMOUNT: f64 = 0.01;
/// Largest amount accepted by `is_valid_amount`.
pub const MAX_AMOUNT: f64 = 99_999_999.99;

// Half-width and full-width commas are both common in CJK input.
static TAG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,，]").expect("valid tag separator regex"));

pub type TransactionId = Uuid;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "EXPENSE",
            Self::Income => "INCOME",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EXPENSE" => Some(Self::Expense),
            "INCOME" => Some(Self::Income),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Positive magnitude.
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: CategoryId,
    pub title: String,
    pub description: Option<String>,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    /// Comma separated, e.g. `"餐饮, 午餐"`.
    pub tags: Option<String>,
}

impl Transaction {
    /// Creates a transaction with a generated id and no description/tags.
    pub fn new(
        amount: f64,
        kind: TransactionKind,
        category_id: CategoryId,
        title: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            kind,
            category_id,
            title: title.into(),
            description: None,
            timestamp,
            tags: None,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_valid_amount(&self) -> bool {
        self.amount.is_finite() && (MIN_AMOUNT..=MAX_AMOUNT).contains(&self.amount)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_valid_amount() {
            return Err(ValidationError::InvalidAmount(self.amount));
        }
        Ok(())
    }

    /// Amount with sign applied: negative for expenses.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Expense => -self.amount,
            TransactionKind::Income => self.amount,
        }
    }

    /// Display string, always with a fractional part (`100.0`, `-12.5`).
    pub fn formatted_amount(&self) -> String {
        match self.kind {
            TransactionKind::Expense => format!("-{:?}", self.amount),
            TransactionKind::Income => format!("{:?}", self.amount),
        }
    }

    /// Parses `tags` into trimmed, non-empty entries in stored order.
    pub fn tag_list(&self) -> Vec<String> {
        let Some(raw) = self.tags.as_deref() else {
            return Vec::new();
        };
        TAG_SEPARATOR_RE
            .split(raw)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Replaces `tags` from a list; an empty list clears the field.
    pub fn set_tags<S: AsRef<str>>(&mut self, tags: &[S]) {
        let joined = tags
            .iter()
            .map(|tag| tag.as_ref().trim())
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        self.tags = if joined.is_empty() { None } else { Some(joined) };
    }

    /// Whether `timestamp` falls on the clock's current calendar day.
    pub fn is_today(&self, clock: &dyn Clock) -> bool {
        match (clock.local_date(self.timestamp), clock.today()) {
            (Some(day), Some(today)) => day == today,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Transaction, TransactionKind, MAX_AMOUNT, MIN_AMOUNT};
    use crate::clock::FixedClock;
    use uuid::Uuid;

    fn sample(amount: f64, kind: TransactionKind) -> Transaction {
        Transaction::new(amount, kind, Uuid::new_v4(), "lunch", 0)
    }

    #[test]
    fn formatted_amount_negates_expenses_only() {
        assert_eq!(
            sample(100.0, TransactionKind::Expense).formatted_amount(),
            "-100.0"
        );
        assert_eq!(
            sample(100.0, TransactionKind::Income).formatted_amount(),
            "100.0"
        );
        assert_eq!(sample(12.5, TransactionKind::Expense).signed_amount(), -12.5);
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        assert!(sample(MIN_AMOUNT, TransactionKind::Income).is_valid_amount());
        assert!(sample(MAX_AMOUNT, TransactionKind::Income).is_valid_amount());
        assert!(!sample(0.0, TransactionKind::Income).is_valid_amount());
        assert!(!sample(-5.0, TransactionKind::Expense).is_valid_amount());
        assert!(!sample(MAX_AMOUNT * 2.0, TransactionKind::Expense).is_valid_amount());
        assert!(!sample(f64::NAN, TransactionKind::Expense).is_valid_amount());
        assert!(sample(0.0, TransactionKind::Expense).validate().is_err());
    }

    #[test]
    fn tag_list_splits_trims_and_keeps_order() {
        let mut tx = sample(30.0, TransactionKind::Expense);
        tx.tags = Some("餐饮, 午餐".to_string());
        assert_eq!(tx.tag_list(), vec!["餐饮", "午餐"]);

        tx.tags = Some(" a ,，b,, ".to_string());
        assert_eq!(tx.tag_list(), vec!["a", "b"]);

        tx.tags = None;
        assert!(tx.tag_list().is_empty());
    }

    #[test]
    fn set_tags_joins_and_clears() {
        let mut tx = sample(30.0, TransactionKind::Expense);
        tx.set_tags(&["餐饮", " 午餐 "]);
        assert_eq!(tx.tags.as_deref(), Some("餐饮, 午餐"));

        tx.set_tags::<&str>(&[]);
        assert_eq!(tx.tags, None);
    }

    #[test]
    fn is_today_compares_calendar_days() {
        // 2026-06-15T10:00:00Z
        let now = 1_781_517_600_000;
        let clock = FixedClock::at(now);
        let mut tx = sample(1.0, TransactionKind::Income);

        tx.timestamp = now - 3_600_000;
        assert!(tx.is_today(&clock));

        tx.timestamp = now - 11 * 3_600_000;
        assert!(!tx.is_today(&clock));
    }
}
