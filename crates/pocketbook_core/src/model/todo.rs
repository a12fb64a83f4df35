//! To-do item record.

use crate::clock::Clock;
use crate::model::category::CategoryId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TodoId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub title: String,
    pub category_id: CategoryId,
    pub description: Option<String>,
    pub priority: Priority,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
    pub is_completed: bool,
    /// Percentage in `0..=100`.
    pub progress: u8,
    /// Unix epoch milliseconds; ordering key for newest-first lists.
    pub created_at: i64,
}

impl TodoItem {
    /// Creates an open item with medium priority and zero progress.
    pub fn new(title: impl Into<String>, category_id: CategoryId, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            category_id,
            description: None,
            priority: Priority::default(),
            due_date: None,
            is_completed: false,
            progress: 0,
            created_at,
        }
    }

    /// Due date strictly in the past and not yet completed.
    pub fn is_overdue(&self, clock: &dyn Clock) -> bool {
        match self.due_date {
            Some(due) => !self.is_completed && due < clock.now_millis(),
            None => false,
        }
    }

    pub fn is_valid_progress(&self) -> bool {
        self.progress <= 100
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_valid_progress() {
            return Err(ValidationError::InvalidProgress(self.progress));
        }
        Ok(())
    }

    pub fn complete(&mut self) {
        self.is_completed = true;
        self.progress = 100;
    }

    /// Clears the completion flag; progress is kept below 100.
    pub fn reopen(&mut self) {
        self.is_completed = false;
        self.progress = self.progress.min(99);
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, TodoItem};
    use crate::clock::FixedClock;
    use uuid::Uuid;

    const NOW: i64 = 1_781_517_600_000;

    #[test]
    fn new_item_defaults_to_medium_priority() {
        let item = TodoItem::new("write report", Uuid::new_v4(), NOW);
        assert_eq!(item.priority, Priority::Medium);
        assert!(!item.is_completed);
        assert_eq!(item.progress, 0);
    }

    #[test]
    fn overdue_requires_past_due_and_open() {
        let clock = FixedClock::at(NOW);
        let mut item = TodoItem::new("pay rent", Uuid::new_v4(), NOW);
        assert!(!item.is_overdue(&clock));

        item.due_date = Some(NOW - 1_000);
        assert!(item.is_overdue(&clock));

        item.due_date = Some(NOW);
        assert!(!item.is_overdue(&clock));

        item.due_date = Some(NOW - 1_000);
        item.complete();
        assert!(!item.is_overdue(&clock));
    }

    #[test]
    fn progress_validation_and_transitions() {
        let mut item = TodoItem::new("gym", Uuid::new_v4(), NOW);
        item.progress = 101;
        assert!(!item.is_valid_progress());
        assert!(item.validate().is_err());

        item.complete();
        assert_eq!(item.progress, 100);
        item.reopen();
        assert!(!item.is_completed);
        assert_eq!(item.progress, 99);
    }
}
