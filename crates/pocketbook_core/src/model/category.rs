//! Category record shared by financial entries and to-do items.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CategoryId = Uuid;

/// Sub-type used by expense categories.
pub const SUB_TYPE_EXPENSE: &str = "EXPENSE";
/// Sub-type used by income categories.
pub const SUB_TYPE_INCOME: &str = "INCOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryKind {
    Financial,
    Todo,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Financial => "FINANCIAL",
            Self::Todo => "TODO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FINANCIAL" => Some(Self::Financial),
            "TODO" => Some(Self::Todo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// Free-form; `EXPENSE`/`INCOME` for financial categories.
    pub sub_type: String,
    /// `#RRGGBB`.
    pub color: String,
    /// Icon key resolved by the UI shell.
    pub icon: String,
}

impl Category {
    pub fn new(
        name: impl Into<String>,
        kind: CategoryKind,
        sub_type: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            sub_type: sub_type.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }

    pub fn is_financial(&self) -> bool {
        self.kind == CategoryKind::Financial
    }

    pub fn is_expense(&self) -> bool {
        self.is_financial() && self.sub_type == SUB_TYPE_EXPENSE
    }

    pub fn is_income(&self) -> bool {
        self.is_financial() && self.sub_type == SUB_TYPE_INCOME
    }
}
