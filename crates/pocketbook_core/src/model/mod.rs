//! Persisted entity records and their derived-value helpers.
//!
//! # Responsibility
//! - Define the five persisted records (transactions, to-dos, categories,
//!   budgets, user settings).
//! - Keep derived computations pure and clock-injected.
//!
//! # Invariants
//! - Every record is identified by a stable id that is never reused.
//! - Field validity is opt-in: callers run `validate()` before persisting.
//! - Cross-entity references are plain ids; no ownership, no cascades.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod budget;
pub mod category;
pub mod todo;
pub mod transaction;
pub mod user_settings;

/// Opt-in validation failure for entity fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Amount is non-finite or outside `[MIN_AMOUNT, MAX_AMOUNT]`.
    InvalidAmount(f64),
    /// Progress percentage is above 100.
    InvalidProgress(u8),
    /// Time window end precedes its start.
    InvalidWindow { start: i64, end: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAmount(amount) => write!(f, "amount out of range: {amount}"),
            Self::InvalidProgress(progress) => {
                write!(f, "progress must be within 0..=100, got {progress}")
            }
            Self::InvalidWindow { start, end } => {
                write!(f, "end ({end}) must be >= start ({start})")
            }
        }
    }
}

impl Error for ValidationError {}
