//! Core data layer for Pocketbook, a personal finance and to-do app.
//! This crate owns the entities, local SQLite storage and preferences;
//! presentation code talks to it through `FinanceRepository`.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod observe;
pub mod prefs;
pub mod repository;
pub mod seed;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig, LogConfig};
pub use db::{Database, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::budget::{Budget, BudgetId, BudgetPeriod};
pub use model::category::{Category, CategoryId, CategoryKind};
pub use model::todo::{Priority, TodoId, TodoItem};
pub use model::transaction::{Transaction, TransactionId, TransactionKind};
pub use model::user_settings::UserSettings;
pub use model::ValidationError;
pub use observe::{CancelToken, ChangeNotifier, LiveQuery, Table};
pub use prefs::{JsonFileBackend, MemoryBackend, PrefError, PreferenceBackend, PreferenceStore};
pub use repository::{FinanceRepository, PeriodSummary, RepositoryOptions, SeedOutcome};
pub use store::{
    BudgetFilter, CategoryFilter, Page, RepoError, RepoResult, SortOrder, TimeRange, TodoFilter,
    TransactionFilter,
};

/// Minimal health-check API for shell integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
