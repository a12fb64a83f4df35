//! Repository facade: the single entry point for presentation code.
//!
//! # Responsibility
//! - Aggregate the per-entity stores, the default-data generator and the
//!   preference store behind one cheap-to-clone handle.
//! - Seed default categories on first run.
//! - Publish change notifications after committed writes.
//! - Dispatch work off the caller's thread with best-effort cancellation.
//!
//! # Invariants
//! - Store errors propagate unchanged; nothing is swallowed or retried.
//! - Change notifications are sent only after the write returned `Ok`.
//! - The connection lock is never held across an `.await`.

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::db::Database;
use crate::model::user_settings::UserSettings;
use crate::observe::{CancelToken, ChangeNotifier, Table};
use crate::prefs::{JsonFileBackend, PreferenceStore};
use crate::seed;
use crate::store::{
    CategoryStore, RepoError, RepoResult, SettingsStore, SqliteCategoryStore,
    SqliteSettingsStore, DEFAULT_MAX_PAGE_SIZE,
};
use log::{debug, info};
use rusqlite::{Connection, TransactionBehavior};
use std::sync::{Arc, Weak};
use std::time::Instant;

mod finance;
mod tasks;

pub use finance::PeriodSummary;

/// Result of the first-run guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Categories table was empty; this many defaults were inserted.
    Seeded(usize),
    AlreadySeeded,
}

/// Construction options that are not part of persisted state.
#[derive(Clone)]
pub struct RepositoryOptions {
    pub clock: Arc<dyn Clock>,
    pub max_page_size: u32,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Shared handle over the local store and preferences.
#[derive(Clone)]
pub struct FinanceRepository {
    inner: Arc<Inner>,
}

/// Non-owning handle held by live queries; storage closes once every
/// `FinanceRepository` clone is gone.
#[derive(Clone)]
pub(crate) struct WeakFinanceRepository {
    inner: Weak<Inner>,
}

impl WeakFinanceRepository {
    pub(crate) fn upgrade(&self) -> Option<FinanceRepository> {
        self.inner.upgrade().map(|inner| FinanceRepository { inner })
    }
}

struct Inner {
    db: Database,
    prefs: PreferenceStore,
    clock: Arc<dyn Clock>,
    changes: ChangeNotifier,
    max_page_size: u32,
}

impl FinanceRepository {
    pub fn new(db: Database, prefs: PreferenceStore) -> Self {
        Self::with_options(db, prefs, RepositoryOptions::default())
    }

    pub fn with_options(db: Database, prefs: PreferenceStore, options: RepositoryOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                db,
                prefs,
                clock: options.clock,
                changes: ChangeNotifier::new(),
                max_page_size: options.max_page_size.max(1),
            }),
        }
    }

    /// Opens storage described by `config` with the system clock.
    pub fn open(config: &CoreConfig) -> RepoResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(config: &CoreConfig, clock: Arc<dyn Clock>) -> RepoResult<Self> {
        config.validate()?;
        let db = match &config.database_path {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        let prefs = match &config.preferences_path {
            Some(path) => PreferenceStore::open(JsonFileBackend::new(path))?,
            None => PreferenceStore::in_memory(),
        };
        Ok(Self::with_options(
            db,
            prefs,
            RepositoryOptions {
                clock,
                max_page_size: config.max_page_size,
            },
        ))
    }

    /// In-memory database and preferences; handy for tests and previews.
    pub fn in_memory() -> RepoResult<Self> {
        Ok(Self::new(Database::open_in_memory()?, PreferenceStore::in_memory()))
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.inner.prefs
    }

    pub fn changes(&self) -> &ChangeNotifier {
        &self.inner.changes
    }

    pub fn max_page_size(&self) -> u32 {
        self.inner.max_page_size
    }

    pub(crate) fn downgrade(&self) -> WeakFinanceRepository {
        WeakFinanceRepository {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// First-run guard: seeds default categories when none exist.
    ///
    /// The emptiness check and the inserts share one immediate transaction,
    /// so concurrent or repeated calls insert the defaults exactly once.
    /// Also clears the first-launch preference.
    pub fn initialize(&self) -> RepoResult<SeedOutcome> {
        let started_at = Instant::now();
        let outcome = {
            let mut conn = self.inner.db.lock()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let outcome = {
                let store = SqliteCategoryStore::new(&tx);
                if store.count()? == 0 {
                    SeedOutcome::Seeded(store.insert_all(&seed::default_categories())?)
                } else {
                    SeedOutcome::AlreadySeeded
                }
            };
            tx.commit()?;
            outcome
        };

        if let SeedOutcome::Seeded(_) = outcome {
            self.inner.changes.notify(Table::Categories);
        }
        if self.inner.prefs.first_launch() {
            self.inner.prefs.set_first_launch(false)?;
        }

        info!(
            "event=repo_initialize module=repository status=ok outcome={:?} duration_ms={}",
            outcome,
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }

    /// Settings row for `user_id`, or defaults when none was saved.
    pub fn user_settings(&self, user_id: &str) -> RepoResult<UserSettings> {
        let stored = self.read(|conn| SqliteSettingsStore::new(conn).get(user_id))?;
        Ok(stored.unwrap_or_else(|| UserSettings::defaults_for(user_id)))
    }

    /// Settings for the user id held in preferences.
    pub fn current_user_settings(&self) -> RepoResult<UserSettings> {
        self.user_settings(&self.inner.prefs.user_id())
    }

    /// Persists `settings` and mirrors display fields into preferences.
    pub fn save_user_settings(&self, settings: &UserSettings) -> RepoResult<()> {
        self.write(Table::UserSettings, |conn| {
            SqliteSettingsStore::new(conn).upsert(settings)
        })?;
        if settings.user_id == self.inner.prefs.user_id() {
            let prefs = &self.inner.prefs;
            prefs.set_theme(&settings.theme)?;
            prefs.set_currency(&settings.currency)?;
            prefs.set_language(&settings.language)?;
        }
        Ok(())
    }

    /// Runs `op` on the blocking thread pool and awaits its result.
    pub async fn run<T, F>(&self, op: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&FinanceRepository) -> RepoResult<T> + Send + 'static,
    {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || op(&repo))
            .await
            .map_err(|err| RepoError::Worker(err.to_string()))?
    }

    /// Like `run`, but resolves to `Cancelled` as soon as `token` fires.
    ///
    /// Cancellation is best effort: a write already handed to SQLite still
    /// commits, only its result is discarded.
    pub async fn run_cancellable<T, F>(&self, token: &CancelToken, op: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&FinanceRepository) -> RepoResult<T> + Send + 'static,
    {
        if token.is_cancelled() {
            return Err(RepoError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(RepoError::Cancelled),
            result = self.run(op) => result,
        }
    }

    pub(crate) fn read<T>(&self, op: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        let conn = self.inner.db.lock()?;
        op(&conn)
    }

    pub(crate) fn write<T>(
        &self,
        table: Table,
        op: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let result = {
            let conn = self.inner.db.lock()?;
            op(&conn)
        };
        match &result {
            Ok(_) => self.inner.changes.notify(table),
            Err(err) => debug!(
                "event=repo_write module=repository status=error table={} error={}",
                table.name(),
                err
            ),
        }
        result
    }
}
