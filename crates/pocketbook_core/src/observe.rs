//! Change notification and re-fetching live queries.
//!
//! # Responsibility
//! - Publish a version bump per table after every committed write.
//! - Let callers hold a `LiveQuery` that re-runs its query when its table
//!   changes, until they cancel it.
//!
//! # Invariants
//! - Versions only increase and are bumped after commit, never before.
//! - A cancelled `LiveQuery` yields `None` forever after.
//! - A `LiveQuery` does not keep the repository alive; once the last
//!   `FinanceRepository` clone is dropped it yields `None`.
//! - Nothing here depends on a UI framework; cancellation is explicit.

use crate::repository::{FinanceRepository, WeakFinanceRepository};
use crate::store::{RepoError, RepoResult};
use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

/// Tables observed by live queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Transactions,
    TodoItems,
    Categories,
    Budgets,
    UserSettings,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Transactions,
        Table::TodoItems,
        Table::Categories,
        Table::Budgets,
        Table::UserSettings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::TodoItems => "todo_items",
            Self::Categories => "categories",
            Self::Budgets => "budgets",
            Self::UserSettings => "user_settings",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Transactions => 0,
            Self::TodoItems => 1,
            Self::Categories => 2,
            Self::Budgets => 3,
            Self::UserSettings => 4,
        }
    }
}

/// Per-table write counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableVersions([u64; 5]);

impl TableVersions {
    pub fn get(&self, table: Table) -> u64 {
        self.0[table.index()]
    }
}

/// Publishes table versions to any number of subscribers.
#[derive(Debug)]
pub struct ChangeNotifier {
    sender: watch::Sender<TableVersions>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(TableVersions::default());
        Self { sender }
    }

    /// Records a committed write to `table`.
    pub fn notify(&self, table: Table) {
        self.sender.send_modify(|versions| {
            versions.0[table.index()] = versions.0[table.index()].wrapping_add(1);
        });
        debug!(
            "event=table_changed module=observe status=ok table={}",
            table.name()
        );
    }

    pub fn versions(&self) -> TableVersions {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TableVersions> {
        self.sender.subscribe()
    }
}

/// Caller-owned cancellation flag. Clones share state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut receiver = self.flag.subscribe();
        // The sender lives as long as `self`, so this only ends on `true`.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

type FetchFn<T> = dyn Fn(&FinanceRepository) -> RepoResult<Vec<T>> + Send + Sync;

/// Re-fetchable query bound to one table.
///
/// `next()` yields the current rows immediately, then again after every
/// committed write to the table. Writes that land while a fetch is running
/// trigger one more fetch, so the last result always reflects the last commit.
pub struct LiveQuery<T> {
    repo: WeakFinanceRepository,
    table: Table,
    changes: watch::Receiver<TableVersions>,
    seen: Option<u64>,
    fetch: Arc<FetchFn<T>>,
    cancel: CancelToken,
}

impl<T: Send + 'static> LiveQuery<T> {
    pub(crate) fn new(
        repo: &FinanceRepository,
        table: Table,
        fetch: impl Fn(&FinanceRepository) -> RepoResult<Vec<T>> + Send + Sync + 'static,
    ) -> Self {
        let changes = repo.changes().subscribe();
        Self {
            repo: repo.downgrade(),
            table,
            changes,
            seen: None,
            fetch: Arc::new(fetch),
            cancel: CancelToken::new(),
        }
    }

    /// Binds this query to an existing token, e.g. one per screen.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs the query now on the calling thread.
    ///
    /// Returns `Cancelled` once the repository has been dropped.
    pub fn snapshot(&self) -> RepoResult<Vec<T>> {
        let repo = self.repo.upgrade().ok_or(RepoError::Cancelled)?;
        (self.fetch)(&repo)
    }

    /// Waits for the next result; `None` after cancellation or once the
    /// repository has been dropped.
    pub async fn next(&mut self) -> Option<RepoResult<Vec<T>>> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            let current = self.changes.borrow_and_update().get(self.table);
            if self.seen != Some(current) {
                self.seen = Some(current);
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                changed = self.changes.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }

        let repo = self.repo.upgrade()?;
        let fetch = Arc::clone(&self.fetch);
        let result = repo
            .run_cancellable(&self.cancel, move |repo| fetch(repo))
            .await;
        match result {
            Err(RepoError::Cancelled) => None,
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, ChangeNotifier, Table};

    #[test]
    fn notify_bumps_only_the_touched_table() {
        let notifier = ChangeNotifier::new();
        notifier.notify(Table::Budgets);
        notifier.notify(Table::Budgets);
        let versions = notifier.versions();
        assert_eq!(versions.get(Table::Budgets), 2);
        assert_eq!(versions.get(Table::Transactions), 0);
    }

    #[tokio::test]
    async fn cancel_token_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
        assert!(token.is_cancelled());
    }
}
