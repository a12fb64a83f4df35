//! Transactions, categories and budgets on the facade.

use super::FinanceRepository;
use crate::model::budget::{Budget, BudgetId};
use crate::model::category::{Category, CategoryId};
use crate::model::transaction::{Transaction, TransactionId, TransactionKind};
use crate::observe::{LiveQuery, Table};
use crate::store::{
    BudgetFilter, BudgetStore, CategoryFilter, CategoryStore, Page, RepoError, RepoResult,
    SqliteBudgetStore, SqliteCategoryStore, SqliteTransactionStore, TimeRange, TransactionFilter,
    TransactionStore,
};
use chrono::{Duration, TimeZone};
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Income and expense totals over a time window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub income: f64,
    pub expense: f64,
    /// `income - expense`.
    pub balance: f64,
}

impl FinanceRepository {
    fn transactions<'c>(&self, conn: &'c Connection) -> SqliteTransactionStore<'c> {
        SqliteTransactionStore::new(conn).with_max_page_size(self.max_page_size())
    }

    fn categories<'c>(&self, conn: &'c Connection) -> SqliteCategoryStore<'c> {
        SqliteCategoryStore::new(conn).with_max_page_size(self.max_page_size())
    }

    fn budgets<'c>(&self, conn: &'c Connection) -> SqliteBudgetStore<'c> {
        SqliteBudgetStore::new(conn).with_max_page_size(self.max_page_size())
    }

    pub fn add_transaction(&self, transaction: &Transaction) -> RepoResult<TransactionId> {
        self.write(Table::Transactions, |conn| {
            self.transactions(conn).insert(transaction)
        })
    }

    pub fn update_transaction(&self, transaction: &Transaction) -> RepoResult<()> {
        self.write(Table::Transactions, |conn| {
            self.transactions(conn).update(transaction)
        })
    }

    pub fn delete_transaction(&self, id: TransactionId) -> RepoResult<()> {
        self.write(Table::Transactions, |conn| self.transactions(conn).delete(id))
    }

    pub fn get_transaction(&self, id: TransactionId) -> RepoResult<Option<Transaction>> {
        self.read(|conn| self.transactions(conn).get(id))
    }

    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: &Page,
    ) -> RepoResult<Vec<Transaction>> {
        self.read(|conn| self.transactions(conn).list(filter, page))
    }

    /// Case-insensitive match on title or description, newest first.
    pub fn search_transactions(&self, needle: &str, page: &Page) -> RepoResult<Vec<Transaction>> {
        let filter = TransactionFilter {
            text: Some(needle.to_string()),
            ..TransactionFilter::default()
        };
        self.list_transactions(&filter, page)
    }

    pub fn sum_transactions(&self, filter: &TransactionFilter) -> RepoResult<f64> {
        self.read(|conn| self.transactions(conn).sum_amount(filter))
    }

    pub fn observe_transactions(
        &self,
        filter: TransactionFilter,
        page: Page,
    ) -> LiveQuery<Transaction> {
        LiveQuery::new(self, Table::Transactions, move |repo| {
            repo.list_transactions(&filter, &page)
        })
    }

    /// Transactions stamped on the clock's current local calendar day.
    pub fn today_transactions(&self) -> RepoResult<Vec<Transaction>> {
        let range = self.today_range()?;
        self.list_transactions(&TransactionFilter::within(range), &Page::default())
    }

    /// Income, expense and balance for transactions inside `range`.
    pub fn summarize(&self, range: TimeRange) -> RepoResult<PeriodSummary> {
        let (income, expense) = self.read(|conn| {
            let store = self.transactions(conn);
            let income = store.sum_amount(&TransactionFilter {
                kind: Some(TransactionKind::Income),
                range: Some(range),
                ..TransactionFilter::default()
            })?;
            let expense = store.sum_amount(&TransactionFilter {
                kind: Some(TransactionKind::Expense),
                range: Some(range),
                ..TransactionFilter::default()
            })?;
            Ok((income, expense))
        })?;
        Ok(PeriodSummary {
            income,
            expense,
            balance: income - expense,
        })
    }

    pub fn add_category(&self, category: &Category) -> RepoResult<CategoryId> {
        self.write(Table::Categories, |conn| self.categories(conn).insert(category))
    }

    pub fn update_category(&self, category: &Category) -> RepoResult<()> {
        self.write(Table::Categories, |conn| self.categories(conn).update(category))
    }

    /// Rows that still reference the category are left untouched.
    pub fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        self.write(Table::Categories, |conn| self.categories(conn).delete(id))
    }

    pub fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        self.read(|conn| self.categories(conn).get(id))
    }

    pub fn list_categories(&self, filter: &CategoryFilter) -> RepoResult<Vec<Category>> {
        self.read(|conn| self.categories(conn).list(filter))
    }

    pub fn observe_categories(&self, filter: CategoryFilter) -> LiveQuery<Category> {
        LiveQuery::new(self, Table::Categories, move |repo| {
            repo.list_categories(&filter)
        })
    }

    pub fn add_budget(&self, budget: &Budget) -> RepoResult<BudgetId> {
        self.write(Table::Budgets, |conn| self.budgets(conn).insert(budget))
    }

    pub fn update_budget(&self, budget: &Budget) -> RepoResult<()> {
        self.write(Table::Budgets, |conn| self.budgets(conn).update(budget))
    }

    pub fn delete_budget(&self, id: BudgetId) -> RepoResult<()> {
        self.write(Table::Budgets, |conn| self.budgets(conn).delete(id))
    }

    pub fn get_budget(&self, id: BudgetId) -> RepoResult<Option<Budget>> {
        self.read(|conn| self.budgets(conn).get(id))
    }

    pub fn list_budgets(&self, filter: &BudgetFilter, page: &Page) -> RepoResult<Vec<Budget>> {
        self.read(|conn| self.budgets(conn).list(filter, page))
    }

    pub fn observe_budgets(&self, filter: BudgetFilter, page: Page) -> LiveQuery<Budget> {
        LiveQuery::new(self, Table::Budgets, move |repo| {
            repo.list_budgets(&filter, &page)
        })
    }

    /// Budgets whose window contains the clock's current instant.
    pub fn active_budgets(&self) -> RepoResult<Vec<Budget>> {
        let now_ms = self.clock().now_millis();
        self.list_budgets(&BudgetFilter::active_at(now_ms), &Page::default())
    }

    /// Recomputes `spent` from expense transactions in the budget's category
    /// within its window, persists it and returns the updated budget.
    pub fn refresh_budget_spent(&self, id: BudgetId) -> RepoResult<Budget> {
        let budget = self.write(Table::Budgets, |conn| {
            let tx = conn.unchecked_transaction()?;
            let budgets = SqliteBudgetStore::new(&tx);
            let mut budget = budgets
                .get(id)?
                .ok_or_else(|| RepoError::not_found("budget", id))?;
            let filter = TransactionFilter {
                category_id: Some(budget.category_id),
                kind: Some(TransactionKind::Expense),
                range: Some(TimeRange::new(budget.start_date, budget.end_date)),
                text: None,
            };
            budget.spent = SqliteTransactionStore::new(&tx).sum_amount(&filter)?;
            budgets.set_spent(id, budget.spent)?;
            tx.commit()?;
            Ok(budget)
        })?;
        info!(
            "event=budget_refresh module=repository status=ok budget_id={}",
            budget.id
        );
        Ok(budget)
    }

    fn today_range(&self) -> RepoResult<TimeRange> {
        let clock = self.clock();
        let invalid = || RepoError::InvalidData("clock reports an unrepresentable date".into());
        let today = clock.today().ok_or_else(invalid)?;
        let midnight = today.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        let start = clock
            .utc_offset()
            .from_local_datetime(&midnight)
            .single()
            .ok_or_else(invalid)?;
        let end = start + Duration::days(1) - Duration::milliseconds(1);
        Ok(TimeRange::new(
            start.timestamp_millis(),
            end.timestamp_millis(),
        ))
    }
}
