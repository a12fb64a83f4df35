//! Budget persistence.

use crate::model::budget::{Budget, BudgetId, BudgetPeriod};
use crate::model::category::CategoryId;
use crate::store::{
    read_enum, read_uuid, uuid_value, Page, RepoError, RepoResult, SelectBuilder,
    DEFAULT_MAX_PAGE_SIZE,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TABLE: &str = "budgets";
const ENTITY: &str = "budget";

const BUDGET_SELECT_SQL: &str = "SELECT
    id,
    name,
    category_id,
    amount,
    spent,
    period,
    start_date,
    end_date
FROM budgets";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetFilter {
    pub category_id: Option<CategoryId>,
    /// Only budgets whose window contains this instant.
    pub active_at: Option<i64>,
}

impl BudgetFilter {
    pub fn in_category(category_id: CategoryId) -> Self {
        Self {
            category_id: Some(category_id),
            active_at: None,
        }
    }

    pub fn active_at(now_ms: i64) -> Self {
        Self {
            category_id: None,
            active_at: Some(now_ms),
        }
    }
}

pub trait BudgetStore {
    fn insert(&self, budget: &Budget) -> RepoResult<BudgetId>;
    fn update(&self, budget: &Budget) -> RepoResult<()>;
    fn delete(&self, id: BudgetId) -> RepoResult<()>;
    fn get(&self, id: BudgetId) -> RepoResult<Option<Budget>>;
    /// Ordered by `start_date`; newest window first by default.
    fn list(&self, filter: &BudgetFilter, page: &Page) -> RepoResult<Vec<Budget>>;
    fn set_spent(&self, id: BudgetId, spent: f64) -> RepoResult<()>;
}

pub struct SqliteBudgetStore<'conn> {
    conn: &'conn Connection,
    max_page_size: u32,
}

impl<'conn> SqliteBudgetStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }
}

impl BudgetStore for SqliteBudgetStore<'_> {
    fn insert(&self, budget: &Budget) -> RepoResult<BudgetId> {
        self.conn.execute(
            "INSERT INTO budgets (
                id,
                name,
                category_id,
                amount,
                spent,
                period,
                start_date,
                end_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                budget.id.to_string(),
                budget.name.as_str(),
                budget.category_id.to_string(),
                budget.amount,
                budget.spent,
                budget.period.as_str(),
                budget.start_date,
                budget.end_date,
            ],
        )?;
        Ok(budget.id)
    }

    fn update(&self, budget: &Budget) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE budgets
             SET
                name = ?1,
                category_id = ?2,
                amount = ?3,
                spent = ?4,
                period = ?5,
                start_date = ?6,
                end_date = ?7
             WHERE id = ?8;",
            params![
                budget.name.as_str(),
                budget.category_id.to_string(),
                budget.amount,
                budget.spent,
                budget.period.as_str(),
                budget.start_date,
                budget.end_date,
                budget.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, budget.id));
        }
        Ok(())
    }

    fn delete(&self, id: BudgetId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM budgets WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn get(&self, id: BudgetId) -> RepoResult<Option<Budget>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BUDGET_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_budget_row(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, filter: &BudgetFilter, page: &Page) -> RepoResult<Vec<Budget>> {
        let mut builder = SelectBuilder::new(BUDGET_SELECT_SQL);
        if let Some(category_id) = filter.category_id {
            builder.and("category_id = ?", [uuid_value(category_id)]);
        }
        if let Some(now_ms) = filter.active_at {
            builder.and(
                "start_date <= ? AND end_date >= ?",
                [Value::Integer(now_ms), Value::Integer(now_ms)],
            );
        }
        builder.order_and_page("start_date", page, self.max_page_size);
        let (sql, binds) = builder.finish();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut budgets = Vec::new();
        while let Some(row) = rows.next()? {
            budgets.push(parse_budget_row(row)?);
        }
        Ok(budgets)
    }

    fn set_spent(&self, id: BudgetId, spent: f64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE budgets SET spent = ?1 WHERE id = ?2;",
            params![spent, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }
}

fn parse_budget_row(row: &Row<'_>) -> RepoResult<Budget> {
    Ok(Budget {
        id: read_uuid(row, "id", TABLE)?,
        name: row.get("name")?,
        category_id: read_uuid(row, "category_id", TABLE)?,
        amount: row.get("amount")?,
        spent: row.get("spent")?,
        period: read_enum(row, "period", TABLE, BudgetPeriod::parse)?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
    })
}
