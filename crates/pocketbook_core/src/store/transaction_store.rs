//! Transaction persistence.
//!
//! # Invariants
//! - Lists are ordered by `timestamp` (newest first by default), ties by id.
//! - `sum_amount` adds unsigned amounts; the caller picks the kind.

use crate::model::category::CategoryId;
use crate::model::transaction::{Transaction, TransactionId, TransactionKind};
use crate::store::{
    like_pattern, read_enum, read_uuid, text, uuid_value, Page, RepoError, RepoResult,
    SelectBuilder, TimeRange, DEFAULT_MAX_PAGE_SIZE,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TABLE: &str = "transactions";
const ENTITY: &str = "transaction";

const TRANSACTION_SELECT_SQL: &str = "SELECT
    id,
    amount,
    type,
    category_id,
    title,
    description,
    timestamp,
    tags
FROM transactions";

/// Filters for transaction lists and sums. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub category_id: Option<CategoryId>,
    pub kind: Option<TransactionKind>,
    pub range: Option<TimeRange>,
    /// Case-insensitive substring of title or description.
    pub text: Option<String>,
}

impl TransactionFilter {
    pub fn in_category(category_id: CategoryId) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    pub fn of_kind(kind: TransactionKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn within(range: TimeRange) -> Self {
        Self {
            range: Some(range),
            ..Self::default()
        }
    }
}

pub trait TransactionStore {
    fn insert(&self, transaction: &Transaction) -> RepoResult<TransactionId>;
    fn update(&self, transaction: &Transaction) -> RepoResult<()>;
    fn delete(&self, id: TransactionId) -> RepoResult<()>;
    fn get(&self, id: TransactionId) -> RepoResult<Option<Transaction>>;
    fn list(&self, filter: &TransactionFilter, page: &Page) -> RepoResult<Vec<Transaction>>;
    /// Sum of `amount` for rows matching `filter`; zero when none match.
    fn sum_amount(&self, filter: &TransactionFilter) -> RepoResult<f64>;
}

pub struct SqliteTransactionStore<'conn> {
    conn: &'conn Connection,
    max_page_size: u32,
}

impl<'conn> SqliteTransactionStore<'conn> {
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

impl TransactionStore for SqliteTransactionStore<'_> {
    fn insert(&self, transaction: &Transaction) -> RepoResult<TransactionId> {
        self.conn.execute(
            "INSERT INTO transactions (
                id,
                amount,
                type,
                category_id,
                title,
                description,
                timestamp,
                tags
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                transaction.id.to_string(),
                transaction.amount,
                transaction.kind.as_str(),
                transaction.category_id.to_string(),
                transaction.title.as_str(),
                transaction.description.as_deref(),
                transaction.timestamp,
                transaction.tags.as_deref(),
            ],
        )?;
        Ok(transaction.id)
    }

    fn update(&self, transaction: &Transaction) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE transactions
             SET
                amount = ?1,
                type = ?2,
                category_id = ?3,
                title = ?4,
                description = ?5,
                timestamp = ?6,
                tags = ?7
             WHERE id = ?8;",
            params![
                transaction.amount,
                transaction.kind.as_str(),
                transaction.category_id.to_string(),
                transaction.title.as_str(),
                transaction.description.as_deref(),
                transaction.timestamp,
                transaction.tags.as_deref(),
                transaction.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, transaction.id));
        }
        Ok(())
    }

    fn delete(&self, id: TransactionId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn get(&self, id: TransactionId) -> RepoResult<Option<Transaction>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TRANSACTION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_transaction_row(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, filter: &TransactionFilter, page: &Page) -> RepoResult<Vec<Transaction>> {
        let mut builder = SelectBuilder::new(TRANSACTION_SELECT_SQL);
        apply_filter(&mut builder, filter);
        builder.order_and_page("timestamp", page, self.max_page_size);
        let (sql, binds) = builder.finish();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut transactions = Vec::new();
        while let Some(row) = rows.next()? {
            transactions.push(parse_transaction_row(row)?);
        }
        Ok(transactions)
    }

    fn sum_amount(&self, filter: &TransactionFilter) -> RepoResult<f64> {
        let mut builder = SelectBuilder::new("SELECT TOTAL(amount) FROM transactions");
        apply_filter(&mut builder, filter);
        let (sql, binds) = builder.finish();

        // TOTAL() yields 0.0 on an empty match instead of NULL.
        let total = self
            .conn
            .query_row(&sql, params_from_iter(binds), |row| row.get::<_, f64>(0))?;
        Ok(total)
    }
}

fn apply_filter(builder: &mut SelectBuilder, filter: &TransactionFilter) {
    if let Some(category_id) = filter.category_id {
        builder.and("category_id = ?", [uuid_value(category_id)]);
    }
    if let Some(kind) = filter.kind {
        builder.and("type = ?", [text(kind.as_str())]);
    }
    if let Some(range) = filter.range {
        builder.and(
            "timestamp BETWEEN ? AND ?",
            [Value::Integer(range.start), Value::Integer(range.end)],
        );
    }
    if let Some(needle) = filter.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(needle);
        builder.and(
            "(title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')",
            [text(pattern.clone()), text(pattern)],
        );
    }
}

fn parse_transaction_row(row: &Row<'_>) -> RepoResult<Transaction> {
    Ok(Transaction {
        id: read_uuid(row, "id", TABLE)?,
        amount: row.get("amount")?,
        kind: read_enum(row, "type", TABLE, TransactionKind::parse)?,
        category_id: read_uuid(row, "category_id", TABLE)?,
        title: row.get("title")?,
        description: row.get("description")?,
        timestamp: row.get("timestamp")?,
        tags: row.get("tags")?,
    })
}
