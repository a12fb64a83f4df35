//! Local store: per-entity persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define insert/update/delete/get/list contracts per entity.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - The store does not validate fields; callers use the entity helpers.
//! - `get` returns `Ok(None)` for unknown ids; `update`/`delete` return
//!   `RepoError::NotFound`.
//! - Read paths reject undecodable rows (`InvalidData`) instead of masking.
//! - List results are capped at the store's page limit.

use crate::config::ConfigError;
use crate::db::DbError;
use crate::prefs::PrefError;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod budget_store;
pub mod category_store;
pub mod settings_store;
pub mod todo_store;
pub mod transaction_store;

pub use budget_store::{BudgetFilter, BudgetStore, SqliteBudgetStore};
pub use category_store::{CategoryFilter, CategoryStore, SqliteCategoryStore};
pub use settings_store::{SettingsStore, SqliteSettingsStore};
pub use todo_store::{SqliteTodoStore, TodoFilter, TodoStore};
pub use transaction_store::{SqliteTransactionStore, TransactionFilter, TransactionStore};

/// Upper bound applied to every list query unless configured otherwise.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error surfaced by stores and the repository facade.
#[derive(Debug)]
pub enum RepoError {
    /// I/O failure or constraint violation from the database.
    Db(DbError),
    /// `update`/`delete`/derived operation targeted a missing row.
    NotFound { entity: &'static str, id: String },
    /// Persisted row could not be decoded.
    InvalidData(String),
    /// Caller cancelled before the operation delivered its result.
    Cancelled,
    /// Background worker failed to deliver a result.
    Worker(String),
    /// Preference backend failure.
    Preferences(PrefError),
    /// Startup configuration rejected before opening storage.
    Config(ConfigError),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Worker(message) => write!(f, "background worker failed: {message}"),
            Self::Preferences(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Preferences(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) | Self::Cancelled | Self::Worker(_) => {
                None
            }
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PrefError> for RepoError {
    fn from(value: PrefError) -> Self {
        Self::Preferences(value)
    }
}

impl From<ConfigError> for RepoError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Sort direction on the entity's time key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            Self::NewestFirst => "DESC",
            Self::OldestFirst => "ASC",
        }
    }
}

/// Sort and pagination options for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub sort: SortOrder,
    /// `None` means "up to the store's page limit".
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Page {
    pub fn first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn oldest_first() -> Self {
        Self {
            sort: SortOrder::OldestFirst,
            ..Self::default()
        }
    }

    /// Limit actually applied: requested value clamped to `[1, max]`.
    pub fn effective_limit(&self, max: u32) -> u32 {
        let max = max.max(1);
        self.limit.map_or(max, |limit| limit.clamp(1, max))
    }
}

/// Inclusive epoch-millisecond window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, epoch_ms: i64) -> bool {
        (self.start..=self.end).contains(&epoch_ms)
    }
}

/// Incrementally built `SELECT` with positional binds.
pub(crate) struct SelectBuilder {
    sql: String,
    binds: Vec<Value>,
}

impl SelectBuilder {
    pub(crate) fn new(select_sql: &str) -> Self {
        Self {
            sql: format!("{select_sql} WHERE 1 = 1"),
            binds: Vec::new(),
        }
    }

    /// Appends ` AND <clause>` binding one value per `?` in the clause.
    pub(crate) fn and(&mut self, clause: &str, values: impl IntoIterator<Item = Value>) {
        self.sql.push_str(" AND ");
        self.sql.push_str(clause);
        self.binds.extend(values);
    }

    /// Appends ordering by `time_column` then `id`, and the page window.
    pub(crate) fn order_and_page(&mut self, time_column: &str, page: &Page, max_limit: u32) {
        self.sql.push_str(&format!(
            " ORDER BY {time_column} {}, id ASC LIMIT ?",
            page.sort.sql()
        ));
        self.binds
            .push(Value::Integer(i64::from(page.effective_limit(max_limit))));
        if page.offset > 0 {
            self.sql.push_str(" OFFSET ?");
            self.binds.push(Value::Integer(i64::from(page.offset)));
        }
    }

    pub(crate) fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.binds)
    }
}

pub(crate) fn text(value: impl Into<String>) -> Value {
    Value::Text(value.into())
}

pub(crate) fn uuid_value(id: Uuid) -> Value {
    Value::Text(id.to_string())
}

/// Escapes `%`, `_` and `\` for `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

pub(crate) fn read_uuid(row: &Row<'_>, column: &str, table: &str) -> RepoResult<Uuid> {
    let raw: String = row.get(column)?;
    Uuid::parse_str(&raw).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{raw}` in {table}.{column}"))
    })
}

pub(crate) fn read_enum<T>(
    row: &Row<'_>,
    column: &str,
    table: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> RepoResult<T> {
    let raw: String = row.get(column)?;
    parse(&raw).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid value `{raw}` in {table}.{column}"))
    })
}

pub(crate) fn read_bool(row: &Row<'_>, column: &str, table: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {table}.{column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
