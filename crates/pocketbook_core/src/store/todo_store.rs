//! To-do item persistence.

use crate::model::category::CategoryId;
use crate::model::todo::{Priority, TodoId, TodoItem};
use crate::store::{
    bool_to_int, read_bool, read_enum, read_uuid, uuid_value, Page, RepoError, RepoResult,
    SelectBuilder, TimeRange, DEFAULT_MAX_PAGE_SIZE,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TABLE: &str = "todo_items";
const ENTITY: &str = "todo item";

const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    category_id,
    description,
    priority,
    due_date,
    is_completed,
    progress,
    created_at
FROM todo_items";

/// Filters for to-do lists. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub category_id: Option<CategoryId>,
    pub completed: Option<bool>,
    /// Only items whose due date falls within the range.
    pub due_range: Option<TimeRange>,
    /// Only open items due strictly before this instant.
    pub overdue_at: Option<i64>,
}

impl TodoFilter {
    pub fn in_category(category_id: CategoryId) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn overdue_at(now_ms: i64) -> Self {
        Self {
            overdue_at: Some(now_ms),
            ..Self::default()
        }
    }
}

pub trait TodoStore {
    fn insert(&self, item: &TodoItem) -> RepoResult<TodoId>;
    fn update(&self, item: &TodoItem) -> RepoResult<()>;
    fn delete(&self, id: TodoId) -> RepoResult<()>;
    fn get(&self, id: TodoId) -> RepoResult<Option<TodoItem>>;
    fn list(&self, filter: &TodoFilter, page: &Page) -> RepoResult<Vec<TodoItem>>;
    /// Sets completion and progress together; `NotFound` for unknown ids.
    fn set_completed(&self, id: TodoId, completed: bool) -> RepoResult<()>;
}

pub struct SqliteTodoStore<'conn> {
    conn: &'conn Connection,
    max_page_size: u32,
}

impl<'conn> SqliteTodoStore<'conn> {
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

impl TodoStore for SqliteTodoStore<'_> {
    fn insert(&self, item: &TodoItem) -> RepoResult<TodoId> {
        self.conn.execute(
            "INSERT INTO todo_items (
                id,
                title,
                category_id,
                description,
                priority,
                due_date,
                is_completed,
                progress,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                item.id.to_string(),
                item.title.as_str(),
                item.category_id.to_string(),
                item.description.as_deref(),
                item.priority.as_str(),
                item.due_date,
                bool_to_int(item.is_completed),
                item.progress,
                item.created_at,
            ],
        )?;
        Ok(item.id)
    }

    fn update(&self, item: &TodoItem) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE todo_items
             SET
                title = ?1,
                category_id = ?2,
                description = ?3,
                priority = ?4,
                due_date = ?5,
                is_completed = ?6,
                progress = ?7,
                created_at = ?8
             WHERE id = ?9;",
            params![
                item.title.as_str(),
                item.category_id.to_string(),
                item.description.as_deref(),
                item.priority.as_str(),
                item.due_date,
                bool_to_int(item.is_completed),
                item.progress,
                item.created_at,
                item.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, item.id));
        }
        Ok(())
    }

    fn delete(&self, id: TodoId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM todo_items WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn get(&self, id: TodoId) -> RepoResult<Option<TodoItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_todo_row(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, filter: &TodoFilter, page: &Page) -> RepoResult<Vec<TodoItem>> {
        let mut builder = SelectBuilder::new(TODO_SELECT_SQL);
        if let Some(category_id) = filter.category_id {
            builder.and("category_id = ?", [uuid_value(category_id)]);
        }
        if let Some(completed) = filter.completed {
            builder.and(
                "is_completed = ?",
                [Value::Integer(bool_to_int(completed))],
            );
        }
        if let Some(range) = filter.due_range {
            builder.and(
                "due_date BETWEEN ? AND ?",
                [Value::Integer(range.start), Value::Integer(range.end)],
            );
        }
        if let Some(now_ms) = filter.overdue_at {
            builder.and(
                "is_completed = 0 AND due_date IS NOT NULL AND due_date < ?",
                [Value::Integer(now_ms)],
            );
        }
        builder.order_and_page("created_at", page, self.max_page_size);
        let (sql, binds) = builder.finish();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_todo_row(row)?);
        }
        Ok(items)
    }

    fn set_completed(&self, id: TodoId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE todo_items
             SET
                is_completed = ?1,
                progress = CASE WHEN ?1 = 1 THEN 100 ELSE MIN(progress, 99) END
             WHERE id = ?2;",
            params![bool_to_int(completed), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<TodoItem> {
    let progress: i64 = row.get("progress")?;
    let progress = u8::try_from(progress).map_err(|_| {
        RepoError::InvalidData(format!("invalid progress `{progress}` in {TABLE}.progress"))
    })?;

    Ok(TodoItem {
        id: read_uuid(row, "id", TABLE)?,
        title: row.get("title")?,
        category_id: read_uuid(row, "category_id", TABLE)?,
        description: row.get("description")?,
        priority: read_enum(row, "priority", TABLE, Priority::parse)?,
        due_date: row.get("due_date")?,
        is_completed: read_bool(row, "is_completed", TABLE)?,
        progress,
        created_at: row.get("created_at")?,
    })
}
