//! To-do items on the facade.

use super::FinanceRepository;
use crate::model::todo::{TodoId, TodoItem};
use crate::observe::{LiveQuery, Table};
use crate::store::{Page, RepoResult, SqliteTodoStore, TodoFilter, TodoStore};
use rusqlite::Connection;

impl FinanceRepository {
    fn todos<'c>(&self, conn: &'c Connection) -> SqliteTodoStore<'c> {
        SqliteTodoStore::new(conn).with_max_page_size(self.max_page_size())
    }

    pub fn add_todo(&self, item: &TodoItem) -> RepoResult<TodoId> {
        self.write(Table::TodoItems, |conn| self.todos(conn).insert(item))
    }

    pub fn update_todo(&self, item: &TodoItem) -> RepoResult<()> {
        self.write(Table::TodoItems, |conn| self.todos(conn).update(item))
    }

    pub fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        self.write(Table::TodoItems, |conn| self.todos(conn).delete(id))
    }

    pub fn get_todo(&self, id: TodoId) -> RepoResult<Option<TodoItem>> {
        self.read(|conn| self.todos(conn).get(id))
    }

    pub fn list_todos(&self, filter: &TodoFilter, page: &Page) -> RepoResult<Vec<TodoItem>> {
        self.read(|conn| self.todos(conn).list(filter, page))
    }

    /// Completing sets progress to 100; reopening caps it at 99.
    pub fn set_todo_completed(&self, id: TodoId, completed: bool) -> RepoResult<()> {
        self.write(Table::TodoItems, |conn| {
            self.todos(conn).set_completed(id, completed)
        })
    }

    pub fn observe_todos(&self, filter: TodoFilter, page: Page) -> LiveQuery<TodoItem> {
        LiveQuery::new(self, Table::TodoItems, move |repo| {
            repo.list_todos(&filter, &page)
        })
    }

    /// Open items whose due date is before the clock's current instant.
    pub fn overdue_todos(&self) -> RepoResult<Vec<TodoItem>> {
        let now_ms = self.clock().now_millis();
        self.list_todos(&TodoFilter::overdue_at(now_ms), &Page::default())
    }
}
