//! Category persistence.
//!
//! # Invariants
//! - Lists keep insertion order, so seeded presets appear in preset order.
//! - Deleting a category leaves referencing rows untouched.

use crate::model::category::{Category, CategoryId, CategoryKind};
use crate::store::{
    read_enum, read_uuid, text, RepoError, RepoResult, SelectBuilder, DEFAULT_MAX_PAGE_SIZE,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TABLE: &str = "categories";
const ENTITY: &str = "category";

const CATEGORY_SELECT_SQL: &str = "SELECT
    id,
    name,
    type,
    sub_type,
    color,
    icon
FROM categories";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub kind: Option<CategoryKind>,
    pub sub_type: Option<String>,
}

impl CategoryFilter {
    pub fn of_kind(kind: CategoryKind) -> Self {
        Self {
            kind: Some(kind),
            sub_type: None,
        }
    }

    pub fn of_sub_type(kind: CategoryKind, sub_type: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            sub_type: Some(sub_type.into()),
        }
    }
}

pub trait CategoryStore {
    fn insert(&self, category: &Category) -> RepoResult<CategoryId>;
    /// Inserts all rows; callers wrap this in a transaction for atomicity.
    fn insert_all(&self, categories: &[Category]) -> RepoResult<usize>;
    fn update(&self, category: &Category) -> RepoResult<()>;
    fn delete(&self, id: CategoryId) -> RepoResult<()>;
    fn get(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    fn list(&self, filter: &CategoryFilter) -> RepoResult<Vec<Category>>;
    fn count(&self) -> RepoResult<u64>;
}

pub struct SqliteCategoryStore<'conn> {
    conn: &'conn Connection,
    max_page_size: u32,
}

impl<'conn> SqliteCategoryStore<'conn> {
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

impl CategoryStore for SqliteCategoryStore<'_> {
    fn insert(&self, category: &Category) -> RepoResult<CategoryId> {
        let mut stmt = self.conn.prepare_cached(INSERT_SQL)?;
        stmt.execute(params![
            category.id.to_string(),
            category.name.as_str(),
            category.kind.as_str(),
            category.sub_type.as_str(),
            category.color.as_str(),
            category.icon.as_str(),
        ])?;
        Ok(category.id)
    }

    fn insert_all(&self, categories: &[Category]) -> RepoResult<usize> {
        for category in categories {
            self.insert(category)?;
        }
        Ok(categories.len())
    }

    fn update(&self, category: &Category) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE categories
             SET
                name = ?1,
                type = ?2,
                sub_type = ?3,
                color = ?4,
                icon = ?5
             WHERE id = ?6;",
            params![
                category.name.as_str(),
                category.kind.as_str(),
                category.sub_type.as_str(),
                category.color.as_str(),
                category.icon.as_str(),
                category.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, category.id));
        }
        Ok(())
    }

    fn delete(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn get(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_category_row(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self, filter: &CategoryFilter) -> RepoResult<Vec<Category>> {
        let mut builder = SelectBuilder::new(CATEGORY_SELECT_SQL);
        if let Some(kind) = filter.kind {
            builder.and("type = ?", [text(kind.as_str())]);
        }
        if let Some(sub_type) = filter.sub_type.as_deref() {
            builder.and("sub_type = ?", [text(sub_type)]);
        }
        let (mut sql, mut binds) = builder.finish();
        sql.push_str(" ORDER BY rowid ASC LIMIT ?");
        binds.push(Value::Integer(i64::from(self.max_page_size.max(1))));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn count(&self) -> RepoResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories;", [], |row| {
                row.get::<_, i64>(0)
            })?;
        Ok(count.max(0) as u64)
    }
}

const INSERT_SQL: &str = "INSERT INTO categories (
    id,
    name,
    type,
    sub_type,
    color,
    icon
) VALUES (?1, ?2, ?3, ?4, ?5, ?6);";

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    Ok(Category {
        id: read_uuid(row, "id", TABLE)?,
        name: row.get("name")?,
        kind: read_enum(row, "type", TABLE, CategoryKind::parse)?,
        sub_type: row.get("sub_type")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
    })
}
