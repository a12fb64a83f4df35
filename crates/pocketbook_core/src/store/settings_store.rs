//! `user_settings` persistence: one row per user id.

use crate::model::user_settings::UserSettings;
use crate::store::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

const ENTITY: &str = "user settings";

pub trait SettingsStore {
    /// Inserts or replaces the row for `settings.user_id`.
    fn upsert(&self, settings: &UserSettings) -> RepoResult<()>;
    fn get(&self, user_id: &str) -> RepoResult<Option<UserSettings>>;
    fn delete(&self, user_id: &str) -> RepoResult<()>;
}

pub struct SqliteSettingsStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SettingsStore for SqliteSettingsStore<'_> {
    fn upsert(&self, settings: &UserSettings) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO user_settings (user_id, theme, currency, language)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                theme = excluded.theme,
                currency = excluded.currency,
                language = excluded.language;",
            params![
                settings.user_id.as_str(),
                settings.theme.as_str(),
                settings.currency.as_str(),
                settings.language.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get(&self, user_id: &str) -> RepoResult<Option<UserSettings>> {
        let settings = self
            .conn
            .query_row(
                "SELECT user_id, theme, currency, language
                 FROM user_settings
                 WHERE user_id = ?1;",
                [user_id],
                |row| {
                    Ok(UserSettings {
                        user_id: row.get("user_id")?,
                        theme: row.get("theme")?,
                        currency: row.get("currency")?,
                        language: row.get("language")?,
                    })
                },
            )
            .optional()?;
        Ok(settings)
    }

    fn delete(&self, user_id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM user_settings WHERE user_id = ?1;", [user_id])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, user_id));
        }
        Ok(())
    }
}
