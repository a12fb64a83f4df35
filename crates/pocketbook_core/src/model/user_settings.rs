//! Per-user display settings persisted in the `user_settings` table.

use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_ID: &str = "default_user";
pub const DEFAULT_THEME: &str = "system";
pub const DEFAULT_CURRENCY: &str = "CNY";
pub const DEFAULT_LANGUAGE: &str = "zh";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    pub theme: String,
    pub currency: String,
    pub language: String,
}

impl UserSettings {
    /// Settings for `user_id` with application defaults.
    pub fn defaults_for(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            theme: DEFAULT_THEME.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::defaults_for(DEFAULT_USER_ID)
    }
}
