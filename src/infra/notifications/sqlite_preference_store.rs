// Read-only access to per-user notification preferences.
//
// The notification_prefs table is owned by the user-profile layer; the
// dispatcher never writes to it.

use crate::core::notifications::{NotificationPrefs, NotifyError, PreferenceStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqlitePreferenceStore {
    pool: Pool<Sqlite>,
}

impl SqlitePreferenceStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn get(&self, user_id: i64) -> Result<Option<NotificationPrefs>, NotifyError> {
        let row = sqlx::query(
            "SELECT user_id, email_enabled, email FROM notification_prefs WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| NotifyError::Storage(e.to_string()))?;

        Ok(row.map(|r| NotificationPrefs {
            user_id: r.get("user_id"),
            email_enabled: r.get("email_enabled"),
            email: r.get("email"),
        }))
    }
}
