// Existence checks against the application's content tables.
//
// The comments/reviews tables are owned by the CRUD layer; this gate only
// ever reads them.

use crate::core::content::{ContentGate, ContentType, GateError};
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

pub struct SqliteContentGate {
    pool: Pool<Sqlite>,
}

impl SqliteContentGate {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentGate for SqliteContentGate {
    async fn exists(&self, content_type: ContentType, content_id: i64) -> Result<bool, GateError> {
        let sql = match content_type {
            ContentType::Comment => "SELECT 1 FROM comments WHERE id = ?",
            ContentType::Review => "SELECT 1 FROM reviews WHERE id = ?",
        };

        let row = sqlx::query(sql)
            .bind(content_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GateError::Storage(e.to_string()))?;

        Ok(row.is_some())
    }
}
