// SQLite-backed flag store.
//
// Tables:
// - moderation_flags: one row per flagged piece of content, never deleted
//
// The two invariants live in the schema and the queries:
// - UNIQUE(content_type, content_id) backs the at-most-one-flag rule
// - resolution is an UPDATE guarded by `status = 'PENDING'`, so a record
//   can only be resolved once even under concurrent admin actions

use crate::core::content::ContentType;
use crate::core::flags::{
    FlagError, FlagFilter, FlagPage, FlagRecord, FlagStatus, FlagStore, NewFlag,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteFlagStore {
    pool: Pool<Sqlite>,
}

impl SqliteFlagStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), FlagError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_flags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL,
                content_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                rejection_reason TEXT,
                created_at TEXT NOT NULL,
                resolved_at TEXT,
                resolved_by INTEGER,
                UNIQUE (content_type, content_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_moderation_flags_status \
             ON moderation_flags(status, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_moderation_flags_author \
             ON moderation_flags(author_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }
}

fn storage(e: sqlx::Error) -> FlagError {
    FlagError::Storage(e.to_string())
}

fn row_to_record(row: &SqliteRow) -> Result<FlagRecord, FlagError> {
    let content_type_str: String = row.get("content_type");
    let content_type = ContentType::parse(&content_type_str)
        .ok_or_else(|| FlagError::Storage(format!("unknown content type {}", content_type_str)))?;

    let status_str: String = row.get("status");
    let status = FlagStatus::parse(&status_str)
        .ok_or_else(|| FlagError::Storage(format!("unknown flag status {}", status_str)))?;

    Ok(FlagRecord {
        id: row.get("id"),
        content_type,
        content_id: row.get("content_id"),
        author_id: row.get("author_id"),
        reason: row.get("reason"),
        status,
        rejection_reason: row.get("rejection_reason"),
        created_at: parse_timestamp(row.get("created_at")),
        resolved_at: row
            .get::<Option<String>, _>("resolved_at")
            .map(parse_timestamp),
        resolved_by: row.get("resolved_by"),
    })
}

fn parse_timestamp(value: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl FlagStore for SqliteFlagStore {
    async fn insert(&self, new_flag: NewFlag) -> Result<FlagRecord, FlagError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO moderation_flags (content_type, content_id, author_id, reason, status, created_at)
            VALUES (?, ?, ?, ?, 'PENDING', ?)
            "#,
        )
        .bind(new_flag.content_type.as_str())
        .bind(new_flag.content_id)
        .bind(new_flag.author_id)
        .bind(&new_flag.reason)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(FlagRecord {
                id: done.last_insert_rowid(),
                content_type: new_flag.content_type,
                content_id: new_flag.content_id,
                author_id: new_flag.author_id,
                reason: new_flag.reason,
                status: FlagStatus::Pending,
                rejection_reason: None,
                created_at,
                resolved_at: None,
                resolved_by: None,
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(FlagError::AlreadyFlagged)
            }
            Err(e) => Err(storage(e)),
        }
    }

    async fn get(&self, flag_id: i64) -> Result<Option<FlagRecord>, FlagError> {
        let row = sqlx::query("SELECT * FROM moderation_flags WHERE id = ?")
            .bind(flag_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn resolve(
        &self,
        flag_id: i64,
        to: FlagStatus,
        resolved_by: i64,
        rejection_reason: Option<String>,
    ) -> Result<Option<FlagRecord>, FlagError> {
        let done = sqlx::query(
            r#"
            UPDATE moderation_flags
            SET status = ?, rejection_reason = ?, resolved_at = ?, resolved_by = ?
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(to.as_str())
        .bind(rejection_reason)
        .bind(Utc::now().to_rfc3339())
        .bind(resolved_by)
        .bind(flag_id)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(flag_id).await
    }

    async fn list(
        &self,
        filter: FlagFilter,
        page: u32,
        limit: u32,
    ) -> Result<FlagPage, FlagError> {
        let mut conditions = Vec::new();
        if filter.status.is_some() {
            conditions.push("status = ?");
        }
        if filter.content_type.is_some() {
            conditions.push("content_type = ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!(
            "SELECT COUNT(*) AS n FROM moderation_flags {}",
            where_clause
        );
        let mut count_query = sqlx::query(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(content_type) = filter.content_type {
            count_query = count_query.bind(content_type.as_str());
        }
        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?
            .get("n");

        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        let rows_sql = format!(
            "SELECT * FROM moderation_flags {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        );
        let mut rows_query = sqlx::query(&rows_sql);
        if let Some(status) = filter.status {
            rows_query = rows_query.bind(status.as_str());
        }
        if let Some(content_type) = filter.content_type {
            rows_query = rows_query.bind(content_type.as_str());
        }
        let rows = rows_query
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        let items = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FlagPage {
            items,
            total: total as u64,
            page,
            limit,
        })
    }

    async fn list_for_author(
        &self,
        author_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<FlagPage, FlagError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM moderation_flags WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?
            .get("n");

        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        let rows = sqlx::query(
            r#"
            SELECT * FROM moderation_flags
            WHERE author_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(author_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let items = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FlagPage {
            items,
            total: total as u64,
            page,
            limit,
        })
    }

    async fn status_counts(&self) -> Result<Vec<(FlagStatus, u64)>, FlagError> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM moderation_flags GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        let mut counts = vec![
            (FlagStatus::Pending, 0u64),
            (FlagStatus::Approved, 0u64),
            (FlagStatus::Rejected, 0u64),
        ];
        for row in rows {
            let status_str: String = row.get("status");
            let n: i64 = row.get("n");
            if let Some(status) = FlagStatus::parse(&status_str) {
                if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == status) {
                    entry.1 = n as u64;
                }
            }
        }
        Ok(counts)
    }

    async fn type_counts(&self) -> Result<Vec<(ContentType, u64)>, FlagError> {
        let rows = sqlx::query(
            "SELECT content_type, COUNT(*) AS n FROM moderation_flags GROUP BY content_type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut counts = vec![(ContentType::Comment, 0u64), (ContentType::Review, 0u64)];
        for row in rows {
            let type_str: String = row.get("content_type");
            let n: i64 = row.get("n");
            if let Some(content_type) = ContentType::parse(&type_str) {
                if let Some(entry) = counts.iter_mut().find(|(t, _)| *t == content_type) {
                    entry.1 = n as u64;
                }
            }
        }
        Ok(counts)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<FlagRecord>, FlagError> {
        let rows = sqlx::query(
            "SELECT * FROM moderation_flags ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_record).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
