// SQLite-backed moderation job queue.
//
// Jobs survive restarts; claiming flips a row from QUEUED to PROCESSING
// inside a transaction so two workers can never take the same job.
// Completed jobs are deleted; dead-lettered rows stay for inspection.

use crate::core::content::ContentType;
use crate::core::queue::{DeadLetter, JobOutcome, JobQueue, ModerationJob, NewJob, QueueError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use std::time::Duration;

pub struct SqliteJobQueue {
    pool: Pool<Sqlite>,
}

impl SqliteJobQueue {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL,
                content_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'QUEUED',
                attempt INTEGER NOT NULL DEFAULT 0,
                enqueued_at TEXT NOT NULL,
                available_at TEXT NOT NULL,
                error TEXT,
                dead_lettered_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_moderation_jobs_claim \
             ON moderation_jobs(status, available_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}

fn unavailable(e: sqlx::Error) -> QueueError {
    QueueError::Unavailable(e.to_string())
}

fn parse_timestamp(value: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_job(row: &SqliteRow) -> Result<ModerationJob, QueueError> {
    let content_type_str: String = row.get("content_type");
    let content_type = ContentType::parse(&content_type_str).ok_or_else(|| {
        QueueError::Unavailable(format!("unknown content type {}", content_type_str))
    })?;

    Ok(ModerationJob {
        job_id: row.get("id"),
        content_type,
        content_id: row.get("content_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        enqueued_at: parse_timestamp(row.get("enqueued_at")),
        attempt: row.get::<i64, _>("attempt") as u32,
    })
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(&self, job: NewJob) -> Result<i64, QueueError> {
        let now = Utc::now().to_rfc3339();

        let done = sqlx::query(
            r#"
            INSERT INTO moderation_jobs (content_type, content_id, author_id, text, status, enqueued_at, available_at)
            VALUES (?, ?, ?, ?, 'QUEUED', ?, ?)
            "#,
        )
        .bind(job.content_type.as_str())
        .bind(job.content_id)
        .bind(job.author_id)
        .bind(&job.text)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(done.last_insert_rowid())
    }

    async fn claim_next(&self) -> Result<Option<ModerationJob>, QueueError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let row = sqlx::query(
            r#"
            SELECT * FROM moderation_jobs
            WHERE status = 'QUEUED' AND available_at <= ?
            ORDER BY available_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        let Some(row) = row else {
            tx.commit().await.map_err(unavailable)?;
            return Ok(None);
        };
        let job = row_to_job(&row)?;

        let done = sqlx::query(
            "UPDATE moderation_jobs SET status = 'PROCESSING' WHERE id = ? AND status = 'QUEUED'",
        )
        .bind(job.job_id)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;

        // Raced with another worker; the caller just polls again.
        if done.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(job))
    }

    async fn complete(&self, job_id: i64, outcome: JobOutcome) -> Result<(), QueueError> {
        sqlx::query("DELETE FROM moderation_jobs WHERE id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        tracing::debug!(job_id, outcome = ?outcome, "job completed");
        Ok(())
    }

    async fn retry_later(
        &self,
        job_id: i64,
        attempt: u32,
        delay: Duration,
    ) -> Result<(), QueueError> {
        let available_at = Utc::now() + chrono::Duration::milliseconds(delay.as_millis() as i64);

        sqlx::query(
            "UPDATE moderation_jobs SET status = 'QUEUED', attempt = ?, available_at = ? WHERE id = ?",
        )
        .bind(attempt as i64)
        .bind(available_at.to_rfc3339())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn release(&self, job_id: i64, delay: Duration) -> Result<(), QueueError> {
        let available_at = Utc::now() + chrono::Duration::milliseconds(delay.as_millis() as i64);

        sqlx::query("UPDATE moderation_jobs SET status = 'QUEUED', available_at = ? WHERE id = ?")
            .bind(available_at.to_rfc3339())
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn dead_letter(&self, job_id: i64, error: &str) -> Result<(), QueueError> {
        sqlx::query(
            "UPDATE moderation_jobs SET status = 'DEAD_LETTERED', error = ?, dead_lettered_at = ? WHERE id = ?",
        )
        .bind(error)
        .bind(Utc::now().to_rfc3339())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn list_dead_letters(&self, limit: u32) -> Result<Vec<DeadLetter>, QueueError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM moderation_jobs
            WHERE status = 'DEAD_LETTERED'
            ORDER BY dead_lettered_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter()
            .map(|row| {
                let content_type_str: String = row.get("content_type");
                let content_type = ContentType::parse(&content_type_str).ok_or_else(|| {
                    QueueError::Unavailable(format!("unknown content type {}", content_type_str))
                })?;
                Ok(DeadLetter {
                    job_id: row.get("id"),
                    content_type,
                    content_id: row.get("content_id"),
                    author_id: row.get("author_id"),
                    error: row
                        .get::<Option<String>, _>("error")
                        .unwrap_or_default(),
                    dead_lettered_at: row
                        .get::<Option<String>, _>("dead_lettered_at")
                        .map(parse_timestamp)
                        .unwrap_or_else(Utc::now),
                })
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
