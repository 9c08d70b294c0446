// This is the entry point of the moderation worker daemon.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases, external APIs)
// - `api/` = Boundary facade the web/CRUD layer calls into
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the worker pool until interrupted
//
// The web application links against the library, builds a `ModerationApi`
// over the same database, and enqueues the jobs this daemon consumes.

use anyhow::Context;
use contentwatch::core::classification::ScreeningService;
use contentwatch::core::flags::FlagService;
use contentwatch::core::notifications::NotificationService;
use contentwatch::core::queue::{WorkerConfig, WorkerPool};
use contentwatch::infra::classification::GoogleLanguageClient;
use contentwatch::infra::content::SqliteContentGate;
use contentwatch::infra::flags::SqliteFlagStore;
use contentwatch::infra::notifications::{SmtpConfig, SmtpMailer, SqlitePreferenceStore};
use contentwatch::infra::queue::SqliteJobQueue;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    std::fs::create_dir_all(&data_dir).context("creating data directory for SQLite files")?;
    let db_path = format!("{}/moderation.db", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&format!("sqlite://{}?mode=rwc", db_path))
        .await
        .context("connecting to moderation DB")?;

    let flag_store = Arc::new(SqliteFlagStore::new(pool.clone()));
    flag_store
        .migrate()
        .await
        .context("migrating flag tables")?;
    let flags = Arc::new(FlagService::new(flag_store));

    let queue = Arc::new(SqliteJobQueue::new(pool.clone()));
    queue.migrate().await.context("migrating job queue tables")?;

    let api_key = std::env::var("GOOGLE_NL_API_KEY")
        .context("Missing GOOGLE_NL_API_KEY environment variable")?;
    let classifier = Arc::new(
        GoogleLanguageClient::new(api_key).context("creating language client")?,
    );
    let screening = Arc::new(ScreeningService::new(classifier));

    let mailer = Arc::new(SmtpMailer::new(SmtpConfig::from_env()));
    let prefs = Arc::new(SqlitePreferenceStore::new(pool.clone()));
    let notifications = Arc::new(NotificationService::new(mailer, prefs));

    let gate = Arc::new(SqliteContentGate::new(pool.clone()));

    let workers = std::env::var("MODERATION_WORKERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(4);

    let worker_pool = Arc::new(WorkerPool::new(
        queue,
        screening,
        flags,
        gate,
        notifications,
        WorkerConfig {
            workers,
            ..Default::default()
        },
    ));

    // ========================================================================
    // RUN
    // ========================================================================

    let handles = worker_pool.spawn();
    tracing::info!(workers, db = %db_path, "moderation worker pool running");

    tokio::signal::ctrl_c()
        .await
        .context("listening for shutdown signal")?;
    tracing::info!("shutting down");
    for handle in handles {
        handle.abort();
    }

    Ok(())
}
