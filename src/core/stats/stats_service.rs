// Read-side rollups over flag records, cached briefly so the admin
// dashboard doesn't hit the store on every load.

use crate::core::content::ContentType;
use crate::core::flags::{FlagError, FlagRecord, FlagStatus, FlagStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// How many of the latest flags the summary carries.
pub const RECENT_FLAGGED_LIMIT: u32 = 10;

#[derive(Debug, Clone)]
pub struct ModerationSummary {
    pub total_by_status: Vec<(FlagStatus, u64)>,
    pub total_by_type: Vec<(ContentType, u64)>,
    pub recent_flagged: Vec<FlagRecord>,
}

pub struct StatsService {
    store: Arc<dyn FlagStore>,
    ttl: Duration,
    cache: Mutex<Option<(Instant, ModerationSummary)>>,
}

impl StatsService {
    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self::with_ttl(store, Duration::from_secs(30))
    }

    pub fn with_ttl(store: Arc<dyn FlagStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// Current rollup, refreshed on read once the cached copy expires.
    pub async fn summary(&self) -> Result<ModerationSummary, FlagError> {
        let mut cache = self.cache.lock().await;
        if let Some((at, summary)) = cache.as_ref() {
            if at.elapsed() < self.ttl {
                return Ok(summary.clone());
            }
        }

        let summary = ModerationSummary {
            total_by_status: self.store.status_counts().await?,
            total_by_type: self.store.type_counts().await?,
            recent_flagged: self.store.recent(RECENT_FLAGGED_LIMIT).await?,
        };
        *cache = Some((Instant::now(), summary.clone()));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flags::{FlagFilter, FlagPage, NewFlag};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Store that returns fixed counts and tracks how often it is queried.
    struct CountingStore {
        queries: AtomicU32,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                queries: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl FlagStore for CountingStore {
        async fn insert(&self, _new_flag: NewFlag) -> Result<FlagRecord, FlagError> {
            unimplemented!("read-only store")
        }

        async fn get(&self, _flag_id: i64) -> Result<Option<FlagRecord>, FlagError> {
            Ok(None)
        }

        async fn resolve(
            &self,
            _flag_id: i64,
            _to: FlagStatus,
            _resolved_by: i64,
            _rejection_reason: Option<String>,
        ) -> Result<Option<FlagRecord>, FlagError> {
            Ok(None)
        }

        async fn list(
            &self,
            _filter: FlagFilter,
            page: u32,
            limit: u32,
        ) -> Result<FlagPage, FlagError> {
            Ok(FlagPage {
                items: vec![],
                total: 0,
                page,
                limit,
            })
        }

        async fn list_for_author(
            &self,
            _author_id: i64,
            page: u32,
            limit: u32,
        ) -> Result<FlagPage, FlagError> {
            Ok(FlagPage {
                items: vec![],
                total: 0,
                page,
                limit,
            })
        }

        async fn status_counts(&self) -> Result<Vec<(FlagStatus, u64)>, FlagError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                (FlagStatus::Pending, 3),
                (FlagStatus::Approved, 2),
                (FlagStatus::Rejected, 1),
            ])
        }

        async fn type_counts(&self) -> Result<Vec<(ContentType, u64)>, FlagError> {
            Ok(vec![(ContentType::Comment, 4), (ContentType::Review, 2)])
        }

        async fn recent(&self, _limit: u32) -> Result<Vec<FlagRecord>, FlagError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn summary_reflects_store_counts() {
        let service = StatsService::new(Arc::new(CountingStore::new()));

        let summary = service.summary().await.unwrap();

        assert_eq!(summary.total_by_status[0], (FlagStatus::Pending, 3));
        assert_eq!(summary.total_by_type[1], (ContentType::Review, 2));
    }

    #[tokio::test]
    async fn summary_is_cached_within_the_ttl() {
        let store = Arc::new(CountingStore::new());
        let service = StatsService::with_ttl(store.clone(), Duration::from_secs(60));

        service.summary().await.unwrap();
        service.summary().await.unwrap();

        assert_eq!(store.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn summary_refreshes_once_the_ttl_expires() {
        let store = Arc::new(CountingStore::new());
        let service = StatsService::with_ttl(store.clone(), Duration::ZERO);

        service.summary().await.unwrap();
        service.summary().await.unwrap();

        assert_eq!(store.queries.load(Ordering::SeqCst), 2);
    }
}
