// Flag lifecycle service - creation by the workers, resolution by admins.
//
// The store enforces the two hard invariants:
// - at most one record per (content_type, content_id), via a unique key
// - PENDING -> resolved happens at most once, via a compare-and-swap
//   update keyed on the expected current status

use super::flag_models::{FlagFilter, FlagPage, FlagRecord, FlagStatus, NewFlag};
use crate::core::content::ContentType;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("Content is already flagged")]
    AlreadyFlagged,

    #[error("Flag not found")]
    NotFound,

    #[error("Flag is already resolved")]
    InvalidTransition,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Trait for persisting flag records.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Insert a new PENDING flag. Fails with `AlreadyFlagged` when a
    /// record already exists for (content_type, content_id).
    async fn insert(&self, new_flag: NewFlag) -> Result<FlagRecord, FlagError>;

    async fn get(&self, flag_id: i64) -> Result<Option<FlagRecord>, FlagError>;

    /// Compare-and-swap resolution: only applies while the record is still
    /// PENDING. Returns None when no pending record matched, so concurrent
    /// admin actions on the same record cannot double-apply.
    async fn resolve(
        &self,
        flag_id: i64,
        to: FlagStatus,
        resolved_by: i64,
        rejection_reason: Option<String>,
    ) -> Result<Option<FlagRecord>, FlagError>;

    async fn list(&self, filter: FlagFilter, page: u32, limit: u32)
        -> Result<FlagPage, FlagError>;

    async fn list_for_author(
        &self,
        author_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<FlagPage, FlagError>;

    async fn status_counts(&self) -> Result<Vec<(FlagStatus, u64)>, FlagError>;

    async fn type_counts(&self) -> Result<Vec<(ContentType, u64)>, FlagError>;

    /// Most recently created flags, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<FlagRecord>, FlagError>;
}

pub struct FlagService {
    store: Arc<dyn FlagStore>,
}

impl FlagService {
    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self { store }
    }

    /// Record a new flag for toxic content. Callers racing on the same
    /// content see `AlreadyFlagged` and are expected to absorb it.
    pub async fn create_flag(&self, new_flag: NewFlag) -> Result<FlagRecord, FlagError> {
        let record = self.store.insert(new_flag).await?;
        tracing::info!(
            flag_id = record.id,
            content_type = %record.content_type,
            content_id = record.content_id,
            "flag created"
        );
        Ok(record)
    }

    /// Uphold a flag. Fails with `InvalidTransition` when the record was
    /// already resolved, `NotFound` when it never existed.
    pub async fn approve(&self, flag_id: i64, admin_id: i64) -> Result<FlagRecord, FlagError> {
        match self
            .store
            .resolve(flag_id, FlagStatus::Approved, admin_id, None)
            .await?
        {
            Some(record) => {
                tracing::info!(flag_id, admin_id, "flag approved");
                Ok(record)
            }
            // CAS missed: either the record never existed or someone else
            // resolved it in the meantime.
            None => match self.store.get(flag_id).await? {
                Some(_) => Err(FlagError::InvalidTransition),
                None => Err(FlagError::NotFound),
            },
        }
    }

    /// Dismiss a flag. When the admin supplies no reason, the flag's
    /// original reason is recorded as the rejection reason.
    pub async fn reject(
        &self,
        flag_id: i64,
        admin_id: i64,
        reason: Option<String>,
    ) -> Result<FlagRecord, FlagError> {
        let current = self.store.get(flag_id).await?.ok_or(FlagError::NotFound)?;
        let rejection_reason = reason.unwrap_or_else(|| current.reason.clone());

        match self
            .store
            .resolve(flag_id, FlagStatus::Rejected, admin_id, Some(rejection_reason))
            .await?
        {
            Some(record) => {
                tracing::info!(flag_id, admin_id, "flag rejected");
                Ok(record)
            }
            // The record existed a moment ago, so a missed CAS means it is
            // no longer pending.
            None => Err(FlagError::InvalidTransition),
        }
    }

    pub async fn get(&self, flag_id: i64) -> Result<Option<FlagRecord>, FlagError> {
        self.store.get(flag_id).await
    }

    pub async fn list_by_status(
        &self,
        filter: FlagFilter,
        page: u32,
        limit: u32,
    ) -> Result<FlagPage, FlagError> {
        self.store.list(filter, page, limit).await
    }

    pub async fn flags_for_author(
        &self,
        author_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<FlagPage, FlagError> {
        self.store.list_for_author(author_id, page, limit).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
