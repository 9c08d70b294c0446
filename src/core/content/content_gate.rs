use super::content_models::ContentType;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Existence check for content whose moderation job is about to run.
///
/// A job can outlive its content: the author may delete a comment while
/// the job waits in the queue. Workers consult the gate at dequeue time
/// and short-circuit to a cleared outcome when the content is gone.
#[async_trait]
pub trait ContentGate: Send + Sync {
    async fn exists(&self, content_type: ContentType, content_id: i64) -> Result<bool, GateError>;
}
