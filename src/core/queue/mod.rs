// Core queue module - asynchronous job intake, dispatch, and retry.

pub mod job_queue;
pub mod queue_models;
pub mod worker_pool;

pub use job_queue::*;
pub use queue_models::*;
pub use worker_pool::*;
