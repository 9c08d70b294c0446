// The api module is the boundary the surrounding application calls into.

#[path = "moderation_api.rs"]
pub mod moderation_api;

pub use moderation_api::*;
