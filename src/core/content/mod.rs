// Content boundary types - what the CRUD layer hands us, and the read-only
// gate the workers use to notice deletions.

pub mod content_gate;
pub mod content_models;

pub use content_gate::*;
pub use content_models::*;
