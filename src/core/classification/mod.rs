// Core classification module - the normalized classifier boundary plus the
// decision policy that turns scores into verdicts.

pub mod classification_models;
pub mod classifier;
pub mod decision_engine;
pub mod screening_service;

pub use classification_models::*;
pub use classifier::*;
pub use decision_engine::*;
pub use screening_service::*;
