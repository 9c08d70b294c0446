// Core flags module - durable flag records and their lifecycle.
// Following the same pattern as the classification module.

pub mod flag_models;
pub mod flag_service;

pub use flag_models::*;
pub use flag_service::*;
