// Core notifications module - informs content owners about flag events.

pub mod notification_models;
pub mod notification_service;

pub use notification_models::*;
pub use notification_service::*;
