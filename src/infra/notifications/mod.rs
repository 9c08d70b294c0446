// Infrastructure for the notification dispatcher: SMTP delivery and the
// read-only preference lookup.

pub mod smtp_mailer;
pub mod sqlite_preference_store;

pub use smtp_mailer::*;
pub use sqlite_preference_store::*;
