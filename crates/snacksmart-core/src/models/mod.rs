//! Domain models persisted as JSON documents.

mod chat;
mod message;
mod profile;
mod user;

pub use chat::Chat;
pub use message::{Message, MessageRole};
pub use profile::{Gender, Goal, UserProfile};
pub use user::{AuthSession, PublicUser, User};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
