//! Typed storage wrappers.
//!
//! Each wrapper owns the matching byte-level store from snacksmart-storage and
//! converts between JSON documents and the models in [`crate::models`].

mod chat;
mod message;
mod user;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

pub use chat::ChatStorage;
pub use message::MessageStorage;
pub use user::UserStorage;

/// Typed view over every table of the database
#[derive(Debug, Clone)]
pub struct Storage {
    db: Arc<Database>,
    pub users: UserStorage,
    pub chats: ChatStorage,
    pub messages: MessageStorage,
}

impl Storage {
    pub fn new(db_path: &str) -> Result<Self> {
        let inner = snacksmart_storage::Storage::new(db_path)?;
        Ok(Self::from_inner(inner))
    }

    pub fn from_inner(inner: snacksmart_storage::Storage) -> Self {
        Self {
            db: inner.get_db(),
            users: UserStorage::new(inner.users),
            chats: ChatStorage::new(inner.chats),
            messages: MessageStorage::new(inner.messages),
        }
    }

    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let json = std::str::from_utf8(bytes)?;
    Ok(serde_json::from_str(json)?)
}
