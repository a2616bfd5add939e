use anyhow::Result;
use snacksmart_storage::SimpleStorage;

use super::decode;
use crate::models::Chat;

/// Typed chat storage wrapper around snacksmart-storage::ChatStorage.
#[derive(Debug, Clone)]
pub struct ChatStorage {
    inner: snacksmart_storage::ChatStorage,
}

impl ChatStorage {
    pub fn new(inner: snacksmart_storage::ChatStorage) -> Self {
        Self { inner }
    }

    pub fn create(&self, chat: &Chat) -> Result<()> {
        let json = serde_json::to_string(chat)?;
        self.inner
            .insert_raw(&chat.id, &chat.user_id, chat.created_at, json.as_bytes())
    }

    pub fn get(&self, id: &str) -> Result<Option<Chat>> {
        self.inner
            .get_raw(id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Chats of one user, newest first.
    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Chat>> {
        self.inner
            .list_raw_by_user(user_id)?
            .into_iter()
            .map(|(_, bytes)| decode(&bytes))
            .collect()
    }
}
