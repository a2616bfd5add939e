use anyhow::Result;
use snacksmart_storage::SimpleStorage;

use super::decode;
use crate::models::Message;

/// Typed message storage wrapper around snacksmart-storage::MessageStorage.
#[derive(Debug, Clone)]
pub struct MessageStorage {
    inner: snacksmart_storage::MessageStorage,
}

impl MessageStorage {
    pub fn new(inner: snacksmart_storage::MessageStorage) -> Self {
        Self { inner }
    }

    pub fn create(&self, message: &Message) -> Result<()> {
        let json = serde_json::to_string(message)?;
        self.inner.insert_raw(
            &message.id,
            &message.chat_id,
            message.created_at,
            json.as_bytes(),
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Message>> {
        self.inner
            .get_raw(id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Overwrite an existing message document.
    pub fn update(&self, message: &Message) -> Result<()> {
        let json = serde_json::to_string(message)?;
        self.inner.put_raw(&message.id, json.as_bytes())
    }

    /// Messages of one chat, oldest first.
    pub fn list_by_chat(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.inner
            .list_raw_by_chat(chat_id)?
            .into_iter()
            .map(|(_, bytes)| decode(&bytes))
            .collect()
    }

    pub fn count_by_chat(&self, chat_id: &str) -> Result<usize> {
        self.inner.count_by_chat(chat_id)
    }
}
