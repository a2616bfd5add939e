//! Message storage - byte-level API for chat message persistence.
//!
//! Assistant messages are rewritten many times while a reply streams in, so
//! updates only touch the document table and never the `by_chat` index.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use crate::SimpleStorage;
use crate::index::{oldest_first_key, scan_owner};

const MESSAGES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");
const MESSAGES_BY_CHAT: TableDefinition<&str, &str> = TableDefinition::new("messages:by_chat");
const MESSAGES_SEQUENCE: TableDefinition<&str, u64> = TableDefinition::new("messages:sequence");

const SEQUENCE_KEY: &str = "next";

/// Low-level message storage with byte-level API
#[derive(Debug, Clone)]
pub struct MessageStorage {
    db: Arc<Database>,
}

impl SimpleStorage for MessageStorage {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]> = MESSAGES_TABLE;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl MessageStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MESSAGES_TABLE)?;
        write_txn.open_table(MESSAGES_BY_CHAT)?;
        write_txn.open_table(MESSAGES_SEQUENCE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert a new message document and index it under its chat.
    ///
    /// Returns the sequence number assigned to the message.
    pub fn insert_raw(&self, id: &str, chat_id: &str, created_at: i64, data: &[u8]) -> Result<u64> {
        let write_txn = self.db.begin_write()?;
        let sequence = {
            let mut table = write_txn.open_table(MESSAGES_TABLE)?;
            if table.get(id)?.is_some() {
                return Err(anyhow::anyhow!("Message {} already exists", id));
            }
            table.insert(id, data)?;

            let mut sequences = write_txn.open_table(MESSAGES_SEQUENCE)?;
            let sequence = sequences
                .get(SEQUENCE_KEY)?
                .map(|value| value.value())
                .unwrap_or(0);
            sequences.insert(SEQUENCE_KEY, sequence + 1)?;

            let mut by_chat = write_txn.open_table(MESSAGES_BY_CHAT)?;
            let key = oldest_first_key(chat_id, created_at, sequence);
            by_chat.insert(key.as_str(), id)?;

            sequence
        };
        write_txn.commit()?;
        Ok(sequence)
    }

    /// List raw message data for one chat, oldest first
    pub fn list_raw_by_chat(&self, chat_id: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let by_chat = read_txn.open_table(MESSAGES_BY_CHAT)?;
        let table = read_txn.open_table(MESSAGES_TABLE)?;

        let mut messages = Vec::new();
        for id in scan_owner(&by_chat, chat_id)? {
            if let Some(data) = table.get(id.as_str())? {
                messages.push((id, data.value().to_vec()));
            }
        }

        Ok(messages)
    }

    /// Count messages indexed under one chat
    pub fn count_by_chat(&self, chat_id: &str) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let by_chat = read_txn.open_table(MESSAGES_BY_CHAT)?;
        Ok(scan_owner(&by_chat, chat_id)?.len())
    }
}
