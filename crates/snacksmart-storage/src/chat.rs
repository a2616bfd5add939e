//! Chat storage - byte-level API for chat persistence.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use crate::SimpleStorage;
use crate::index::{newest_first_key, scan_owner};

const CHATS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chats");
const CHATS_BY_USER: TableDefinition<&str, &str> = TableDefinition::new("chats:by_user");

/// Low-level chat storage with byte-level API
#[derive(Debug, Clone)]
pub struct ChatStorage {
    db: Arc<Database>,
}

impl SimpleStorage for ChatStorage {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]> = CHATS_TABLE;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl ChatStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CHATS_TABLE)?;
        write_txn.open_table(CHATS_BY_USER)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert a new chat document and index it under its owner
    pub fn insert_raw(&self, id: &str, user_id: &str, created_at: i64, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHATS_TABLE)?;
            if table.get(id)?.is_some() {
                return Err(anyhow::anyhow!("Chat {} already exists", id));
            }
            table.insert(id, data)?;

            let mut by_user = write_txn.open_table(CHATS_BY_USER)?;
            let key = newest_first_key(user_id, created_at, id);
            by_user.insert(key.as_str(), id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// List raw chat data for one owner, newest first
    pub fn list_raw_by_user(&self, user_id: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let by_user = read_txn.open_table(CHATS_BY_USER)?;
        let table = read_txn.open_table(CHATS_TABLE)?;

        let mut chats = Vec::new();
        for id in scan_owner(&by_user, user_id)? {
            if let Some(data) = table.get(id.as_str())? {
                chats.push((id, data.value().to_vec()));
            }
        }

        Ok(chats)
    }
}
