//! User storage - byte-level API for account persistence.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use crate::SimpleStorage;

const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const USERS_BY_EMAIL: TableDefinition<&str, &str> = TableDefinition::new("users:by_email");

/// Low-level user storage with byte-level API
#[derive(Debug, Clone)]
pub struct UserStorage {
    db: Arc<Database>,
}

impl SimpleStorage for UserStorage {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]> = USERS_TABLE;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl UserStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(USERS_TABLE)?;
        write_txn.open_table(USERS_BY_EMAIL)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert a new user document together with its email index entry.
    ///
    /// The email must not be indexed yet; both writes share one transaction.
    pub fn insert_raw(&self, id: &str, email: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut by_email = write_txn.open_table(USERS_BY_EMAIL)?;
            if by_email.get(email)?.is_some() {
                return Err(anyhow::anyhow!("Email {} is already registered", email));
            }
            by_email.insert(email, id)?;

            let mut table = write_txn.open_table(USERS_TABLE)?;
            table.insert(id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Resolve a user ID from the email index
    pub fn find_id_by_email(&self, email: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let by_email = read_txn.open_table(USERS_BY_EMAIL)?;
        Ok(by_email.get(email)?.map(|id| id.value().to_string()))
    }

    /// Get raw user data by email
    pub fn get_raw_by_email(&self, email: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let by_email = read_txn.open_table(USERS_BY_EMAIL)?;
        let Some(id) = by_email.get(email)? else {
            return Ok(None);
        };

        let table = read_txn.open_table(USERS_TABLE)?;
        Ok(table.get(id.value())?.map(|data| data.value().to_vec()))
    }
}
