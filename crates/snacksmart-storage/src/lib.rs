//! SnackSmart Storage - Low-level storage abstraction layer
//!
//! This crate provides the persistence layer for SnackSmart, using redb as the
//! embedded database. It exposes byte-level APIs so the model types can live
//! in snacksmart-core without a dependency cycle.
//!
//! # Tables
//!
//! - `users` / `users:by_email` - Accounts and the unique email lookup
//! - `chats` / `chats:by_user` - Chats, listed newest first per owner
//! - `messages` / `messages:by_chat` - Messages, listed oldest first per chat
//! - `messages:sequence` - Insertion counter used to break timestamp ties

pub mod chat;
pub mod index;
pub mod message;
pub mod simple_storage;
pub mod user;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

pub use chat::ChatStorage;
pub use message::MessageStorage;
pub use simple_storage::SimpleStorage;
pub use user::UserStorage;

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub users: UserStorage,
    pub chats: ChatStorage,
    pub messages: MessageStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);
        Self::from_db(db)
    }

    /// Build the storage subsystems on an already opened database.
    pub fn from_db(db: Arc<Database>) -> Result<Self> {
        let users = UserStorage::new(db.clone())?;
        let chats = ChatStorage::new(db.clone())?;
        let messages = MessageStorage::new(db.clone())?;

        tracing::debug!("Storage tables initialized");

        Ok(Self {
            db,
            users,
            chats,
            messages,
        })
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_storage_creates_all_tables() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("snacksmart.db");
        let storage = Storage::new(db_path.to_str().unwrap()).unwrap();

        assert_eq!(storage.users.count().unwrap(), 0);
        assert_eq!(storage.chats.count().unwrap(), 0);
        assert_eq!(storage.messages.count().unwrap(), 0);
    }

    #[test]
    fn test_storage_reopens_existing_database() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("snacksmart.db");
        let path = db_path.to_str().unwrap();

        {
            let storage = Storage::new(path).unwrap();
            storage
                .users
                .insert_raw("user-1", "a@example.com", b"{}")
                .unwrap();
        }

        let storage = Storage::new(path).unwrap();
        assert_eq!(storage.users.count().unwrap(), 1);
        assert_eq!(
            storage.users.find_id_by_email("a@example.com").unwrap(),
            Some("user-1".to_string())
        );
    }
}
