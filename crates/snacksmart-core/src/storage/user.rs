use anyhow::Result;
use snacksmart_storage::SimpleStorage;

use super::decode;
use crate::models::User;

/// Typed user storage wrapper around snacksmart-storage::UserStorage.
#[derive(Debug, Clone)]
pub struct UserStorage {
    inner: snacksmart_storage::UserStorage,
}

impl UserStorage {
    pub fn new(inner: snacksmart_storage::UserStorage) -> Self {
        Self { inner }
    }

    /// Create a new user; fails if the email is already registered.
    pub fn create(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)?;
        self.inner.insert_raw(&user.id, &user.email, json.as_bytes())
    }

    pub fn get(&self, id: &str) -> Result<Option<User>> {
        self.inner
            .get_raw(id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.inner
            .get_raw_by_email(email)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.inner.find_id_by_email(email)?.is_some())
    }

    pub fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}
