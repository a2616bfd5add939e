//! Account authentication: password hashing, signed session tokens and the
//! signup/login flows built on top of them.

mod manager;
mod password;
mod token;

use serde::{Deserialize, Serialize};

pub use manager::{AuthManager, MIN_PASSWORD_LEN, normalize_email};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer};

pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 14;

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

fn default_token_ttl_days() -> i64 {
    DEFAULT_TOKEN_TTL_DAYS
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
        }
    }
}

/// Identity of the caller, resolved from a verified token.
///
/// Every user-scoped operation takes one explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub email: String,
    pub name: String,
}
