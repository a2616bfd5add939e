use tracing::{debug, info};

use super::{AuthContext, TokenIssuer, hash_password, verify_password};
use crate::error::{CoreError, Result};
use crate::models::{AuthSession, PublicUser, User};
use crate::storage::UserStorage;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(CoreError::validation("A valid email address is required"))
    }
}

/// Signup, login and token verification
#[derive(Debug, Clone)]
pub struct AuthManager {
    users: UserStorage,
    tokens: TokenIssuer,
}

impl AuthManager {
    pub fn new(users: UserStorage, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    pub async fn signup(&self, email: &str, name: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        let name = name.trim().to_string();
        validate_email(&email)?;
        if name.is_empty() {
            return Err(CoreError::validation("Name is required"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.users.email_exists(&email)? {
            return Err(CoreError::EmailInUse);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| CoreError::Auth(format!("password hashing task failed: {e}")))??;

        let user = User::new(email, name, password_hash);
        if let Err(error) = self.users.create(&user) {
            // Lost a race against a concurrent signup with the same email.
            if self.users.email_exists(&user.email)? {
                return Err(CoreError::EmailInUse);
            }
            return Err(error.into());
        }

        info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        let Some(user) = self.users.get_by_email(&email)? else {
            debug!("Login attempt for unknown email");
            return Err(CoreError::InvalidCredentials);
        };

        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| CoreError::Auth(format!("password verification task failed: {e}")))??;
        if !valid {
            debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(CoreError::InvalidCredentials);
        }

        self.session_for(&user)
    }

    /// Resolve a bearer token into the caller's identity.
    pub fn verify(&self, token: &str) -> Result<AuthContext> {
        self.tokens.verify(token)
    }

    /// The stored account behind a verified context.
    pub fn current_user(&self, ctx: &AuthContext) -> Result<PublicUser> {
        self.users
            .get(&ctx.user_id)?
            .map(|user| user.public())
            .ok_or_else(|| CoreError::Unauthorized("account no longer exists".to_string()))
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        Ok(AuthSession {
            token: self.tokens.issue(user)?,
            user: user.public(),
        })
    }
}
