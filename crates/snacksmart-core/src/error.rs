//! Error types for the core crate

use snacksmart_ai::AiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailInUse,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("A reply is already being generated for chat {0}")]
    SendInProgress(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("Auth error: {0}")]
    Auth(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::Storage(error.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
