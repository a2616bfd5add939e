use serde::{Deserialize, Serialize};
use snacksmart_ai::Message as LlmMessage;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, role: MessageRole, content: impl Into<String>) -> Self {
        let now = super::now_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            role,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn user(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(chat_id, MessageRole::User, content)
    }

    pub fn assistant(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(chat_id, MessageRole::Assistant, content)
    }

    /// Upstream representation used as completion context
    pub fn to_llm(&self) -> LlmMessage {
        match self.role {
            MessageRole::User => LlmMessage::user(self.content.clone()),
            MessageRole::Assistant => LlmMessage::assistant(self.content.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snacksmart_ai::Role;

    #[test]
    fn test_role_serializes_lowercase() {
        let message = Message::assistant("chat-1", "…");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["created_at"], json["updated_at"]);
    }

    #[test]
    fn test_to_llm_keeps_role_and_content() {
        let llm = Message::user("chat-1", "Mennyi fehérje kell?").to_llm();
        assert_eq!(llm.role, Role::User);
        assert_eq!(llm.content, "Mennyi fehérje kell?");
    }
}
