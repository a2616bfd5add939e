//! Chat service: chat and message CRUD scoped to the caller, plus the send
//! session that streams an assistant reply into a placeholder message.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use snacksmart_ai::{
    AiError, CommitSink, CompletionRequest, LlmClient, Message as LlmMessage, RelayOutcome,
    StreamRelay,
};
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::error::{CoreError, Result};
use crate::models::{Chat, Message, MessageRole, UserProfile, now_ms};
use crate::prompt::{profile_chat_title, profile_message};
use crate::storage::{MessageStorage, Storage};

/// Content of the assistant message while its reply is being generated.
pub const PLACEHOLDER_REPLY: &str = "…";

/// Written into the assistant message when generation fails.
pub const FAILURE_REPLY: &str = "Hiba történt a válasz generálásakor. Kérlek, próbáld újra később.";

/// A chat created from a profile together with its opening message
#[derive(Debug, Clone)]
pub struct ProfileChat {
    pub chat: Chat,
    pub message: Message,
}

#[derive(Clone)]
pub struct ChatService {
    storage: Storage,
    llm: Arc<dyn LlmClient>,
    relay: StreamRelay,
    system_prompt: Arc<str>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ChatService {
    pub fn new(
        storage: Storage,
        llm: Arc<dyn LlmClient>,
        relay: StreamRelay,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            storage,
            llm,
            relay,
            system_prompt: system_prompt.into(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    pub fn create_chat(&self, ctx: &AuthContext, title: &str) -> Result<Chat> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("Chat title is required"));
        }

        let chat = Chat::new(&ctx.user_id, title);
        self.storage.chats.create(&chat)?;
        debug!(chat_id = %chat.id, user_id = %ctx.user_id, "Chat created");
        Ok(chat)
    }

    /// Chats of the caller, newest first.
    pub fn list_chats(&self, ctx: &AuthContext) -> Result<Vec<Chat>> {
        Ok(self.storage.chats.list_by_user(&ctx.user_id)?)
    }

    pub fn start_profile_chat(&self, ctx: &AuthContext, profile: &UserProfile) -> Result<ProfileChat> {
        profile.validate()?;
        let chat = self.create_chat(ctx, &profile_chat_title(profile))?;
        let message = Message::user(&chat.id, profile_message(profile));
        self.storage.messages.create(&message)?;
        Ok(ProfileChat { chat, message })
    }

    pub fn add_message(
        &self,
        ctx: &AuthContext,
        chat_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(CoreError::validation("Message content is required"));
        }
        self.owned_chat(ctx, chat_id)?;

        let message = Message::new(chat_id, role, content);
        self.storage.messages.create(&message)?;
        Ok(message)
    }

    pub fn update_message(&self, ctx: &AuthContext, message_id: &str, content: &str) -> Result<Message> {
        let mut message = self
            .storage
            .messages
            .get(message_id)?
            .ok_or_else(|| CoreError::not_found("Message"))?;
        self.owned_chat(ctx, &message.chat_id)?;

        message.content = content.to_string();
        message.updated_at = now_ms();
        self.storage.messages.update(&message)?;
        Ok(message)
    }

    /// Messages of a chat, oldest first.
    pub fn list_messages(&self, ctx: &AuthContext, chat_id: &str) -> Result<Vec<Message>> {
        self.owned_chat(ctx, chat_id)?;
        Ok(self.storage.messages.list_by_chat(chat_id)?)
    }

    /// Persist the user's message and an assistant placeholder, and prepare
    /// the upstream request. Only one send may be pending per chat.
    pub fn begin_send(&self, ctx: &AuthContext, chat_id: &str, text: &str) -> Result<PendingReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::validation("Message content is required"));
        }
        self.owned_chat(ctx, chat_id)?;

        let guard = SendGuard::acquire(self.in_flight.clone(), chat_id)?;

        let history = self.storage.messages.list_by_chat(chat_id)?;
        let user_message = Message::user(chat_id, text);
        self.storage.messages.create(&user_message)?;
        let placeholder = Message::assistant(chat_id, PLACEHOLDER_REPLY);
        self.storage.messages.create(&placeholder)?;

        let mut context = Vec::with_capacity(history.len() + 2);
        context.push(LlmMessage::system(self.system_prompt.to_string()));
        context.extend(history.iter().map(Message::to_llm));
        context.push(user_message.to_llm());

        debug!(
            chat_id,
            history = history.len(),
            placeholder_id = %placeholder.id,
            "Send prepared"
        );

        Ok(PendingReply {
            user_message,
            placeholder,
            request: CompletionRequest::new(context),
            llm: self.llm.clone(),
            relay: self.relay.clone(),
            messages: self.storage.messages.clone(),
            _guard: guard,
        })
    }

    /// [`ChatService::begin_send`] followed by [`PendingReply::run`].
    pub async fn send_message(&self, ctx: &AuthContext, chat_id: &str, text: &str) -> Result<SendOutcome> {
        self.begin_send(ctx, chat_id, text)?.run().await
    }

    fn owned_chat(&self, ctx: &AuthContext, chat_id: &str) -> Result<Chat> {
        let chat = self
            .storage
            .chats
            .get(chat_id)?
            .ok_or_else(|| CoreError::not_found("Chat"))?;
        if !chat.is_owned_by(&ctx.user_id) {
            return Err(CoreError::Forbidden);
        }
        Ok(chat)
    }
}

/// Marks a chat as having a reply in flight until dropped.
struct SendGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    chat_id: String,
}

impl SendGuard {
    fn acquire(in_flight: Arc<Mutex<HashSet<String>>>, chat_id: &str) -> Result<Self> {
        if !in_flight.lock().insert(chat_id.to_string()) {
            return Err(CoreError::SendInProgress(chat_id.to_string()));
        }
        Ok(Self {
            in_flight,
            chat_id: chat_id.to_string(),
        })
    }
}

impl Drop for SendGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.chat_id);
    }
}

/// A prepared send whose reply has not been generated yet.
pub struct PendingReply {
    user_message: Message,
    placeholder: Message,
    request: CompletionRequest,
    llm: Arc<dyn LlmClient>,
    relay: StreamRelay,
    messages: MessageStorage,
    _guard: SendGuard,
}

/// How a send session ended
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The reply was streamed and committed.
    Completed { message: Message, relay: RelayOutcome },
    /// Generation failed and the failure text was written instead.
    Failed { message: Message, error: String },
}

impl SendOutcome {
    /// The assistant message in its final state.
    pub fn message(&self) -> &Message {
        match self {
            SendOutcome::Completed { message, .. } | SendOutcome::Failed { message, .. } => message,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed { .. })
    }
}

impl PendingReply {
    pub fn chat_id(&self) -> &str {
        &self.user_message.chat_id
    }

    pub fn user_message(&self) -> &Message {
        &self.user_message
    }

    pub fn placeholder(&self) -> &Message {
        &self.placeholder
    }

    /// Stream the reply into the placeholder.
    ///
    /// Upstream and transport failures end in [`SendOutcome::Failed`]; an
    /// error is returned only when the failure text itself cannot be stored.
    pub async fn run(self) -> Result<SendOutcome> {
        let chat_id = self.chat_id().to_string();
        let sink = Arc::new(MessageCommitSink::new(
            self.messages.clone(),
            self.placeholder.clone(),
        ));

        let result = match self.llm.open_stream(self.request).await {
            Ok(body) => self.relay.relay(body, sink.clone()).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(relay) => {
                info!(
                    chat_id = %chat_id,
                    deltas = relay.deltas,
                    partial_commits = relay.partial_commits,
                    "Reply completed"
                );
                Ok(SendOutcome::Completed {
                    message: sink.current(),
                    relay,
                })
            }
            Err(error) => {
                warn!(chat_id = %chat_id, %error, "Reply generation failed");
                let message = write_failure(&self.messages, &self.placeholder).await?;
                Ok(SendOutcome::Failed {
                    message,
                    error: error.to_string(),
                })
            }
        }
    }
}

async fn write_failure(messages: &MessageStorage, placeholder: &Message) -> Result<Message> {
    let messages = messages.clone();
    let placeholder = placeholder.clone();
    let written = tokio::task::spawn_blocking(move || -> anyhow::Result<Message> {
        match messages.get(&placeholder.id)? {
            Some(mut message) => {
                message.content = FAILURE_REPLY.to_string();
                message.updated_at = now_ms();
                messages.update(&message)?;
                Ok(message)
            }
            None => {
                let message = Message::assistant(&placeholder.chat_id, FAILURE_REPLY);
                messages.create(&message)?;
                Ok(message)
            }
        }
    })
    .await
    .map_err(|e| CoreError::Storage(anyhow::anyhow!("failure write task panicked: {e}")))??;
    Ok(written)
}

/// Commit sink that rewrites one assistant message.
pub struct MessageCommitSink {
    messages: MessageStorage,
    message: Mutex<Message>,
}

impl MessageCommitSink {
    pub fn new(messages: MessageStorage, message: Message) -> Self {
        Self {
            messages,
            message: Mutex::new(message),
        }
    }

    /// The message as last written.
    pub fn current(&self) -> Message {
        self.message.lock().clone()
    }

    async fn write(&self, text: &str) -> snacksmart_ai::Result<()> {
        let mut next = self.current();
        next.content = text.to_string();
        next.updated_at = now_ms();

        let messages = self.messages.clone();
        let to_store = next.clone();
        tokio::task::spawn_blocking(move || messages.update(&to_store))
            .await
            .map_err(|e| AiError::Commit(format!("commit task panicked: {e}")))?
            .map_err(|e| AiError::Commit(e.to_string()))?;

        *self.message.lock() = next;
        Ok(())
    }
}

#[async_trait]
impl CommitSink for MessageCommitSink {
    async fn persist_partial(&self, text: &str) -> snacksmart_ai::Result<()> {
        self.write(text).await
    }

    async fn persist_final(&self, text: &str) -> snacksmart_ai::Result<()> {
        self.write(text).await
    }
}
