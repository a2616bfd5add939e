//! Application services orchestrating storage, auth and the upstream model.

pub mod chat;

pub use chat::{
    ChatService, FAILURE_REPLY, MessageCommitSink, PLACEHOLDER_REPLY, PendingReply, ProfileChat,
    SendOutcome,
};
