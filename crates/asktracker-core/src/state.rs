//! UI-agnostic conversation types
//!
//! Shared by the chat controller, the AI provider clients and whatever front
//! end renders the conversation.

use serde::{Deserialize, Serialize};

/// A chat message in the assistant conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn operator(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Operator,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
///
/// The person at the keyboard is `user` on the wire, matching the
/// chat-completion APIs the providers speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    #[serde(rename = "user")]
    Operator,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::Operator => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}
