//! Plain-text rendering for the terminal.

use asktracker_core::{ChatMessage, ChatRole, FeedbackItem, Provider, UserId};
use chrono::NaiveDateTime;

pub fn timestamp(at: &NaiveDateTime) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}

/// One feedback record as a block of lines.
pub fn item(item: &FeedbackItem, me: UserId) -> String {
    let mut header = format!("#{} {}", item.id, item.title);
    if item.is_owned_by(me) {
        header.push_str("  (yours)");
    }

    let mut stamp = format!("Created {}", timestamp(&item.created_at));
    if item.was_modified() {
        stamp.push_str(&format!(" · Modified {}", timestamp(&item.modified_at)));
    }

    format!("{header}\n  {}\n  {stamp}", item.body)
}

pub fn items(list: &[FeedbackItem], me: UserId) -> String {
    if list.is_empty() {
        return "No feedback yet. Add some with `asktracker create`.".to_string();
    }
    list.iter()
        .map(|i| item(i, me))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn chat_line(message: &ChatMessage) -> String {
    let who = match message.role {
        ChatRole::Operator => "you",
        ChatRole::Assistant => "assistant",
    };
    format!("{who}> {}", message.content)
}

/// First line of a chat session: who answers, or why nobody will.
pub fn chat_banner(provider: Provider, model: &str, has_backend: bool) -> String {
    if has_backend {
        format!("Chatting with {} ({model})", provider.display_name())
    } else {
        format!(
            "{} needs a completion token; replies are offline guidance",
            provider.display_name()
        )
    }
}
