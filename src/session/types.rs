use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum preview length before the first user message is truncated.
pub const PREVIEW_MAX_CHARS: usize = 30;

/// Preview used for sessions with no user message yet.
pub const DEFAULT_PREVIEW: &str = "New Chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn is_user(&self) -> bool {
        matches!(self, Sender::User)
    }
}

/// A single conversation message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }
}

/// Opaque session identifier derived from creation time (ms since epoch).
pub type SessionId = i64;

/// One conversation thread: identifier, sidebar preview, ordered message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub preview: String,
    pub messages: Vec<Message>,
}

impl Session {
    /// Create a session, optionally seeded with a first user message.
    ///
    /// The preview is the explicit title if given, otherwise derived from
    /// the seed message, otherwise a default label.
    pub fn new(id: SessionId, initial_message: Option<&str>, title: Option<&str>) -> Self {
        let preview = match (title, initial_message) {
            (Some(t), _) => t.to_string(),
            (None, Some(m)) => derive_preview(m),
            (None, None) => DEFAULT_PREVIEW.to_string(),
        };
        let messages = initial_message
            .map(|m| vec![Message::user(m)])
            .unwrap_or_default();
        Self {
            id,
            preview,
            messages,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// First user message in the log, if any.
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.sender.is_user())
    }

    /// Recompute the preview from the first user message.
    pub fn refresh_preview(&mut self) {
        if let Some(msg) = self.first_user_message() {
            self.preview = derive_preview(&msg.text);
        }
    }
}

/// Derive a short sidebar preview from a message, truncating long text.
pub fn derive_preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_MAX_CHARS {
        let truncated: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else if text.is_empty() {
        DEFAULT_PREVIEW.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_preview_is_verbatim() {
        assert_eq!(derive_preview("Hello"), "Hello");
    }

    #[test]
    fn test_long_preview_is_truncated() {
        let text = "a".repeat(45);
        let preview = derive_preview(&text);
        assert_eq!(preview, format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn test_preview_truncation_respects_char_boundaries() {
        let text = "日".repeat(40);
        let preview = derive_preview(&text);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 3);
    }

    #[test]
    fn test_empty_preview_falls_back() {
        assert_eq!(derive_preview(""), DEFAULT_PREVIEW);
    }

    #[test]
    fn test_session_seeded_with_message() {
        let session = Session::new(1, Some("Hello"), None);
        assert_eq!(session.preview, "Hello");
        assert_eq!(session.messages.len(), 1);
        assert!(session.messages[0].sender.is_user());
    }

    #[test]
    fn test_session_title_wins_over_seed() {
        let session = Session::new(1, Some("Hello"), Some("Greetings"));
        assert_eq!(session.preview, "Greetings");
    }

    #[test]
    fn test_empty_session_has_default_preview() {
        let session = Session::new(1, None, None);
        assert_eq!(session.preview, DEFAULT_PREVIEW);
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_refresh_preview_uses_first_user_message() {
        let mut session = Session::new(1, None, Some("Placeholder"));
        session.push(Message::user("Is free will an illusion?"));
        session.push(Message::assistant("Consider the premise."));
        session.refresh_preview();
        assert_eq!(session.preview, "Is free will an illusion?");
    }

    #[test]
    fn test_message_serde_round_trip() {
        let msg = Message::assistant("Hi there");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, msg.id);
        assert_eq!(back.text, "Hi there");
        assert_eq!(back.sender, Sender::Assistant);
    }
}
