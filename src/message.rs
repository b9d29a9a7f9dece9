use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a message within one chat session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Returns the raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out session-unique message identifiers from a monotonic counter.
#[derive(Debug)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Create a generator whose first identifier is 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next identifier.
    pub fn next_id(&mut self) -> MessageId {
        let id = MessageId(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Who authored a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,

    /// The answering service.
    Assistant,
}

/// A single entry in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Session-unique identifier.
    pub id: MessageId,

    /// The author of the message.
    pub role: Role,

    /// The text of the message.
    pub content: String,
}

impl Message {
    /// Create a new `Message`.
    pub fn new(id: MessageId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::User, content)
    }

    /// Create an empty assistant message that will be filled as the answer streams in.
    pub fn assistant(id: MessageId) -> Self {
        Self::new(id, Role::Assistant, String::new())
    }

    /// Create an assistant message with fixed content.
    pub fn assistant_with(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant, content)
    }

    /// Returns true if this message was authored by the user.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Returns true if this message was authored by the answering service.
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Returns true if the content has no visible characters.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut ids = IdGenerator::new();
        let first = ids.next_id();
        let second = ids.next_id();
        let third = ids.next_id();
        assert_eq!(first.get(), 1);
        assert!(first < second && second < third);
    }

    #[test]
    fn assistant_starts_empty() {
        let mut ids = IdGenerator::new();
        let message = Message::assistant(ids.next_id());
        assert!(message.is_assistant());
        assert!(message.content.is_empty());
        assert!(message.is_blank());
    }

    #[test]
    fn message_serialization() {
        let mut ids = IdGenerator::new();
        let message = Message::user(ids.next_id(), "What breaks wudu?");
        let json = to_value(&message).unwrap();
        assert_eq!(
            json,
            json!({
                "id": 1,
                "role": "user",
                "content": "What breaks wudu?"
            })
        );
    }
}
