//! Ordered, in-memory storage for the messages of one chat session.

use crate::message::{Message, MessageId, Role};

/// The ordered sequence of messages shown on the chat screen.
///
/// Insertion order is display order. Messages are never removed; the store
/// lives exactly as long as the session that owns it.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the end of the conversation.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replaces the content of the message with the given id.
    ///
    /// Returns false, leaving the store untouched, if no message matches.
    pub fn update_content(&mut self, id: MessageId, new_content: impl Into<String>) -> bool {
        match self.find_mut(id) {
            Some(message) => {
                message.content = new_content.into();
                true
            }
            None => false,
        }
    }

    /// Appends `chunk` to the content of the message with the given id.
    ///
    /// Returns false, leaving the store untouched, if no message matches.
    pub fn append_content(&mut self, id: MessageId, chunk: &str) -> bool {
        match self.find_mut(id) {
            Some(message) => {
                message.content.push_str(chunk);
                true
            }
            None => false,
        }
    }

    /// Returns the message with the given id.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().rev().find(|message| message.id == id)
    }

    /// Returns the most recently appended message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns all messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Iterates over the messages in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no message has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the number of messages authored by `role`.
    pub fn count_role(&self, role: Role) -> usize {
        self.messages
            .iter()
            .filter(|message| message.role == role)
            .count()
    }

    // Streaming always targets the newest message, so search from the back.
    fn find_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().rev().find(|message| message.id == id)
    }
}

impl<'a> IntoIterator for &'a MessageStore {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::IdGenerator;

    #[test]
    fn append_preserves_order() {
        let mut ids = IdGenerator::new();
        let mut store = MessageStore::new();
        let question = ids.next_id();
        let answer = ids.next_id();
        store.append(Message::user(question, "Is wudu required?"));
        store.append(Message::assistant(answer));

        let order: Vec<_> = store.iter().map(|message| message.id).collect();
        assert_eq!(order, vec![question, answer]);
        assert_eq!(store.last().map(|m| m.id), Some(answer));
        assert_eq!(store.count_role(Role::User), 1);
        assert_eq!(store.count_role(Role::Assistant), 1);
    }

    #[test]
    fn update_content_replaces() {
        let mut ids = IdGenerator::new();
        let mut store = MessageStore::new();
        let id = ids.next_id();
        store.append(Message::assistant_with(id, "draft"));

        assert!(store.update_content(id, "final"));
        assert_eq!(store.get(id).unwrap().content, "final");
    }

    #[test]
    fn append_content_concatenates() {
        let mut ids = IdGenerator::new();
        let mut store = MessageStore::new();
        let id = ids.next_id();
        store.append(Message::assistant(id));

        assert!(store.append_content(id, "Eating "));
        assert!(store.append_content(id, ""));
        assert!(store.append_content(id, "camel meat breaks wudu."));
        assert_eq!(store.get(id).unwrap().content, "Eating camel meat breaks wudu.");
    }

    #[test]
    fn unknown_id_is_a_no_op() {
        let mut ids = IdGenerator::new();
        let mut store = MessageStore::new();
        let id = ids.next_id();
        let missing = ids.next_id();
        store.append(Message::user(id, "hello"));

        assert!(!store.update_content(missing, "ignored"));
        assert!(!store.append_content(missing, "ignored"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().content, "hello");
    }
}
