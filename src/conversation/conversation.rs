use uuid::Uuid;

use super::Message;

/// The ordered dialogue of a single agent run.
///
/// Messages can only be appended, so the model always sees a prefix of the
/// final history. A conversation lives for one run and is then dropped.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    messages: Vec<Message>,
}

impl Conversation {
    /// Starts a conversation with an optional system prompt and the user question.
    pub fn new(system_prompt: &str, user_query: impl Into<String>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(Message::system(system_prompt));
        }
        messages.push(Message::user(user_query));

        Self {
            id: Uuid::new_v4(),
            messages,
        }
    }

    /// Returns the unique identifier of this conversation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns all messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the last message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether the conversation has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
