//! Conversation state for the answer pipeline.
//!
//! An ordered, append-only sequence of chat messages. Once appended, a turn
//! is never mutated or removed; pipeline stages only append. The type
//! exposes no mutation beyond `push`, which is what makes concurrent
//! pipeline runs over separate conversations safe.

use mes_droits_llm::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// Append-only message log threaded through every pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation from seed turns.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    /// Create a conversation seeded with a single user question.
    pub fn with_user(question: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(question)],
        }
    }

    /// Append a turn.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no turns.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recently appended turn.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// All turns, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Consume the conversation, yielding its turns.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }

    /// Content of the last assistant turn, if any.
    ///
    /// Callers that only need the final answer of a completed pipeline run
    /// read this.
    pub fn final_answer(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_user_seeds_one_turn() {
        let conversation = Conversation::with_user("Quels sont mes droits ?");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::User);
    }

    #[test]
    fn test_push_appends_in_order() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("question"));
        conversation.push(ChatMessage::assistant("réponse"));

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last().unwrap().content, "réponse");
        assert_eq!(conversation.messages()[0].content, "question");
    }

    #[test]
    fn test_final_answer_skips_tool_turns() {
        let mut conversation = Conversation::with_user("question");
        conversation.push(ChatMessage::assistant("la réponse"));
        conversation.push(ChatMessage::tool("résultat", "id1", "search"));

        assert_eq!(conversation.final_answer(), Some("la réponse"));
    }

    #[test]
    fn test_final_answer_empty_conversation() {
        assert_eq!(Conversation::new().final_answer(), None);
    }
}
