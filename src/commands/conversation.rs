//! Per-chat conversation state.
//!
//! A chat is either idle or waiting for a city name. Receiving any message
//! in the waiting state consumes it and returns the chat to idle.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// What the awaited city will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    WeatherLookup,
    Subscribe,
    ChangeCity,
}

/// State of one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingCity(Purpose),
}

/// In-memory table of chats waiting for an answer. Not persisted.
#[derive(Debug, Default)]
pub struct Conversations {
    pending: Mutex<HashMap<i64, Purpose>>,
}

impl Conversations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next message of the chat an answer for `purpose`.
    /// A previous pending question is replaced.
    pub async fn await_city(&self, chat_id: i64, purpose: Purpose) {
        self.pending.lock().await.insert(chat_id, purpose);
    }

    /// Current state without changing it.
    #[cfg(test)]
    pub async fn state(&self, chat_id: i64) -> ConversationState {
        self.pending
            .lock()
            .await
            .get(&chat_id)
            .map_or(ConversationState::Idle, |&purpose| {
                ConversationState::AwaitingCity(purpose)
            })
    }

    /// Moves the chat to idle and returns the state it was in.
    pub async fn take(&self, chat_id: i64) -> ConversationState {
        self.pending
            .lock()
            .await
            .remove(&chat_id)
            .map_or(ConversationState::Idle, ConversationState::AwaitingCity)
    }

    /// Number of chats waiting for an answer.
    #[cfg(test)]
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_by_default() {
        let conversations = Conversations::new();
        assert_eq!(conversations.state(1).await, ConversationState::Idle);
        assert_eq!(conversations.take(1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_take_is_one_shot() {
        let conversations = Conversations::new();
        conversations.await_city(1, Purpose::Subscribe).await;

        assert_eq!(
            conversations.state(1).await,
            ConversationState::AwaitingCity(Purpose::Subscribe)
        );
        assert_eq!(
            conversations.take(1).await,
            ConversationState::AwaitingCity(Purpose::Subscribe)
        );
        assert_eq!(conversations.take(1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_chats_are_independent() {
        let conversations = Conversations::new();
        conversations.await_city(1, Purpose::WeatherLookup).await;
        conversations.await_city(2, Purpose::ChangeCity).await;
        conversations.await_city(1, Purpose::Subscribe).await;

        assert_eq!(conversations.pending_count().await, 2);
        assert_eq!(
            conversations.take(1).await,
            ConversationState::AwaitingCity(Purpose::Subscribe)
        );
        assert_eq!(
            conversations.state(2).await,
            ConversationState::AwaitingCity(Purpose::ChangeCity)
        );
    }
}
