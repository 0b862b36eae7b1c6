//! Update dispatching: Telegram messages in, routed replies out.

use std::error::Error;
use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error, warn};

use super::gateway::{ChatGateway, TelegramGateway};
use crate::commands::{IncomingMessage, MessageRouter, Reply};

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Converts a teloxide message. Non-text messages yield `None`.
#[must_use]
pub fn incoming_from(message: &Message) -> Option<IncomingMessage> {
    let text = message.text()?.to_owned();
    let user = message.from.as_ref();

    Some(IncomingMessage {
        chat_id: message.chat.id.0,
        user_id: user.map_or(0, |u| u.id.0),
        username: user.and_then(|u| u.username.clone()),
        first_name: user.map(|u| u.first_name.clone()).unwrap_or_default(),
        message_id: message.id.0,
        text,
    })
}

/// Sends replies in order. A failed photo is skipped, a failed text is logged.
pub async fn deliver_replies(
    gateway: &dyn ChatGateway,
    incoming: &IncomingMessage,
    replies: &[Reply],
) {
    for reply in replies {
        if let Err(e) = gateway
            .deliver(incoming.chat_id, reply, Some(incoming.message_id))
            .await
        {
            match reply {
                Reply::Photo(path) => {
                    warn!("Failed to send picture {}: {}", path.display(), e);
                }
                Reply::Text(_) => {
                    error!("Failed to reply in chat {}: {}", incoming.chat_id, e);
                }
            }
        }
    }
}

async fn handle_message(
    message: Message,
    router: Arc<MessageRouter>,
    gateway: Arc<TelegramGateway>,
) -> HandlerResult {
    let Some(incoming) = incoming_from(&message) else {
        debug!("Ignoring non-text message in chat {}", message.chat.id.0);
        return Ok(());
    };

    let replies = router.route(&incoming).await;
    deliver_replies(gateway.as_ref(), &incoming, &replies).await;
    Ok(())
}

/// Long-polls Telegram until Ctrl+C.
///
/// All updates share one distribution key, so messages are handled one at a
/// time and store read-modify-write sequences never interleave.
pub async fn run_dispatcher(gateway: Arc<TelegramGateway>, router: Arc<MessageRouter>) {
    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(gateway.bot().clone(), handler)
        .dependencies(dptree::deps![router, gateway])
        .distribution_function(|_| Some(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingGateway;
    use serde_json::json;

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).expect("valid message json")
    }

    fn incoming(chat_id: i64) -> IncomingMessage {
        IncomingMessage {
            chat_id,
            user_id: 1,
            username: None,
            first_name: "Bob".to_owned(),
            message_id: 3,
            text: "Paris".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_replies_delivered_in_order() {
        let gateway = RecordingGateway::new();
        let replies = vec![
            Reply::quote("first"),
            Reply::Photo("Солнечно.jpg".into()),
            Reply::text("second"),
        ];

        deliver_replies(&gateway, &incoming(5), &replies).await;

        let sent: Vec<Reply> = gateway.sent().into_iter().map(|(_, r)| r).collect();
        assert_eq!(sent, replies);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_panic() {
        let gateway = RecordingGateway::new().blocking(5);
        deliver_replies(&gateway, &incoming(5), &[Reply::text("lost")]).await;
        assert!(gateway.sent().is_empty());
    }

    #[test]
    fn test_incoming_from_private_text() {
        let msg = message(json!({
            "message_id": 7,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private", "first_name": "Alice", "username": "alice"},
            "from": {"id": 42, "is_bot": false, "first_name": "Alice", "username": "alice"},
            "text": "/id"
        }));

        let incoming = incoming_from(&msg).expect("text message");
        assert_eq!(incoming.chat_id, 42);
        assert_eq!(incoming.user_id, 42);
        assert_eq!(incoming.username.as_deref(), Some("alice"));
        assert_eq!(incoming.first_name, "Alice");
        assert_eq!(incoming.message_id, 7);
        assert_eq!(incoming.text, "/id");
    }

    #[test]
    fn test_incoming_from_without_sender() {
        let msg = message(json!({
            "message_id": 11,
            "date": 1_700_000_000,
            "chat": {"id": -1_001_234_567_890_i64, "type": "channel", "title": "Погода"},
            "text": "Москва"
        }));

        let incoming = incoming_from(&msg).expect("text message");
        assert_eq!(incoming.chat_id, -1_001_234_567_890);
        assert_eq!(incoming.user_id, 0);
        assert_eq!(incoming.username, None);
        assert!(incoming.first_name.is_empty());
        assert_eq!(incoming.text, "Москва");
    }

    #[test]
    fn test_incoming_from_non_text_is_none() {
        let msg = message(json!({
            "message_id": 8,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private", "first_name": "Alice"},
            "from": {"id": 42, "is_bot": false, "first_name": "Alice"},
            "location": {"latitude": 55.75, "longitude": 37.62}
        }));

        assert!(incoming_from(&msg).is_none());
    }
}
