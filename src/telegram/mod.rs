//! Telegram Bot API transport.
//!
//! Incoming updates are converted to [`IncomingMessage`](crate::commands::IncomingMessage)s
//! and routed; replies go back through a [`ChatGateway`].

mod dispatch;
mod gateway;

pub use dispatch::{deliver_replies, incoming_from, run_dispatcher};
pub use gateway::{ChatGateway, GatewayError, TelegramGateway, main_menu};
