//! Chat command handling.
//!
//! Parses slash commands and menu buttons, keeps per-chat conversation
//! state and produces the replies for every incoming message.

mod conversation;
mod router;
mod types;

pub use conversation::{ConversationState, Conversations, Purpose};
pub use router::MessageRouter;
pub use types::{
    BotCommand, IncomingMessage, Keyboard, MenuButton, Reply, TextFormat, TextReply,
};
