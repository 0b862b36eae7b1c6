//! Delivery of replies to Telegram chats.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand as MenuCommand, InlineKeyboardButton, InlineKeyboardMarkup, InputFile,
    KeyboardButton, KeyboardMarkup, MessageId, ParseMode, ReplyMarkup, ReplyParameters,
};
use thiserror::Error;
use tracing::debug;

use crate::commands::{BotCommand, Keyboard, MenuButton, Reply, TextFormat};

/// Errors that can occur while sending to Telegram.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("Invalid button URL '{0}'")]
    InvalidUrl(String),
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Sends one reply to a chat. `reply_to` is quoted when the reply asks for it.
    async fn deliver(
        &self,
        chat_id: i64,
        reply: &Reply,
        reply_to: Option<i32>,
    ) -> Result<(), GatewayError>;
}

/// Bot API gateway backed by teloxide.
#[derive(Debug, Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    /// Creates a gateway for the given bot token.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// Underlying teloxide bot, used by the dispatcher.
    #[must_use]
    pub const fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Checks the token and returns the bot's username.
    ///
    /// # Errors
    ///
    /// Returns an error if Telegram rejects the token or is unreachable.
    pub async fn check_connection(&self) -> Result<String, GatewayError> {
        let me = self.bot.get_me().await?;
        Ok(me.username().to_owned())
    }

    /// Publishes the slash commands shown in Telegram's command menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn register_commands(&self) -> Result<(), GatewayError> {
        let commands: Vec<MenuCommand> = BotCommand::all_commands()
            .into_iter()
            .map(|(name, description)| MenuCommand::new(name, description))
            .collect();

        self.bot.set_my_commands(commands).await?;
        debug!("Registered bot commands");
        Ok(())
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn deliver(
        &self,
        chat_id: i64,
        reply: &Reply,
        reply_to: Option<i32>,
    ) -> Result<(), GatewayError> {
        let chat = ChatId(chat_id);

        match reply {
            Reply::Text(text) => {
                let mut request = self.bot.send_message(chat, text.text.clone());

                if text.format == TextFormat::Html {
                    request = request.parse_mode(ParseMode::Html);
                }
                if let Some(keyboard) = &text.keyboard {
                    request = request.reply_markup(reply_markup(keyboard)?);
                }
                if text.quote
                    && let Some(message_id) = reply_to
                {
                    request = request.reply_parameters(ReplyParameters::new(MessageId(message_id)));
                }

                request.await?;
            }
            Reply::Photo(path) => {
                self.bot
                    .send_photo(chat, InputFile::file(path.clone()))
                    .await?;
            }
        }

        Ok(())
    }
}

/// The persistent main menu keyboard.
#[must_use]
pub fn main_menu() -> KeyboardMarkup {
    let rows = MenuButton::LAYOUT.iter().map(|row| {
        row.iter()
            .map(|button| KeyboardButton::new(button.label()))
            .collect::<Vec<_>>()
    });
    KeyboardMarkup::new(rows).resize_keyboard()
}

fn reply_markup(keyboard: &Keyboard) -> Result<ReplyMarkup, GatewayError> {
    match keyboard {
        Keyboard::MainMenu => Ok(ReplyMarkup::Keyboard(main_menu())),
        Keyboard::Link { label, url } => {
            let parsed =
                reqwest::Url::parse(url).map_err(|_| GatewayError::InvalidUrl(url.clone()))?;
            Ok(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new([[
                InlineKeyboardButton::url(label.clone(), parsed),
            ]])))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_layout() {
        let markup = main_menu();
        let labels: Vec<Vec<&str>> = markup
            .keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.text.as_str()).collect())
            .collect();

        assert_eq!(
            labels,
            vec![
                vec!["🌤️ Узнать погоду", "🏙️ Сменить город"],
                vec!["❌ Отписаться от рассылки", "📅 Подписаться на рассылку"],
                vec!["❓ Помощь"],
            ]
        );
    }

    #[test]
    fn test_link_keyboard() {
        let keyboard = Keyboard::Link {
            label: "🌐 Открыть".to_owned(),
            url: "https://yandex.ru/pogoda".to_owned(),
        };
        let Ok(ReplyMarkup::InlineKeyboard(markup)) = reply_markup(&keyboard) else {
            panic!("expected inline keyboard");
        };
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0][0].text, "🌐 Открыть");
    }

    #[test]
    fn test_invalid_link_url() {
        let keyboard = Keyboard::Link {
            label: "site".to_owned(),
            url: "not a url".to_owned(),
        };
        assert!(matches!(
            reply_markup(&keyboard),
            Err(GatewayError::InvalidUrl(url)) if url == "not a url"
        ));
    }
}
