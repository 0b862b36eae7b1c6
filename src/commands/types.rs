//! Command, button and reply types.

use std::fmt;
use std::path::PathBuf;

/// Slash commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Greet the user and show the main keyboard.
    Start,

    /// Show the user's Telegram id and username.
    Id,

    /// Look up current weather; `None` when no city was given.
    Weather(Option<String>),

    /// Link to the weather website.
    Site,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Returns `None` if the text is not one of the known commands.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let after_slash = text.trim().strip_prefix('/')?;

        let (token, args) = match after_slash.split_once(char::is_whitespace) {
            Some((token, args)) => (token, args.trim()),
            None => (after_slash, ""),
        };

        // `/start@my_weather_bot` in group chats
        let name = token.split('@').next().unwrap_or(token).to_lowercase();

        match name.as_str() {
            "start" | "hello" | "halo" => Some(Self::Start),
            "id" => Some(Self::Id),
            "weather" => Some(Self::Weather(
                Some(args.to_owned()).filter(|city| !city.is_empty()),
            )),
            "site" | "website" => Some(Self::Site),
            _ => None,
        }
    }

    /// Returns the command name without the slash.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Id => "id",
            Self::Weather(_) => "weather",
            Self::Site => "site",
        }
    }

    /// Commands published to Telegram's command menu.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("start", "Начать работу с ботом"),
            ("weather", "Погода в городе: /weather Лондон"),
            ("id", "Показать твой ID и username"),
            ("site", "Открыть сайт погоды"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weather(Some(city)) => write!(f, "/weather {city}"),
            _ => write!(f, "/{}", self.name()),
        }
    }
}

/// Buttons of the main reply keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuButton {
    Weather,
    Subscribe,
    ChangeCity,
    Unsubscribe,
    Help,
}

impl MenuButton {
    /// Keyboard layout, two buttons per row.
    pub const LAYOUT: [&'static [Self]; 3] = [
        &[Self::Weather, Self::ChangeCity],
        &[Self::Unsubscribe, Self::Subscribe],
        &[Self::Help],
    ];

    const ALL: [Self; 5] = [
        Self::Weather,
        Self::Subscribe,
        Self::ChangeCity,
        Self::Unsubscribe,
        Self::Help,
    ];

    /// Text shown on the button and sent back when it is pressed.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weather => "🌤️ Узнать погоду",
            Self::Subscribe => "📅 Подписаться на рассылку",
            Self::ChangeCity => "🏙️ Сменить город",
            Self::Unsubscribe => "❌ Отписаться от рассылки",
            Self::Help => "❓ Помощь",
        }
    }

    /// Exact match of a message text against the button labels.
    #[must_use]
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|button| button.label() == text)
    }
}

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Chat the message came from; replies go here.
    pub chat_id: i64,
    /// Sender id, `0` when Telegram did not say who sent it.
    pub user_id: u64,
    /// Sender's @username, if they have one.
    pub username: Option<String>,
    /// Sender's first name, empty when unknown.
    pub first_name: String,
    /// Id of the message, used to quote it in replies.
    pub message_id: i32,
    /// Raw message text.
    pub text: String,
}

/// Keyboard attached to an outgoing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// The persistent reply keyboard with [`MenuButton`]s.
    MainMenu,
    /// A single inline button opening a URL.
    Link { label: String, url: String },
}

/// How Telegram should interpret the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

/// Outgoing text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReply {
    pub text: String,
    pub format: TextFormat,
    pub keyboard: Option<Keyboard>,
    /// Send as a reply quoting the incoming message.
    pub quote: bool,
}

/// One outgoing message produced by the router or the broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(TextReply),
    /// Picture uploaded from a local file.
    Photo(PathBuf),
}

impl Reply {
    /// Plain text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextReply {
            text: text.into(),
            format: TextFormat::Plain,
            keyboard: None,
            quote: false,
        })
    }

    /// Plain text sent as a reply to the incoming message.
    #[must_use]
    pub fn quote(text: impl Into<String>) -> Self {
        Self::Text(TextReply {
            text: text.into(),
            format: TextFormat::Plain,
            keyboard: None,
            quote: true,
        })
    }

    /// HTML-formatted text message.
    #[must_use]
    pub fn html(text: impl Into<String>) -> Self {
        Self::Text(TextReply {
            text: text.into(),
            format: TextFormat::Html,
            keyboard: None,
            quote: false,
        })
    }

    /// Attaches a keyboard. Photos are returned unchanged.
    #[must_use]
    pub fn with_keyboard(self, keyboard: Keyboard) -> Self {
        match self {
            Self::Text(reply) => Self::Text(TextReply {
                keyboard: Some(keyboard),
                ..reply
            }),
            photo @ Self::Photo(_) => photo,
        }
    }

    /// Text content, if this is a text reply.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match self {
            Self::Text(reply) => Some(&reply.text),
            Self::Photo(_) => None,
        }
    }
}
