//! Routing of incoming chat messages to replies.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, error, info, warn};

use super::conversation::{ConversationState, Conversations, Purpose};
use super::types::{BotCommand, IncomingMessage, Keyboard, MenuButton, Reply};
use crate::config::BotSettings;
use crate::storage::UserStore;
use crate::weather::{WeatherError, WeatherProvider, classify, render_current};

const CITY_NOT_FOUND: &str = "❌ Такого города не существует! Введите существующий город";
const EMPTY_CITY: &str = "❌ Вы не ввели город. Попробуйте снова.";
const CONNECTION_ERROR: &str = "❌ Ошибка соединения. Попробуйте позже.";
const GENERIC_ERROR: &str = "❌ Произошла ошибка. Попробуйте другой город.";
const LOOKUP_ERROR: &str = "❌ Не удалось получить погоду. Попробуйте позже.";

/// Turns incoming messages into replies.
///
/// Precedence: a known command first (it also cancels any pending question),
/// then an answer to a pending question, then a menu button, then free text
/// as a city lookup. Unknown slash commands are ignored.
pub struct MessageRouter {
    store: Arc<dyn UserStore>,
    weather: Arc<dyn WeatherProvider>,
    conversations: Conversations,
    photos_dir: PathBuf,
    site_url: String,
    broadcast_time: NaiveTime,
}

impl MessageRouter {
    /// Creates a router with an empty conversation table.
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        weather: Arc<dyn WeatherProvider>,
        settings: &BotSettings,
    ) -> Self {
        Self {
            store,
            weather,
            conversations: Conversations::new(),
            photos_dir: settings.photos_dir.clone(),
            site_url: settings.weather_site_url.clone(),
            broadcast_time: settings.broadcast_time,
        }
    }

    /// Pending questions per chat.
    #[must_use]
    pub const fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    /// Produces the replies for one incoming message, in sending order.
    pub async fn route(&self, message: &IncomingMessage) -> Vec<Reply> {
        if let Some(command) = BotCommand::parse(&message.text) {
            if let ConversationState::AwaitingCity(purpose) =
                self.conversations.take(message.chat_id).await
            {
                debug!(
                    "Command {} cancels pending {:?} question in chat {}",
                    command, purpose, message.chat_id
                );
            }
            debug!("Handling command: {}", command);
            return self.handle_command(command, message).await;
        }

        if let ConversationState::AwaitingCity(purpose) =
            self.conversations.take(message.chat_id).await
        {
            return self.handle_answer(purpose, message).await;
        }

        if let Some(button) = MenuButton::from_label(&message.text) {
            debug!("Menu button {:?} in chat {}", button, message.chat_id);
            return self.handle_button(button, message).await;
        }

        if message.text.starts_with('/') {
            debug!("Ignoring unknown command: {}", message.text);
            return Vec::new();
        }

        self.lookup_weather(message.text.trim()).await
    }

    async fn handle_command(&self, command: BotCommand, message: &IncomingMessage) -> Vec<Reply> {
        match command {
            BotCommand::Start => self.welcome(message),
            BotCommand::Id => vec![Reply::quote(format!(
                "🆔 Твой ID: {}\n📱 Username: {}",
                message.user_id,
                message
                    .username
                    .as_deref()
                    .map_or_else(|| "не указан".to_owned(), |name| format!("@{name}")),
            ))],
            BotCommand::Weather(Some(city)) => self.lookup_weather(&city).await,
            BotCommand::Weather(None) => vec![Reply::quote(
                "Пожалуйста, укажите город: /weather 'город' ",
            )],
            BotCommand::Site => vec![
                Reply::text("Нажми на кнопку ниже чтобы открыть сайт погоды:").with_keyboard(
                    Keyboard::Link {
                        label: "🌐 Открыть Яндекс.Погоду".to_owned(),
                        url: self.site_url.clone(),
                    },
                ),
            ],
        }
    }

    async fn handle_button(&self, button: MenuButton, message: &IncomingMessage) -> Vec<Reply> {
        let chat_id = message.chat_id;

        match button {
            MenuButton::Weather => {
                self.conversations
                    .await_city(chat_id, Purpose::WeatherLookup)
                    .await;
                vec![Reply::text("Введите название города:")]
            }
            MenuButton::Subscribe => {
                self.conversations.await_city(chat_id, Purpose::Subscribe).await;
                vec![Reply::text("Введите город для ежедневной рассылки:")]
            }
            MenuButton::ChangeCity => {
                let prompt = match self.store.get_city(&chat_id.to_string()) {
                    Some(city) => {
                        format!("Твой текущий город: {city} \nВведите новый город для рассылки.")
                    }
                    None => "Введите город для рассылки:".to_owned(),
                };
                self.conversations
                    .await_city(chat_id, Purpose::ChangeCity)
                    .await;
                vec![Reply::text(prompt)]
            }
            MenuButton::Unsubscribe => match self.store.unsubscribe(&chat_id.to_string()) {
                Ok(true) => {
                    info!("User {} unsubscribed", chat_id);
                    vec![Reply::text("❌ Ты отписался от ежедневной рассылки.")]
                }
                Ok(false) => vec![Reply::text("🤔 Ты не был подписан на рассылку.")],
                Err(e) => {
                    error!("Failed to unsubscribe user {}: {}", chat_id, e);
                    vec![Reply::text("❌ Произошла ошибка. Попробуйте позже.")]
                }
            },
            MenuButton::Help => vec![Reply::html(self.help_text())],
        }
    }

    async fn handle_answer(&self, purpose: Purpose, message: &IncomingMessage) -> Vec<Reply> {
        let city = message.text.trim();
        if city.is_empty() {
            return vec![Reply::text(EMPTY_CITY)];
        }

        match purpose {
            Purpose::WeatherLookup => self.lookup_weather(city).await,
            Purpose::Subscribe | Purpose::ChangeCity => {
                vec![self.save_city(purpose, message.chat_id, city).await]
            }
        }
    }

    /// Validates the city against the provider before storing it.
    async fn save_city(&self, purpose: Purpose, chat_id: i64, city: &str) -> Reply {
        match self.weather.current(city).await {
            Ok(_) => match self.store.set_city(&chat_id.to_string(), city) {
                Ok(()) => {
                    info!("User {} subscribed for city {}", chat_id, city);
                    if purpose == Purpose::ChangeCity {
                        Reply::text(format!("✅ Город изменен на {city}!"))
                    } else {
                        Reply::text(format!(
                            "✅ Ты подписан на ежедневную рассылку погоды для города {city}!"
                        ))
                    }
                }
                Err(e) => {
                    error!("Failed to save city for user {}: {}", chat_id, e);
                    Reply::text(GENERIC_ERROR)
                }
            },
            Err(e) if e.is_not_found() => {
                debug!("City '{}' rejected by provider: {}", city, e);
                if purpose == Purpose::ChangeCity {
                    Reply::text("❌ Город не найден. Проверь название и попробуй снова.")
                } else {
                    Reply::text(format!(
                        "❌ Город '{city}' не найден. Попробуйте:\n• Москва\n• London\n• Paris"
                    ))
                }
            }
            Err(e) => Reply::text(Self::failure_text(&e, GENERIC_ERROR)),
        }
    }

    async fn lookup_weather(&self, city: &str) -> Vec<Reply> {
        if city.is_empty() {
            return vec![Reply::quote(EMPTY_CITY)];
        }

        let conditions = match self.weather.current(city).await {
            Ok(conditions) => conditions,
            Err(e) if e.is_not_found() => {
                debug!("City '{}' not found: {}", city, e);
                return vec![Reply::quote(CITY_NOT_FOUND)];
            }
            Err(e) => return vec![Reply::quote(Self::failure_text(&e, LOOKUP_ERROR))],
        };

        let category = classify(&conditions.main, &conditions.description);
        let mut replies = vec![Reply::quote(render_current(&conditions, category))];

        let picture = self.photos_dir.join(category.image_file());
        if picture.is_file() {
            replies.push(Reply::Photo(picture));
        } else if self.photos_dir.is_dir() {
            debug!("No picture at {}", picture.display());
        } else {
            warn!("Photos directory {} not found", self.photos_dir.display());
        }

        replies
    }

    fn failure_text(error: &WeatherError, fallback: &'static str) -> &'static str {
        if error.is_transport() {
            warn!("Weather provider unreachable: {}", error);
            CONNECTION_ERROR
        } else {
            warn!("Weather request failed: {}", error);
            fallback
        }
    }

    fn welcome(&self, message: &IncomingMessage) -> Vec<Reply> {
        let welcome = format!(
            "Привет, {}! 👋\n\
             \n\
             Я бот погоды, который поможет тебе:\n\
             • Узнать текущую погоду в любом городе 🌤️\n\
             • Получать ежедневный прогноз в {} утра 📅\n\
             \n\
             Выбери действие или просто напиши название города!",
            message.first_name,
            self.broadcast_time.format("%-H:%M"),
        );

        vec![
            Reply::text(welcome).with_keyboard(Keyboard::MainMenu),
            Reply::text(format!(
                "Хочешь получать погоду каждый день? Нажми '{}'!",
                MenuButton::Subscribe.label()
            )),
        ]
    }

    fn help_text(&self) -> String {
        format!(
            "📖 <b>Помощь по боту:</b>\n\
             \n\
             <b>Основные команды:</b>\n\
             • <i>Просто напиши город</i> - узнать погоду\n\
             • {} - запросить погоду для любого города\n\
             • {} - получать погоду каждый день в {}\n\
             • {} - изменить город для рассылки\n\
             • {} - остановить ежедневные уведомления\n\
             • <code>/id</code> - показать твой ID и username\n\
             \n\
             <b>Примеры использования:</b>\n\
             <code>Москва</code> - погода в Москве\n\
             <code>/weather Лондон</code> - погода в Лондоне",
            MenuButton::Weather.label(),
            MenuButton::Subscribe.label(),
            self.broadcast_time.format("%-H:%M"),
            MenuButton::ChangeCity.label(),
            MenuButton::Unsubscribe.label(),
        )
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("photos_dir", &self.photos_dir)
            .field("site_url", &self.site_url)
            .finish_non_exhaustive()
    }
}
