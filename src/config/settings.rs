//! Bot secrets and runtime settings.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Secrets required to talk to Telegram and the weather provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot token issued by @BotFather.
    pub bot_token: String,

    /// OpenWeather API key.
    pub weather_api_key: String,
}

impl BotConfig {
    /// Creates a new configuration from explicit secrets.
    #[cfg(test)]
    #[must_use]
    pub const fn new(bot_token: String, weather_api_key: String) -> Self {
        Self {
            bot_token,
            weather_api_key,
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` and `WEATHER_API_KEY` to be set and non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = required_var("BOT_TOKEN")?;
        let weather_api_key = required_var("WEATHER_API_KEY")?;

        Ok(Self {
            bot_token,
            weather_api_key,
        })
    }

    /// Bot token in a form safe for logs.
    #[must_use]
    pub fn masked_bot_token(&self) -> String {
        mask_secret(&self.bot_token)
    }

    /// Weather API key in a form safe for logs.
    #[must_use]
    pub fn masked_weather_api_key(&self) -> String {
        mask_secret(&self.weather_api_key)
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &self.masked_bot_token())
            .field("weather_api_key", &self.masked_weather_api_key())
            .finish()
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(ConfigError::MissingEnvVar(name)),
    }
}

/// Operational settings, all with defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Path to the JSON file holding user subscriptions.
    #[serde(default = "default_user_data_path")]
    pub user_data_path: PathBuf,

    /// Directory with the illustrative weather pictures.
    #[serde(default = "default_photos_dir")]
    pub photos_dir: PathBuf,

    /// Local wall-clock time of the daily broadcast.
    #[serde(default = "default_broadcast_time")]
    pub broadcast_time: NaiveTime,

    /// How often the scheduler checks the clock, in seconds.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Timeout for provider calls made while answering a chat message.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for provider calls made by the daily broadcast. `None` means no timeout.
    #[serde(default)]
    pub broadcast_timeout_secs: Option<u64>,

    /// Language code passed to the weather provider.
    #[serde(default = "default_language")]
    pub language: String,

    /// Base URL of the OpenWeather 2.5 API.
    #[serde(default = "default_api_base")]
    pub weather_api_base: String,

    /// Page opened by the `/site` button.
    #[serde(default = "default_site_url")]
    pub weather_site_url: String,

    /// Number of 3-hour forecast points summarised in the daily message.
    #[serde(default = "default_forecast_points")]
    pub forecast_points: usize,
}

fn default_user_data_path() -> PathBuf {
    PathBuf::from("user_data.json")
}

fn default_photos_dir() -> PathBuf {
    PathBuf::from("Weather_bot_photos")
}

fn default_broadcast_time() -> NaiveTime {
    NaiveTime::from_hms_opt(5, 0, 0).unwrap_or_default()
}

fn default_check_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    10
}

fn default_language() -> String {
    "ru".to_owned()
}

fn default_api_base() -> String {
    "https://api.openweathermap.org/data/2.5".to_owned()
}

fn default_site_url() -> String {
    "https://yandex.ru/pogoda/ru?lon=37.5438&lat=55.4315&ll=37.5427_55.3971&z=12".to_owned()
}

fn default_forecast_points() -> usize {
    8
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            user_data_path: default_user_data_path(),
            photos_dir: default_photos_dir(),
            broadcast_time: default_broadcast_time(),
            check_interval_secs: default_check_interval(),
            request_timeout_secs: default_request_timeout(),
            broadcast_timeout_secs: None,
            language: default_language(),
            weather_api_base: default_api_base(),
            weather_site_url: default_site_url(),
            forecast_points: default_forecast_points(),
        }
    }
}

impl BotSettings {
    /// Creates settings from environment variables, falling back to defaults.
    ///
    /// Unset or empty variables take their default.
    ///
    /// # Errors
    ///
    /// Returns an error if `BROADCAST_TIME` is not `HH:MM` or a numeric
    /// setting is not a positive whole number.
    pub fn from_env_with_defaults() -> Result<Self, ConfigError> {
        let broadcast_time = match env_value("BROADCAST_TIME") {
            Some(raw) => parse_broadcast_time(&raw)?,
            None => default_broadcast_time(),
        };

        let forecast_points = match env_positive("FORECAST_POINTS")? {
            Some(points) => usize::try_from(points).map_err(|_| ConfigError::InvalidNumber {
                name: "FORECAST_POINTS",
                value: points.to_string(),
            })?,
            None => default_forecast_points(),
        };

        Ok(Self {
            user_data_path: env_value("USER_DATA_FILE")
                .map_or_else(default_user_data_path, PathBuf::from),
            photos_dir: env_value("PHOTOS_DIR").map_or_else(default_photos_dir, PathBuf::from),
            broadcast_time,
            check_interval_secs: env_positive("BROADCAST_CHECK_INTERVAL")?
                .unwrap_or_else(default_check_interval),
            request_timeout_secs: env_positive("WEATHER_REQUEST_TIMEOUT")?
                .unwrap_or_else(default_request_timeout),
            broadcast_timeout_secs: env_positive("BROADCAST_REQUEST_TIMEOUT")?,
            language: env_value("WEATHER_LANG").unwrap_or_else(default_language),
            weather_api_base: env_value("WEATHER_API_BASE").unwrap_or_else(default_api_base),
            weather_site_url: env_value("WEATHER_SITE_URL").unwrap_or_else(default_site_url),
            forecast_points,
        })
    }

    /// Scheduler polling interval.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Timeout for interactive provider calls.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Timeout for broadcast provider calls, if any.
    #[must_use]
    pub fn broadcast_timeout(&self) -> Option<Duration> {
        self.broadcast_timeout_secs.map(Duration::from_secs)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_positive(name: &'static str) -> Result<Option<u64>, ConfigError> {
    env_value(name)
        .map(|raw| parse_positive(name, &raw))
        .transpose()
}

/// Parses a whole number greater than zero.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidNumber`] for zero, negatives and non-numbers.
pub fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| ConfigError::InvalidNumber {
            name,
            value: raw.to_owned(),
        })
}

/// Parses an `HH:MM` wall-clock time.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBroadcastTime`] for anything else.
pub fn parse_broadcast_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidBroadcastTime(raw.to_owned()))
}

/// Shows the first characters of a secret followed by `...`.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    const VISIBLE: usize = 10;
    if secret.chars().count() <= VISIBLE {
        "****".to_owned()
    } else {
        format!("{}...", secret.chars().take(VISIBLE).collect::<String>())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid broadcast time '{0}' (expected HH:MM)")]
    InvalidBroadcastTime(String),

    #[error("Invalid value '{value}' for {name} (expected a positive whole number)")]
    InvalidNumber { name: &'static str, value: String },
}
