//! OpenWeather HTTP client.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::model::{CurrentConditions, Forecast, ForecastPoint};

/// Errors returned by a weather provider.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Failed to reach the weather provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Weather provider answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse weather provider response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Weather provider response contained no data")]
    EmptyPayload,
}

impl WeatherError {
    /// The provider rejected the request, which for a city query means it does not know the city.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// The request never produced an HTTP answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Source of current conditions and forecasts by city name.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city.
    async fn current(&self, city: &str) -> Result<CurrentConditions, WeatherError>;

    /// The first `points` forecast entries for a city.
    async fn forecast(&self, city: &str, points: usize) -> Result<Forecast, WeatherError>;
}

/// Client for the OpenWeather 2.5 API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    language: String,
    timeout: Option<Duration>,
    http: Client,
}

impl OpenWeatherClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openweathermap.org/data/2.5";

    /// Creates a new client for the public `OpenWeatherMap` API with Russian descriptions.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            language: "ru".to_owned(),
            timeout: None,
            http: Client::new(),
        }
    }

    /// Creates a new client pointed at another server. A trailing `/` is dropped.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Creates a new client asking for descriptions in `language`.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Per-request timeout. `None` lets requests run as long as the server allows.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, city: &str) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let mut request = self.http.get(&url).query(&[
            ("q", city),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
            ("lang", self.language.as_str()),
        ]);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;

        debug!("OpenWeather {} for '{}' answered {}", endpoint, city, status);

        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<CurrentConditions, WeatherError> {
        let parsed: OwCurrentResponse = self.get_json("weather", city).await?;
        parsed.into_conditions(city)
    }

    async fn forecast(&self, city: &str, points: usize) -> Result<Forecast, WeatherError> {
        let parsed: OwForecastResponse = self.get_json("forecast", city).await?;
        parsed.into_forecast(points)
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: Option<String>,
    main: OwMain,
    weather: Vec<OwWeather>,
}

impl OwCurrentResponse {
    fn into_conditions(self, requested_city: &str) -> Result<CurrentConditions, WeatherError> {
        let weather = self.weather.into_iter().next().ok_or(WeatherError::EmptyPayload)?;

        let city_name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| title_case(requested_city));

        Ok(CurrentConditions {
            city_name,
            main: weather.main,
            description: weather.description,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity_pct: self.main.humidity,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

impl OwForecastResponse {
    fn into_forecast(self, points: usize) -> Result<Forecast, WeatherError> {
        let points: Vec<ForecastPoint> = self
            .list
            .into_iter()
            .take(points)
            .map(|entry| {
                let (main, description) = entry
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| (w.main, w.description))
                    .unwrap_or_default();

                ForecastPoint {
                    time: unix_to_utc(entry.dt),
                    temperature: entry.main.temp,
                    main,
                    description,
                }
            })
            .collect();

        if points.is_empty() {
            return Err(WeatherError::EmptyPayload);
        }

        Ok(Forecast {
            city_name: self.city.name,
            points,
        })
    }
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

/// Capitalises the first letter of every word.
fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_owned()
    }
}
