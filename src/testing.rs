//! In-process doubles for the weather provider and the chat gateway.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::commands::Reply;
use crate::telegram::{ChatGateway, GatewayError};
use crate::weather::{CurrentConditions, Forecast, ForecastPoint, WeatherError, WeatherProvider};

/// Weather provider answering from fixed tables.
///
/// Unknown cities get a 404 status, cities marked unreachable get a transport error.
#[derive(Debug, Default)]
pub struct StubWeather {
    current: HashMap<String, CurrentConditions>,
    forecasts: HashMap<String, Forecast>,
    unreachable: HashSet<String>,
    calls: AtomicUsize,
}

impl StubWeather {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: &str, main: &str, description: &str) -> Self {
        self.current.insert(
            city.to_owned(),
            CurrentConditions {
                city_name: city.to_owned(),
                main: main.to_owned(),
                description: description.to_owned(),
                temperature: 4.5,
                feels_like: 1.0,
                humidity_pct: 80,
            },
        );
        self
    }

    /// Eight points three hours apart with the given temperatures and a dry sky.
    pub fn with_forecast(mut self, city: &str, temperatures: &[f64]) -> Self {
        let start: DateTime<Utc> = "2026-03-01T03:00:00Z".parse().unwrap();
        let points = temperatures
            .iter()
            .zip(0..)
            .map(|(&temperature, step)| ForecastPoint {
                time: start + Duration::hours(3 * step),
                temperature,
                main: "Clouds".to_owned(),
                description: "облачно".to_owned(),
            })
            .collect();
        self.forecasts.insert(
            city.to_owned(),
            Forecast {
                city_name: city.to_owned(),
                points,
            },
        );
        self
    }

    pub fn unreachable(mut self, city: &str) -> Self {
        self.unreachable.insert(city.to_owned());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, city: &str) -> Result<(), WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.contains(city) {
            return Err(transport_error());
        }
        Ok(())
    }
}

fn not_found() -> WeatherError {
    WeatherError::Status {
        status: 404,
        body: r#"{"cod":"404","message":"city not found"}"#.to_owned(),
    }
}

/// A real `reqwest` error, produced without touching the network.
fn transport_error() -> WeatherError {
    let error = reqwest::Client::new()
        .get("not a url")
        .build()
        .unwrap_err();
    WeatherError::Transport(error)
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn current(&self, city: &str) -> Result<CurrentConditions, WeatherError> {
        self.check(city)?;
        self.current.get(city).cloned().ok_or_else(not_found)
    }

    async fn forecast(&self, city: &str, points: usize) -> Result<Forecast, WeatherError> {
        self.check(city)?;
        let mut forecast = self.forecasts.get(city).cloned().ok_or_else(not_found)?;
        forecast.points.truncate(points);
        Ok(forecast)
    }
}

/// Gateway recording everything it is asked to deliver.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(i64, Reply)>>,
    blocked: HashSet<i64>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to this chat fail as if the user blocked the bot.
    pub fn blocking(mut self, chat_id: i64) -> Self {
        self.blocked.insert(chat_id);
        self
    }

    pub fn sent(&self) -> Vec<(i64, Reply)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(chat, _)| *chat == chat_id)
            .filter_map(|(_, reply)| reply.text_content().map(str::to_owned))
            .collect()
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn deliver(
        &self,
        chat_id: i64,
        reply: &Reply,
        _reply_to: Option<i32>,
    ) -> Result<(), GatewayError> {
        if self.blocked.contains(&chat_id) {
            return Err(GatewayError::Request(teloxide::RequestError::Api(
                teloxide::ApiError::BotBlocked,
            )));
        }
        self.sent.lock().unwrap().push((chat_id, reply.clone()));
        Ok(())
    }
}
