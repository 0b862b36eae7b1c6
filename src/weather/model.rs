use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions in a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city_name: String,
    /// Provider's condition group, e.g. "Rain".
    pub main: String,
    /// Localised free-text description, e.g. "небольшой дождь".
    pub description: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
}

/// One point of the 3-hour forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub main: String,
    pub description: String,
}

/// Forecast for a city, ordered by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city_name: String,
    pub points: Vec<ForecastPoint>,
}
