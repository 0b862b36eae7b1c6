//! Weather provider access, condition classification and message rendering.

mod client;
mod condition;
mod model;
mod report;

pub use client::{OpenWeatherClient, WeatherError, WeatherProvider};
pub use condition::{ConditionCategory, classify, mentions_rain, mentions_snow};
pub use model::{CurrentConditions, Forecast, ForecastPoint};
pub use report::{DailySummary, TemperatureStats, render_current, round_to_tenth};
