//! Rendering of weather replies and the morning forecast summary.

use std::fmt::Display;

use chrono::TimeZone;

use super::condition::{ConditionCategory, mentions_rain, mentions_snow};
use super::model::{CurrentConditions, Forecast};

/// Renders the reply to a current-weather lookup.
#[must_use]
pub fn render_current(conditions: &CurrentConditions, category: ConditionCategory) -> String {
    format!(
        "🌍 Погода в городе {}:\n\
         🌡️ Температура: {}°C (ощущается как {}°C)\n\
         💧 Влажность: {}%\n\
         📝 {}",
        conditions.city_name,
        conditions.temperature,
        conditions.feels_like,
        conditions.humidity_pct,
        category.comment(&conditions.description),
    )
}

/// Rounds to one decimal place, halves away from zero.
#[must_use]
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Average, minimum and maximum of a series of temperatures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureStats {
    /// Rounded with [`round_to_tenth`].
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl TemperatureStats {
    /// Returns `None` for an empty series.
    #[must_use]
    pub fn from_temperatures(temperatures: &[f64]) -> Option<Self> {
        if temperatures.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let count = temperatures.len() as f64;
        let sum: f64 = temperatures.iter().sum();
        let min = temperatures.iter().copied().fold(f64::INFINITY, f64::min);
        let max = temperatures.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            average: round_to_tenth(sum / count),
            min,
            max,
        })
    }
}

/// Morning summary of the next forecast points for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub city_name: String,
    pub stats: TemperatureStats,
    /// `HH:MM` local times of points with rain.
    pub rain_times: Vec<String>,
    /// `HH:MM` local times of points with snow.
    pub snow_times: Vec<String>,
}

impl DailySummary {
    /// Builds the summary, formatting times in `tz`. Returns `None` if the forecast is empty.
    #[must_use]
    pub fn from_forecast<Tz>(forecast: &Forecast, tz: &Tz) -> Option<Self>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let temperatures: Vec<f64> = forecast.points.iter().map(|p| p.temperature).collect();
        let stats = TemperatureStats::from_temperatures(&temperatures)?;

        let mut rain_times = Vec::new();
        let mut snow_times = Vec::new();

        for point in &forecast.points {
            let local_time = point.time.with_timezone(tz).format("%H:%M").to_string();

            if mentions_rain(&point.main, &point.description) {
                rain_times.push(local_time.clone());
            }
            if mentions_snow(&point.main, &point.description) {
                snow_times.push(local_time);
            }
        }

        Some(Self {
            city_name: forecast.city_name.clone(),
            stats,
            rain_times,
            snow_times,
        })
    }

    /// Renders the message sent by the daily broadcast.
    #[must_use]
    pub fn render(&self) -> String {
        let mut message = format!(
            "🌅 Доброе утро!\n\
             🌍 Прогноз погоды в городе {} на сегодня:\n\
             \n\
             📊 Общая картина:\n\
             • Средняя температура: {}°C\n\
             • Максимальная: {}°C\n\
             • Минимальная: {}°C\n",
            self.city_name, self.stats.average, self.stats.max, self.stats.min,
        );

        if !self.rain_times.is_empty() {
            message.push_str(&format!(
                "\n🌧️ Ожидается дождь в периоды: {}",
                self.rain_times.join(", ")
            ));
            message.push_str("\n🚨 Не забудь зонтик! ☂️");
        }

        if !self.snow_times.is_empty() {
            message.push_str(&format!(
                "\n❄️ Ожидается снег в периоды: {}",
                self.snow_times.join(", ")
            ));
            message.push_str("\n🧤 Одевайся теплее!");
        }

        if self.rain_times.is_empty() && self.snow_times.is_empty() {
            message.push_str("\n✅ Осадков не ожидается. Хорошего дня! ☀️");
        }

        message
    }
}
