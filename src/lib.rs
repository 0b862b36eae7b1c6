//! Weather Forecast Bot Library
//!
//! A Telegram bot answering weather questions and sending a daily forecast.
//!
//! This crate provides the core functionality for:
//! - Persisting user subscriptions in a JSON file
//! - Querying current conditions and forecasts from OpenWeather
//! - Routing chat messages, buttons and multi-step city prompts
//! - Broadcasting a morning forecast summary to subscribers

pub mod commands;
pub mod config;
pub mod scheduler;
pub mod storage;
pub mod telegram;
pub mod weather;

#[cfg(test)]
mod testing;
