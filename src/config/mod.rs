//! Configuration module for the weather bot.
//!
//! Handles loading of the required secrets (bot token, weather API key)
//! and of the optional operational settings from the environment.

mod settings;

pub use settings::{
    BotConfig, BotSettings, ConfigError, mask_secret, parse_broadcast_time, parse_positive,
};
