//! Weather Forecast Bot - Main Entry Point
//!
//! A Telegram bot that reports current weather by city and sends
//! subscribers a forecast summary every morning.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use weather_forecast_bot::commands::MessageRouter;
use weather_forecast_bot::config::{BotConfig, BotSettings};
use weather_forecast_bot::scheduler::{BroadcastScheduler, SchedulerMessage};
use weather_forecast_bot::storage::{JsonFileStore, UserStore};
use weather_forecast_bot::telegram::{ChatGateway, TelegramGateway, run_dispatcher};
use weather_forecast_bot::weather::{OpenWeatherClient, WeatherProvider};

/// Telegram weather bot with a daily forecast broadcast.
#[derive(Parser, Debug)]
#[command(name = "weather_bot")]
#[command(about = "Telegram bot for current weather and daily forecasts")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Path to the user data JSON file (overrides `USER_DATA_FILE`).
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Send the daily forecast once right after start-up.
    #[arg(long)]
    broadcast_on_start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let config =
        BotConfig::from_env().context("Failed to load bot configuration from environment")?;
    let mut settings =
        BotSettings::from_env_with_defaults().context("Failed to load bot settings")?;

    if let Some(path) = args.data_file {
        settings.user_data_path = path;
    }

    info!("Bot token: {}", config.masked_bot_token());
    info!("Weather API key: {}", config.masked_weather_api_key());
    info!("User data file: {}", settings.user_data_path.display());

    if !settings.photos_dir.is_dir() {
        warn!(
            "Photos directory {} not found, weather replies will have no pictures",
            settings.photos_dir.display()
        );
    }

    // Open user storage
    let store: Arc<dyn UserStore> = Arc::new(JsonFileStore::new(&settings.user_data_path));
    info!("Loaded {} subscriber(s)", store.list_subscribed().len());

    // Create weather clients
    let weather_client = OpenWeatherClient::new(&config.weather_api_key)
        .with_base_url(&settings.weather_api_base)
        .with_language(&settings.language);
    let interactive: Arc<dyn WeatherProvider> = Arc::new(
        weather_client
            .clone()
            .with_timeout(Some(settings.request_timeout())),
    );
    let broadcast: Arc<dyn WeatherProvider> =
        Arc::new(weather_client.with_timeout(settings.broadcast_timeout()));

    // Connect to Telegram
    let gateway = Arc::new(TelegramGateway::new(&config.bot_token));
    match gateway.check_connection().await {
        Ok(username) => info!("Connected to Telegram as @{}", username),
        Err(e) => warn!("Could not verify bot token: {}", e),
    }
    if let Err(e) = gateway.register_commands().await {
        warn!("Failed to register bot commands: {}", e);
    }

    // Create message router and scheduler
    let router = Arc::new(MessageRouter::new(Arc::clone(&store), interactive, &settings));

    let chat_gateway: Arc<dyn ChatGateway> = gateway.clone();
    let scheduler = BroadcastScheduler::new(store, broadcast, chat_gateway, settings.broadcast_time)
        .with_check_interval(settings.check_interval())
        .with_forecast_points(settings.forecast_points);

    info!(
        "Daily forecast at {}, next run at {}",
        settings.broadcast_time.format("%H:%M"),
        scheduler.trigger().next_run()
    );

    // Create scheduler channel
    let (scheduler_tx, scheduler_rx) = mpsc::channel::<SchedulerMessage>(8);

    // Spawn scheduler task
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_rx).await;
    });

    if args.broadcast_on_start {
        let _ = scheduler_tx.send(SchedulerMessage::TriggerBroadcast).await;
    }

    // Run dispatcher until Ctrl+C
    info!("Bot is running. Use Ctrl+C to stop.");
    run_dispatcher(gateway, router).await;

    // Shutdown
    info!("Shutting down...");
    let _ = scheduler_tx.send(SchedulerMessage::Shutdown).await;
    let _ = scheduler_handle.await;

    info!("Bot stopped");
    Ok(())
}

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
