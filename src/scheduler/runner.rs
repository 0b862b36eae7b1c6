//! Daily broadcast scheduler.
//!
//! The loop wakes every check interval, asks the [`DailyTrigger`] whether the
//! broadcast is due and, if so, sends each subscriber a summary of the next
//! forecast points. One subscriber failing never stops the others.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use super::DailyTrigger;
use crate::commands::Reply;
use crate::storage::{Subscriber, UserStore};
use crate::telegram::{ChatGateway, GatewayError};
use crate::weather::{DailySummary, WeatherError, WeatherProvider};

/// Messages that can be sent to the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerMessage {
    /// Run the broadcast now, regardless of the trigger.
    TriggerBroadcast,
    /// Stop the scheduler.
    Shutdown,
}

/// Outcome of one broadcast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    /// Subscribers that received the summary.
    pub delivered: usize,
    /// Subscribers skipped because of an error.
    pub failed: usize,
}

/// Why one subscriber did not get the morning summary.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Invalid chat id '{0}'")]
    InvalidChatId(String),

    #[error("Forecast for '{city}' failed: {source}")]
    Weather {
        city: String,
        #[source]
        source: WeatherError,
    },

    #[error("Forecast for '{0}' has no points")]
    EmptyForecast(String),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] GatewayError),
}

/// Daily forecast broadcaster.
pub struct BroadcastScheduler {
    store: Arc<dyn UserStore>,
    weather: Arc<dyn WeatherProvider>,
    gateway: Arc<dyn ChatGateway>,
    trigger: DailyTrigger,
    check_interval: Duration,
    forecast_points: usize,
}

impl BroadcastScheduler {
    /// Creates a scheduler firing daily at `broadcast_time` local time.
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        weather: Arc<dyn WeatherProvider>,
        gateway: Arc<dyn ChatGateway>,
        broadcast_time: NaiveTime,
    ) -> Self {
        Self {
            store,
            weather,
            gateway,
            trigger: DailyTrigger::new(broadcast_time, Local::now().naive_local()),
            check_interval: Duration::from_secs(60),
            forecast_points: 8,
        }
    }

    /// Sets how often the trigger is checked.
    #[must_use]
    pub const fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Sets how many forecast points go into the summary.
    #[must_use]
    pub const fn with_forecast_points(mut self, points: usize) -> Self {
        self.forecast_points = points;
        self
    }

    /// Restarts the trigger as if the process had started at `now`.
    #[must_use]
    pub fn starting_at(mut self, now: NaiveDateTime) -> Self {
        self.trigger = DailyTrigger::new(self.trigger.target(), now);
        self
    }

    /// Current trigger state.
    #[must_use]
    pub const fn trigger(&self) -> &DailyTrigger {
        &self.trigger
    }

    /// Runs the scheduler loop until [`SchedulerMessage::Shutdown`] or the channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<SchedulerMessage>) {
        let until_next = self.trigger.time_until_next(Local::now().naive_local());
        info!(
            "Broadcast scheduler started, next run at {} (in {}h {:02}m)",
            self.trigger.next_run(),
            until_next.num_hours(),
            until_next.num_minutes() % 60
        );

        let mut check_timer = interval(self.check_interval);

        loop {
            tokio::select! {
                _ = check_timer.tick() => {
                    self.tick_at(Local::now().naive_local()).await;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(SchedulerMessage::TriggerBroadcast) => {
                            debug!("Received trigger broadcast message");
                            let report = self.broadcast().await;
                            info!(
                                "Manual broadcast finished: {} delivered, {} failed",
                                report.delivered, report.failed
                            );
                        }
                        Some(SchedulerMessage::Shutdown) | None => {
                            info!("Scheduler shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Fires the broadcast if it is due at `now`.
    pub async fn tick_at(&mut self, now: NaiveDateTime) -> Option<BroadcastReport> {
        if !self.trigger.is_due(now) {
            return None;
        }

        if let Some(previous) = self.trigger.last_fired() {
            debug!("Previous daily broadcast ran at {}", previous);
        }
        self.trigger.mark_fired(now);
        let report = self.broadcast().await;
        info!(
            "Daily broadcast finished: {} delivered, {} failed, next run at {}",
            report.delivered,
            report.failed,
            self.trigger.next_run()
        );
        Some(report)
    }

    /// Sends the morning summary to every subscriber.
    pub async fn broadcast(&self) -> BroadcastReport {
        let subscribers = self.store.list_subscribed();
        info!("Sending daily forecast to {} subscriber(s)", subscribers.len());

        let mut report = BroadcastReport::default();
        for subscriber in &subscribers {
            match self.send_summary(subscriber).await {
                Ok(()) => {
                    debug!("Daily forecast sent to {}", subscriber.user_id);
                    report.delivered += 1;
                }
                Err(e) => {
                    error!("Daily forecast for {} failed: {}", subscriber.user_id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn send_summary(&self, subscriber: &Subscriber) -> Result<(), BroadcastError> {
        let chat_id: i64 = subscriber
            .user_id
            .parse()
            .map_err(|_| BroadcastError::InvalidChatId(subscriber.user_id.clone()))?;
        let city = &subscriber.city;

        let forecast = match self.weather.forecast(city, self.forecast_points).await {
            Ok(forecast) => forecast,
            Err(e) if e.is_not_found() => {
                warn!("Provider has no forecast for '{}'", city);
                let notice = format!(
                    "❌ Не удалось получить прогноз для города {city}. Попробуйте позже."
                );
                self.gateway
                    .deliver(chat_id, &Reply::text(notice), None)
                    .await?;
                return Err(BroadcastError::Weather {
                    city: city.clone(),
                    source: e,
                });
            }
            Err(e) => {
                return Err(BroadcastError::Weather {
                    city: city.clone(),
                    source: e,
                });
            }
        };

        let summary = DailySummary::from_forecast(&forecast, &Local)
            .ok_or_else(|| BroadcastError::EmptyForecast(city.clone()))?;

        self.gateway
            .deliver(chat_id, &Reply::text(summary.render()), None)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for BroadcastScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastScheduler")
            .field("trigger", &self.trigger)
            .field("check_interval", &self.check_interval)
            .field("forecast_points", &self.forecast_points)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, UserMap, UserRecord};
    use crate::testing::{RecordingGateway, StubWeather};

    const TEMPS: [f64; 10] = [1.0, 3.0, 5.0, 2.0, 4.0, 6.0, 0.0, 5.0, 40.0, -40.0];

    fn users(entries: &[(&str, &str, bool)]) -> UserMap {
        entries
            .iter()
            .map(|&(id, city, subscribed)| {
                (
                    id.to_owned(),
                    UserRecord {
                        city: Some(city.to_owned()),
                        subscribed,
                    },
                )
            })
            .collect()
    }

    fn scheduler(
        users: UserMap,
        weather: StubWeather,
        gateway: Arc<RecordingGateway>,
    ) -> BroadcastScheduler {
        BroadcastScheduler::new(
            Arc::new(MemoryStore::with_users(users)),
            Arc::new(weather),
            gateway,
            NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
        )
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_summary_uses_first_points() {
        let gateway = Arc::new(RecordingGateway::new());
        let scheduler = scheduler(
            users(&[("100", "Москва", true)]),
            StubWeather::new().with_forecast("Москва", &TEMPS),
            gateway.clone(),
        );

        let report = scheduler.broadcast().await;
        assert_eq!(report, BroadcastReport { delivered: 1, failed: 0 });

        let texts = gateway.texts_to(100);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Средняя температура: 3.3°C"));
        assert!(texts[0].contains("Максимальная: 6°C"));
        assert!(texts[0].contains("Минимальная: 0°C"));
        assert!(texts[0].contains("Осадков не ожидается"));
    }

    #[tokio::test]
    async fn test_broadcast_skips_unsubscribed() {
        let gateway = Arc::new(RecordingGateway::new());
        let scheduler = scheduler(
            users(&[("100", "Москва", false), ("200", "Paris", true)]),
            StubWeather::new()
                .with_forecast("Москва", &TEMPS)
                .with_forecast("Paris", &TEMPS),
            gateway.clone(),
        );

        let report = scheduler.broadcast().await;
        assert_eq!(report.delivered, 1);
        assert!(gateway.texts_to(100).is_empty());
        assert_eq!(gateway.texts_to(200).len(), 1);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_others() {
        let gateway = Arc::new(RecordingGateway::new().blocking(200));
        let scheduler = scheduler(
            users(&[
                ("100", "Atlantis", true),
                ("200", "Paris", true),
                ("300", "Berlin", true),
                ("400", "London", true),
            ]),
            StubWeather::new()
                .with_forecast("Paris", &TEMPS)
                .with_forecast("London", &TEMPS)
                .unreachable("Berlin"),
            gateway.clone(),
        );

        let report = scheduler.broadcast().await;
        assert_eq!(report, BroadcastReport { delivered: 1, failed: 3 });

        assert_eq!(
            gateway.texts_to(100),
            vec!["❌ Не удалось получить прогноз для города Atlantis. Попробуйте позже."]
        );
        assert!(gateway.texts_to(300).is_empty());
        assert_eq!(gateway.texts_to(400).len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_user_id_counts_as_failure() {
        let gateway = Arc::new(RecordingGateway::new());
        let scheduler = scheduler(
            users(&[("not-a-chat", "Paris", true)]),
            StubWeather::new().with_forecast("Paris", &TEMPS),
            gateway.clone(),
        );

        let report = scheduler.broadcast().await;
        assert_eq!(report, BroadcastReport { delivered: 0, failed: 1 });
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_tick_fires_once_at_target() {
        let gateway = Arc::new(RecordingGateway::new());
        let mut scheduler = scheduler(
            users(&[("100", "Paris", true)]),
            StubWeather::new().with_forecast("Paris", &TEMPS),
            gateway.clone(),
        )
        .starting_at(at("2026-03-01 04:00:00"));

        assert_eq!(scheduler.tick_at(at("2026-03-01 04:59:00")).await, None);
        assert_eq!(scheduler.trigger().last_fired(), None);
        assert_eq!(
            scheduler.tick_at(at("2026-03-01 05:00:20")).await,
            Some(BroadcastReport { delivered: 1, failed: 0 })
        );
        assert_eq!(scheduler.tick_at(at("2026-03-01 05:01:20")).await, None);
        assert_eq!(scheduler.trigger().next_run(), at("2026-03-02 05:00:00"));
        assert_eq!(
            scheduler.trigger().last_fired(),
            Some(at("2026-03-01 05:00:20"))
        );
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_run_handles_trigger_and_shutdown() {
        let gateway = Arc::new(RecordingGateway::new());
        let scheduler = scheduler(
            users(&[("100", "Paris", true)]),
            StubWeather::new().with_forecast("Paris", &TEMPS),
            gateway.clone(),
        )
        .with_check_interval(Duration::from_secs(3600));

        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(scheduler.run(rx));

        tx.send(SchedulerMessage::TriggerBroadcast).await.unwrap();
        tx.send(SchedulerMessage::Shutdown).await.unwrap();
        handle.await.unwrap();

        assert_eq!(gateway.texts_to(100).len(), 1);
    }
}
