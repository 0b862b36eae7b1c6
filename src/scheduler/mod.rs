//! Daily forecast broadcast scheduling.
//!
//! Sends every subscriber a morning summary once a day at the configured
//! local time.

mod runner;
mod state;

pub use runner::{BroadcastError, BroadcastReport, BroadcastScheduler, SchedulerMessage};
pub use state::DailyTrigger;
