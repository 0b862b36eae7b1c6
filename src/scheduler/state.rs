//! Daily trigger bookkeeping.

use chrono::{Days, NaiveDateTime, NaiveTime, TimeDelta};

/// Decides when the daily broadcast is due.
///
/// Times are local wall-clock times. Occurrences missed while the process was
/// suspended collapse into a single late run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTrigger {
    target: NaiveTime,
    next_run: NaiveDateTime,
    last_fired: Option<NaiveDateTime>,
}

impl DailyTrigger {
    /// Creates a trigger whose first run is the next `target` strictly after `now`.
    #[must_use]
    pub fn new(target: NaiveTime, now: NaiveDateTime) -> Self {
        Self {
            target,
            next_run: next_occurrence(target, now),
            last_fired: None,
        }
    }

    /// Configured time of day.
    #[must_use]
    pub const fn target(&self) -> NaiveTime {
        self.target
    }

    /// When the broadcast will fire next.
    #[must_use]
    pub const fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    /// When the broadcast last fired, if it has.
    #[must_use]
    pub const fn last_fired(&self) -> Option<NaiveDateTime> {
        self.last_fired
    }

    /// Whether the next run has been reached.
    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_run
    }

    /// Records a run at `now` and schedules the following one.
    pub fn mark_fired(&mut self, now: NaiveDateTime) {
        self.last_fired = Some(now);
        self.next_run = next_occurrence(self.target, now);
    }

    /// Time left until the next run, zero if already due.
    #[must_use]
    pub fn time_until_next(&self, now: NaiveDateTime) -> TimeDelta {
        (self.next_run - now).max(TimeDelta::zero())
    }
}

fn next_occurrence(target: NaiveTime, after: NaiveDateTime) -> NaiveDateTime {
    let today = after.date().and_time(target);
    if today > after {
        return today;
    }
    after
        .date()
        .checked_add_days(Days::new(1))
        .map_or(today, |tomorrow| tomorrow.and_time(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn five() -> NaiveTime {
        NaiveTime::from_hms_opt(5, 0, 0).unwrap()
    }

    #[test]
    fn test_first_run_same_day() {
        let trigger = DailyTrigger::new(five(), at("2026-03-01 04:10:00"));
        assert_eq!(trigger.next_run(), at("2026-03-01 05:00:00"));
        assert_eq!(trigger.last_fired(), None);
    }

    #[test]
    fn test_started_after_target_waits_for_tomorrow() {
        let trigger = DailyTrigger::new(five(), at("2026-03-01 09:00:00"));
        assert_eq!(trigger.next_run(), at("2026-03-02 05:00:00"));
        assert!(!trigger.is_due(at("2026-03-01 23:59:59")));
    }

    #[test]
    fn test_started_exactly_at_target() {
        let trigger = DailyTrigger::new(five(), at("2026-03-01 05:00:00"));
        assert_eq!(trigger.next_run(), at("2026-03-02 05:00:00"));
    }

    #[test]
    fn test_fires_once_per_day() {
        let mut trigger = DailyTrigger::new(five(), at("2026-03-01 04:59:00"));

        assert!(!trigger.is_due(at("2026-03-01 04:59:59")));
        assert!(trigger.is_due(at("2026-03-01 05:00:30")));

        trigger.mark_fired(at("2026-03-01 05:00:30"));
        assert!(!trigger.is_due(at("2026-03-01 05:01:30")));
        assert_eq!(trigger.next_run(), at("2026-03-02 05:00:00"));
        assert_eq!(trigger.last_fired(), Some(at("2026-03-01 05:00:30")));
    }

    #[test]
    fn test_missed_days_fire_once() {
        let mut trigger = DailyTrigger::new(five(), at("2026-03-01 04:00:00"));

        // woke up three days late
        let late = at("2026-03-04 11:00:00");
        assert!(trigger.is_due(late));
        trigger.mark_fired(late);
        assert_eq!(trigger.next_run(), at("2026-03-05 05:00:00"));
    }

    #[test]
    fn test_month_rollover() {
        let trigger = DailyTrigger::new(five(), at("2026-02-28 06:00:00"));
        assert_eq!(trigger.next_run(), at("2026-03-01 05:00:00"));
    }

    #[test]
    fn test_time_until_next() {
        let trigger = DailyTrigger::new(five(), at("2026-03-01 04:30:00"));
        assert_eq!(
            trigger.time_until_next(at("2026-03-01 04:30:00")),
            TimeDelta::minutes(30)
        );
        assert_eq!(
            trigger.time_until_next(at("2026-03-01 06:00:00")),
            TimeDelta::zero()
        );
    }
}
