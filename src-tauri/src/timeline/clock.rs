use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use chrono::{Duration, Local, LocalResult, NaiveDate, TimeZone};

use crate::models::{TimeRange, DAY_MS};

/// Source of wall-clock "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Local calendar day containing `instant_ms`.
pub fn day_range(instant_ms: i64) -> TimeRange {
    day_range_in(instant_ms, &Local)
}

/// Calendar day containing `instant_ms` in `tz`, from midnight to the last
/// millisecond before the next midnight.
pub fn day_range_in<Tz: TimeZone>(instant_ms: i64, tz: &Tz) -> TimeRange {
    let fallback = || {
        let start = instant_ms - instant_ms.rem_euclid(DAY_MS);
        TimeRange::starting_at(start, DAY_MS - 1)
    };

    let Some(moment) = tz.timestamp_millis_opt(instant_ms).earliest() else {
        return fallback();
    };
    let date = moment.date_naive();
    let start = local_midnight(tz, date);
    let end = date
        .checked_add_signed(Duration::days(1))
        .and_then(|next| local_midnight(tz, next));

    match (start, end) {
        (Some(start), Some(end)) => TimeRange::new(start, end - 1).unwrap_or_else(|_| fallback()),
        _ => fallback(),
    }
}

/// Same time span shifted by whole days, re-anchored on local midnights.
pub fn shift_days(range: &TimeRange, days: i64) -> TimeRange {
    shift_days_in(range, days, &Local)
}

pub fn shift_days_in<Tz: TimeZone>(range: &TimeRange, days: i64, tz: &Tz) -> TimeRange {
    let anchor = range.midpoint().saturating_add(days.saturating_mul(DAY_MS));
    day_range_in(anchor, tz)
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<i64> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(moment) => Some(moment.timestamp_millis()),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp_millis()),
        // Midnight skipped by a DST jump: the day starts an hour later.
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|moment| moment.timestamp_millis()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HOUR_MS;
    use chrono::Utc;

    #[test]
    fn day_range_covers_the_calendar_day() {
        let range = day_range_in(3 * DAY_MS + 15 * HOUR_MS, &Utc);
        assert_eq!(range.start(), 3 * DAY_MS);
        assert_eq!(range.end(), 4 * DAY_MS - 1);
    }

    #[test]
    fn shifting_days_moves_whole_days() {
        let today = day_range_in(3 * DAY_MS + HOUR_MS, &Utc);
        let yesterday = shift_days_in(&today, -1, &Utc);
        let tomorrow = shift_days_in(&today, 1, &Utc);

        assert_eq!(yesterday.start(), 2 * DAY_MS);
        assert_eq!(tomorrow.start(), 4 * DAY_MS);
        assert_eq!(tomorrow.end(), 5 * DAY_MS - 1);
    }

    #[test]
    fn manual_clock_moves_on_demand() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now_ms(), 10);
        clock.set(100);
        assert_eq!(clock.now_ms(), 100);
    }
}
