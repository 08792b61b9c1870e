use chrono::{TimeZone, Timelike};
use serde::Serialize;

use crate::models::{TimeRange, HOUR_MS, MINUTE_MS};

use super::format::format_hour_minute;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RulerTick {
    pub time_ms: i64,
    pub percent: f64,
    pub label: String,
}

/// Spacing between ticks for a visible span.
pub fn tick_step_ms(visible_duration_ms: i64) -> i64 {
    if visible_duration_ms < 4 * HOUR_MS {
        30 * MINUTE_MS
    } else if visible_duration_ms <= 12 * HOUR_MS {
        HOUR_MS
    } else if visible_duration_ms <= 20 * HOUR_MS {
        2 * HOUR_MS
    } else {
        3 * HOUR_MS
    }
}

/// Ticks aligned to whole hours of `tz`, ascending, all within `visible`.
pub fn ruler_ticks_in<Tz: TimeZone>(visible: &TimeRange, tz: &Tz) -> Vec<RulerTick> {
    let step = tick_step_ms(visible.duration());
    let mut ticks = Vec::new();

    let mut current = hour_floor(visible.start(), tz);
    while current <= visible.end() {
        if current >= visible.start() {
            ticks.push(RulerTick {
                time_ms: current,
                percent: visible.percent_of(current),
                label: format_hour_minute(current, tz),
            });
        }
        let Some(next) = current.checked_add(step) else {
            break;
        };
        current = next;
    }

    ticks
}

fn hour_floor<Tz: TimeZone>(instant_ms: i64, tz: &Tz) -> i64 {
    tz.timestamp_millis_opt(instant_ms)
        .earliest()
        .and_then(|moment| moment.with_minute(0))
        .and_then(|moment| moment.with_second(0))
        .and_then(|moment| moment.with_nanosecond(0))
        .map(|moment| moment.timestamp_millis())
        .unwrap_or_else(|| instant_ms - instant_ms.rem_euclid(HOUR_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn step_thresholds() {
        assert_eq!(tick_step_ms(4 * HOUR_MS - 1), 30 * MINUTE_MS);
        assert_eq!(tick_step_ms(4 * HOUR_MS), HOUR_MS);
        assert_eq!(tick_step_ms(12 * HOUR_MS), HOUR_MS);
        assert_eq!(tick_step_ms(12 * HOUR_MS + 1), 2 * HOUR_MS);
        assert_eq!(tick_step_ms(20 * HOUR_MS), 2 * HOUR_MS);
        assert_eq!(tick_step_ms(20 * HOUR_MS + 1), 3 * HOUR_MS);
    }

    #[test]
    fn half_hour_ticks_for_short_views() {
        let visible = TimeRange::new(10 * HOUR_MS + 40 * MINUTE_MS, 13 * HOUR_MS + 20 * MINUTE_MS)
            .unwrap();
        let ticks = ruler_ticks_in(&visible, &Utc);
        let labels: Vec<_> = ticks.iter().map(|t| t.label.as_str()).collect();

        assert_eq!(labels, ["11:00", "11:30", "12:00", "12:30", "13:00"]);
        assert!(ticks.windows(2).all(|pair| pair[0].time_ms < pair[1].time_ms));
        assert!(ticks
            .iter()
            .all(|t| t.time_ms >= visible.start() && t.time_ms <= visible.end()));
    }

    #[test]
    fn includes_ticks_on_both_edges() {
        let visible = TimeRange::new(8 * HOUR_MS, 12 * HOUR_MS).unwrap();
        let ticks = ruler_ticks_in(&visible, &Utc);

        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[0].percent, 0.0);
        assert_eq!(ticks[2].percent, 50.0);
        assert_eq!(ticks[4].percent, 100.0);
    }

    #[test]
    fn floors_to_the_hour_of_the_zone() {
        // UTC+05:30 puts whole local hours at :30 UTC.
        let zone = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let visible = TimeRange::new(HOUR_MS, 3 * HOUR_MS).unwrap();
        let ticks = ruler_ticks_in(&visible, &zone);

        assert_eq!(ticks[0].time_ms, HOUR_MS);
        assert_eq!(ticks[0].label, "06:30");
        assert_eq!(ticks[1].label, "07:00");
    }
}
