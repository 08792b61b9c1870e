use serde::Serialize;

use crate::models::{TimeRange, HOUR_MS};

/// Visible span at zoom level 1.0.
pub const BASE_VISIBLE_MS: i64 = 2 * HOUR_MS;
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;
pub const ZOOM_STEP: f64 = 0.25;

const PAN_FRACTION: f64 = 0.25;
/// Share of the visible duration panned per 100 units of horizontal wheel delta.
const WHEEL_PAN_FRACTION: f64 = 0.1;

/// Visible duration implied by a zoom level, rounded to the millisecond.
pub fn visible_duration_for(zoom_level: f64) -> i64 {
    (BASE_VISIBLE_MS as f64 / zoom_level).round() as i64
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WheelOutcome {
    Panned,
    ZoomedIn,
    ZoomedOut,
    Ignored,
}

/// Query range, visible range, zoom level and live mode, kept consistent
/// across every transition.
///
/// The window never reads the clock itself; operations that depend on "now"
/// take it as an argument.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    query_range: TimeRange,
    visible_range: TimeRange,
    zoom_level: f64,
    live_mode: bool,
}

impl TimeWindow {
    /// Window opened at `now`: zoom 1.0, live mode on, two hours around now.
    pub fn new(query_range: TimeRange, now: i64) -> Self {
        Self {
            query_range,
            visible_range: TimeRange::centered_on(now, BASE_VISIBLE_MS),
            zoom_level: 1.0,
            live_mode: true,
        }
    }

    pub fn query_range(&self) -> TimeRange {
        self.query_range
    }

    pub fn visible_range(&self) -> TimeRange {
        self.visible_range
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn live_mode(&self) -> bool {
        self.live_mode
    }

    pub fn visible_duration(&self) -> i64 {
        self.visible_range.duration()
    }

    pub fn visible_hours(&self) -> f64 {
        self.visible_duration() as f64 / HOUR_MS as f64
    }

    /// Replaces the query range. The visible range and zoom are left alone;
    /// the caller is responsible for re-fetching.
    pub fn set_query_range(&mut self, range: TimeRange) {
        self.query_range = range;
    }

    pub fn zoom_in(&mut self) -> bool {
        let next = (self.zoom_level + ZOOM_STEP).min(MAX_ZOOM);
        if next == self.zoom_level {
            return false;
        }

        self.zoom_level = next;
        self.visible_range =
            TimeRange::centered_on(self.visible_range.midpoint(), visible_duration_for(next));
        true
    }

    pub fn zoom_out(&mut self) -> bool {
        let next = (self.zoom_level - ZOOM_STEP).max(MIN_ZOOM);
        if next == self.zoom_level {
            return false;
        }

        self.zoom_level = next;
        let centered =
            TimeRange::centered_on(self.visible_range.midpoint(), visible_duration_for(next));
        // A query range narrower than the new duration is the only case where
        // the visible duration gets cut.
        self.visible_range = centered
            .shifted_into(&self.query_range)
            .unwrap_or(self.query_range);
        true
    }

    pub fn reset_zoom(&mut self, now: i64) {
        self.zoom_level = 1.0;
        self.visible_range = TimeRange::centered_on(now, BASE_VISIBLE_MS);
        self.live_mode = true;
    }

    pub fn pan_left(&mut self) -> bool {
        let amount = (self.visible_duration() as f64 * PAN_FRACTION).round() as i64;
        self.pan_by(-amount)
    }

    pub fn pan_right(&mut self) -> bool {
        let amount = (self.visible_duration() as f64 * PAN_FRACTION).round() as i64;
        self.pan_by(amount)
    }

    /// `delta_primary` is the vertical wheel delta, `delta_secondary` the
    /// horizontal one. Horizontal-dominant input pans, everything else is a
    /// single zoom step.
    pub fn handle_wheel(&mut self, delta_primary: f64, delta_secondary: f64) -> WheelOutcome {
        if delta_secondary.abs() > delta_primary.abs() {
            let amount = (delta_secondary / 100.0
                * self.visible_duration() as f64
                * WHEEL_PAN_FRACTION)
                .round() as i64;
            self.pan_by(amount);
            return WheelOutcome::Panned;
        }

        if delta_primary > 0.0 {
            if self.zoom_out() {
                return WheelOutcome::ZoomedOut;
            }
        } else if delta_primary < 0.0 && self.zoom_in() {
            return WheelOutcome::ZoomedIn;
        }
        WheelOutcome::Ignored
    }

    /// Enabling live mode re-centers on `now` regardless of the query range.
    pub fn set_live_mode(&mut self, enabled: bool, now: i64) {
        self.live_mode = enabled;
        if enabled {
            self.center_on(now);
        }
    }

    /// Re-centers on `now` when live mode is on. Used by the sync tick.
    pub fn follow_now(&mut self, now: i64) -> bool {
        if !self.live_mode {
            return false;
        }
        self.center_on(now);
        true
    }

    fn center_on(&mut self, now: i64) {
        self.visible_range = TimeRange::centered_on(now, visible_duration_for(self.zoom_level));
    }

    /// Shifts the visible range, shrinking the shift (never the duration) to
    /// stay inside the query range. Always leaves live mode.
    fn pan_by(&mut self, delta_ms: i64) -> bool {
        self.live_mode = false;

        let Some(fitted) = self
            .visible_range
            .shifted_by(delta_ms)
            .shifted_into(&self.query_range)
        else {
            return false;
        };

        let moved = fitted != self.visible_range;
        self.visible_range = fitted;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DAY_MS, MINUTE_MS};

    fn day() -> TimeRange {
        TimeRange::new(0, DAY_MS).unwrap()
    }

    fn at(hours: i64, minutes: i64) -> i64 {
        hours * HOUR_MS + minutes * MINUTE_MS
    }

    fn manual_window_at_noon() -> TimeWindow {
        let mut window = TimeWindow::new(day(), at(12, 0));
        window.live_mode = false;
        window
    }

    #[test]
    fn opens_on_two_hours_around_now() {
        let window = TimeWindow::new(day(), at(12, 0));
        assert_eq!(window.visible_range().start(), at(11, 0));
        assert_eq!(window.visible_range().end(), at(13, 0));
        assert_eq!(window.zoom_level(), 1.0);
        assert!(window.live_mode());
    }

    #[test]
    fn zoom_out_from_noon_keeps_center() {
        let mut window = manual_window_at_noon();
        assert!(window.zoom_out());

        assert_eq!(window.zoom_level(), 0.75);
        assert_eq!(window.visible_range().start(), at(10, 40));
        assert_eq!(window.visible_range().end(), at(13, 20));
        assert_eq!(window.visible_range().midpoint(), at(12, 0));
        assert!(day().contains_range(&window.visible_range()));
    }

    #[test]
    fn zoom_in_then_out_restores_level_and_duration() {
        let mut window = manual_window_at_noon();
        let before = window.clone();

        assert!(window.zoom_in());
        assert!(window.zoom_out());

        assert_eq!(window.zoom_level(), before.zoom_level());
        assert_eq!(window.visible_duration(), before.visible_duration());
    }

    #[test]
    fn zoom_is_bounded() {
        let mut window = manual_window_at_noon();
        while window.zoom_in() {}
        assert_eq!(window.zoom_level(), MAX_ZOOM);
        assert_eq!(window.visible_duration(), 30 * MINUTE_MS);
        assert!(!window.zoom_in());

        while window.zoom_out() {}
        assert_eq!(window.zoom_level(), MIN_ZOOM);
        assert_eq!(window.visible_duration(), 8 * HOUR_MS);
        assert!(!window.zoom_out());
    }

    #[test]
    fn visible_duration_tracks_zoom_formula() {
        let mut window = manual_window_at_noon();
        while window.zoom_in() {
            assert_eq!(
                window.visible_duration(),
                visible_duration_for(window.zoom_level())
            );
        }
        while window.zoom_out() {
            assert_eq!(
                window.visible_duration(),
                visible_duration_for(window.zoom_level())
            );
        }
    }

    #[test]
    fn zoom_out_near_midnight_shifts_instead_of_truncating() {
        let mut window = TimeWindow::new(day(), at(0, 30));
        window.set_live_mode(false, at(0, 30));
        let visible = window.visible_range();
        assert!(visible.start() < 0);

        assert!(window.zoom_out());
        assert_eq!(window.visible_range().start(), 0);
        assert_eq!(
            window.visible_duration(),
            visible_duration_for(window.zoom_level())
        );
    }

    #[test]
    fn zoom_out_shrinks_to_a_narrow_query_range() {
        let narrow = TimeRange::new(at(11, 0), at(13, 30)).unwrap();
        let mut window = TimeWindow::new(narrow, at(12, 0));

        assert!(window.zoom_out());
        assert_eq!(window.visible_range(), narrow);
    }

    #[test]
    fn pans_preserve_duration_and_stay_in_query_range() {
        let mut window = manual_window_at_noon();
        let duration = window.visible_duration();

        for _ in 0..200 {
            window.pan_left();
            assert_eq!(window.visible_duration(), duration);
            assert!(day().contains_range(&window.visible_range()));
        }
        assert_eq!(window.visible_range().start(), 0);

        for _ in 0..200 {
            window.pan_right();
            assert_eq!(window.visible_duration(), duration);
            assert!(day().contains_range(&window.visible_range()));
        }
        assert_eq!(window.visible_range().end(), DAY_MS);
    }

    #[test]
    fn pan_moves_a_quarter_of_the_duration() {
        let mut window = manual_window_at_noon();
        assert!(window.pan_right());
        assert_eq!(window.visible_range().start(), at(11, 30));
        assert!(window.pan_left());
        assert!(window.pan_left());
        assert_eq!(window.visible_range().start(), at(10, 30));
    }

    #[test]
    fn pan_leaves_live_mode() {
        let mut window = TimeWindow::new(day(), at(12, 0));
        window.pan_left();
        assert!(!window.live_mode());

        window.set_live_mode(true, at(12, 0));
        window.handle_wheel(0.0, 50.0);
        assert!(!window.live_mode());
    }

    #[test]
    fn pan_pulls_a_live_window_back_into_the_day() {
        let mut window = TimeWindow::new(day(), at(23, 30));
        assert!(window.visible_range().end() > DAY_MS);

        window.pan_left();
        assert_eq!(window.visible_range().end(), DAY_MS);
        assert_eq!(window.visible_duration(), BASE_VISIBLE_MS);
    }

    #[test]
    fn horizontal_wheel_pans_proportionally() {
        let mut window = manual_window_at_noon();
        assert_eq!(window.handle_wheel(10.0, 100.0), WheelOutcome::Panned);
        // 10% of two hours.
        assert_eq!(window.visible_range().start(), at(11, 12));

        assert_eq!(window.handle_wheel(0.0, -200.0), WheelOutcome::Panned);
        assert_eq!(window.visible_range().start(), at(10, 48));
        assert_eq!(window.zoom_level(), 1.0);
    }

    #[test]
    fn wheel_pans_stop_flush_at_the_query_edges() {
        let mut window = manual_window_at_noon();
        window.zoom_out();
        let duration = window.visible_duration();

        for _ in 0..50 {
            assert_eq!(window.handle_wheel(0.0, -10_000.0), WheelOutcome::Panned);
            assert_eq!(window.visible_duration(), duration);
            assert!(day().contains_range(&window.visible_range()));
        }
        assert_eq!(window.visible_range().start(), 0);

        for _ in 0..50 {
            assert_eq!(window.handle_wheel(0.0, 10_000.0), WheelOutcome::Panned);
            assert_eq!(window.visible_duration(), duration);
            assert!(day().contains_range(&window.visible_range()));
        }
        assert_eq!(window.visible_range().end(), DAY_MS);
        assert_eq!(window.zoom_level(), 0.75);
    }

    #[test]
    fn widest_query_range_survives_zoom_and_pan() {
        let widest = TimeRange::new(-8_000_000_000_000_000, 8_000_000_000_000_000).unwrap();
        let mut window = TimeWindow::new(widest, 0);

        while window.zoom_out() {}
        assert_eq!(window.visible_duration(), 8 * HOUR_MS);
        for _ in 0..10 {
            window.handle_wheel(0.0, -1e12);
        }
        assert_eq!(window.visible_range().start(), widest.start());
        assert_eq!(window.visible_duration(), 8 * HOUR_MS);
    }

    #[test]
    fn vertical_wheel_zooms_one_step() {
        let mut window = manual_window_at_noon();
        assert_eq!(window.handle_wheel(240.0, 3.0), WheelOutcome::ZoomedOut);
        assert_eq!(window.zoom_level(), 0.75);

        assert_eq!(window.handle_wheel(-1.0, 0.0), WheelOutcome::ZoomedIn);
        assert_eq!(window.zoom_level(), 1.0);

        assert_eq!(window.handle_wheel(0.0, 0.0), WheelOutcome::Ignored);
    }

    #[test]
    fn reset_zoom_returns_to_live_two_hour_view() {
        let mut window = manual_window_at_noon();
        window.zoom_in();
        window.pan_right();

        window.reset_zoom(at(15, 0));
        assert_eq!(window.zoom_level(), 1.0);
        assert!(window.live_mode());
        assert_eq!(window.visible_range().start(), at(14, 0));
        assert_eq!(window.visible_range().end(), at(16, 0));
    }

    #[test]
    fn live_follow_uses_current_zoom_duration() {
        let mut window = manual_window_at_noon();
        for _ in 0..4 {
            window.zoom_in();
        }
        assert_eq!(window.zoom_level(), 2.0);

        window.set_live_mode(true, at(12, 0));
        assert!(window.follow_now(at(15, 30)));
        assert_eq!(window.visible_range().start(), at(15, 0));
        assert_eq!(window.visible_range().end(), at(16, 0));
    }

    #[test]
    fn follow_now_is_ignored_outside_live_mode() {
        let mut window = manual_window_at_noon();
        let before = window.visible_range();
        assert!(!window.follow_now(at(18, 0)));
        assert_eq!(window.visible_range(), before);
    }

    #[test]
    fn live_mode_may_cross_midnight() {
        let mut window = manual_window_at_noon();
        window.set_live_mode(true, DAY_MS - 10 * MINUTE_MS);
        assert!(window.visible_range().end() > DAY_MS);
    }

    #[test]
    fn query_change_leaves_view_alone() {
        let mut window = manual_window_at_noon();
        let before = window.clone();
        window.set_query_range(TimeRange::new(DAY_MS, 2 * DAY_MS).unwrap());

        assert_eq!(window.visible_range(), before.visible_range());
        assert_eq!(window.zoom_level(), before.zoom_level());
    }
}
