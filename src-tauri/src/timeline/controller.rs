use std::{sync::Arc, time::Duration};

use chrono::{Local, TimeZone};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    models::{Interval, IntervalCategory, SearchParams, SearchResult, TimeRange, STATUS_ONLINE},
    settings::TimelineSettings,
};

use super::{
    clock::{day_range, shift_days, Clock},
    format::{format_clock, format_duration},
    layout::{layout_track, TrackGeometry},
    repository::{IntervalRepository, IntervalSet, RepositoryClient},
    ruler::{ruler_ticks_in, RulerTick},
    sync::LiveSync,
    window::{TimeWindow, WheelOutcome},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

struct TimelineState {
    window: TimeWindow,
    intervals: IntervalSet,
    selected_id: Option<i64>,
    loading: bool,
    mounted: bool,
    /// Bumped by every user-driven fetch; only the latest one is applied.
    issued_generation: u64,
}

impl TimelineState {
    fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            window: self.window.clone(),
            intervals: self.intervals.clone(),
            selected: self
                .selected_id
                .and_then(|id| self.intervals.find(id))
                .cloned(),
            loading: self.loading,
            mounted: self.mounted,
            generation: self.issued_generation,
        }
    }
}

/// Everything the presentation layer needs to render, published after every
/// transition.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    pub window: TimeWindow,
    pub intervals: IntervalSet,
    pub selected: Option<Interval>,
    pub loading: bool,
    pub mounted: bool,
    pub generation: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSummary {
    pub online_ms: i64,
    pub online_label: String,
    pub app_switches: usize,
    pub tasks_logged: usize,
}

impl TimelineSummary {
    pub fn from_intervals(intervals: &IntervalSet) -> Self {
        let online_ms = intervals
            .status_items
            .iter()
            .filter(|item| item.label == STATUS_ONLINE)
            .map(Interval::duration_ms)
            .sum();

        Self {
            online_ms,
            online_label: format_duration(online_ms),
            app_switches: intervals.app_items.len(),
            tasks_logged: intervals.log_items.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedInterval {
    pub interval: Interval,
    pub begin_label: String,
    pub end_label: String,
    pub duration_label: String,
}

/// Render-ready projection of a snapshot: one geometry list per track, the
/// ruler, and the summary counters.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    pub query_range: TimeRange,
    pub visible_range: TimeRange,
    pub zoom_level: f64,
    pub live_mode: bool,
    pub visible_hours: f64,
    pub day_label: String,
    pub app_track: Vec<TrackGeometry>,
    pub status_track: Vec<TrackGeometry>,
    pub log_track: Vec<TrackGeometry>,
    pub ruler: Vec<RulerTick>,
    pub summary: TimelineSummary,
    pub selected: Option<SelectedInterval>,
    pub loading: bool,
}

impl TimelineView {
    pub fn from_snapshot(snapshot: &TimelineSnapshot) -> Self {
        Self::from_snapshot_in(snapshot, &Local)
    }

    pub fn from_snapshot_in<Tz: TimeZone>(snapshot: &TimelineSnapshot, tz: &Tz) -> Self {
        let window = &snapshot.window;
        let visible = window.visible_range();
        let query = window.query_range();
        let track = |category| layout_track(snapshot.intervals.get(category), &visible);

        let day_label = tz
            .timestamp_millis_opt(query.start())
            .earliest()
            .map(|start| start.date_naive().format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        Self {
            query_range: query,
            visible_range: visible,
            zoom_level: window.zoom_level(),
            live_mode: window.live_mode(),
            visible_hours: window.visible_hours(),
            day_label,
            app_track: track(IntervalCategory::AppActivity),
            status_track: track(IntervalCategory::Status),
            log_track: track(IntervalCategory::ManualLog),
            ruler: ruler_ticks_in(&visible, tz),
            summary: TimelineSummary::from_intervals(&snapshot.intervals),
            selected: snapshot.selected.clone().map(|interval| SelectedInterval {
                begin_label: format_clock(interval.begin_ms, tz),
                end_label: format_clock(interval.end_ms, tz),
                duration_label: format_duration(interval.duration_ms()),
                interval,
            }),
            loading: snapshot.loading,
        }
    }
}

/// Handle on the timeline: the time window, the intervals cached for its
/// query range, and the live sync loop. Clones share the same state.
pub struct TimelineController<R> {
    state: Arc<Mutex<TimelineState>>,
    client: RepositoryClient<R>,
    clock: Arc<dyn Clock>,
    sync: Arc<Mutex<Option<LiveSync>>>,
    sync_interval: Duration,
    live_on_mount: bool,
    updates: Arc<watch::Sender<TimelineSnapshot>>,
}

impl<R> Clone for TimelineController<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            client: self.client.clone(),
            clock: Arc::clone(&self.clock),
            sync: Arc::clone(&self.sync),
            sync_interval: self.sync_interval,
            live_on_mount: self.live_on_mount,
            updates: Arc::clone(&self.updates),
        }
    }
}

impl<R: IntervalRepository> TimelineController<R> {
    /// Opens on today with the window centered on now. Nothing is fetched
    /// until [`mount`](Self::mount).
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, settings: &TimelineSettings) -> Self {
        let state = TimelineState {
            window: opening_window(clock.now_ms(), settings.live_on_mount),
            intervals: IntervalSet::default(),
            selected_id: None,
            loading: false,
            mounted: false,
            issued_generation: 0,
        };
        let (updates, _) = watch::channel(state.snapshot());

        Self {
            state: Arc::new(Mutex::new(state)),
            client: RepositoryClient::new(repo),
            clock,
            sync: Arc::new(Mutex::new(None)),
            sync_interval: settings.sync_interval(),
            live_on_mount: settings.live_on_mount,
            updates: Arc::new(updates),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TimelineSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> TimelineSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn view(&self) -> TimelineView {
        TimelineView::from_snapshot(&self.snapshot().await)
    }

    pub async fn is_syncing(&self) -> bool {
        self.sync
            .lock()
            .await
            .as_ref()
            .is_some_and(LiveSync::is_running)
    }

    /// Opens on today's full day with the default view, then fetches it.
    pub async fn mount(&self) {
        let live_on_mount = self.live_on_mount;
        self.transition(|state, now| {
            state.window = opening_window(now, live_on_mount);
            state.mounted = true;
        })
        .await;
        log_info!("timeline mounted");
        self.refresh().await;
    }

    /// Stops live sync and drops the view: the window returns to defaults and
    /// any fetch still in flight is discarded.
    pub async fn unmount(&self) {
        let live_on_mount = self.live_on_mount;
        self.transition(|state, now| {
            state.window = opening_window(now, live_on_mount);
            state.intervals = IntervalSet::default();
            state.selected_id = None;
            state.loading = false;
            state.issued_generation += 1;
            state.mounted = false;
        })
        .await;
        log_info!("timeline unmounted");
    }

    /// Re-fetches every category for the current query range. A fetch that
    /// finishes after a newer one was issued is discarded.
    pub async fn refresh(&self) {
        let (generation, range) = {
            let mut state = self.state.lock().await;
            state.issued_generation += 1;
            state.loading = true;
            self.publish(&state);
            (state.issued_generation, state.window.query_range())
        };

        let intervals = self.client.fetch_all(range).await;

        let mut state = self.state.lock().await;
        if generation != state.issued_generation {
            log_debug!(
                "discarding fetch #{generation}, #{} is newer",
                state.issued_generation
            );
            return;
        }
        state.intervals = intervals;
        state.loading = false;
        self.publish(&state);
    }

    pub async fn set_query_range(&self, range: TimeRange) {
        self.transition(|state, _| state.window.set_query_range(range))
            .await;
        self.refresh().await;
    }

    pub async fn previous_day(&self) {
        self.shift_query_days(-1).await;
    }

    pub async fn next_day(&self) {
        self.shift_query_days(1).await;
    }

    pub async fn go_to_today(&self) {
        self.transition(|state, now| {
            state.window.set_query_range(day_range(now));
            state.window.reset_zoom(now);
        })
        .await;
        self.refresh().await;
    }

    pub async fn zoom_in(&self) -> bool {
        self.transition(|state, _| state.window.zoom_in()).await
    }

    pub async fn zoom_out(&self) -> bool {
        self.transition(|state, _| state.window.zoom_out()).await
    }

    pub async fn reset_zoom(&self) {
        self.transition(|state, now| state.window.reset_zoom(now))
            .await;
    }

    pub async fn pan_left(&self) -> bool {
        self.transition(|state, _| state.window.pan_left()).await
    }

    pub async fn pan_right(&self) -> bool {
        self.transition(|state, _| state.window.pan_right()).await
    }

    pub async fn handle_wheel(&self, delta_primary: f64, delta_secondary: f64) -> WheelOutcome {
        self.transition(|state, _| state.window.handle_wheel(delta_primary, delta_secondary))
            .await
    }

    pub async fn set_live_mode(&self, enabled: bool) {
        self.transition(|state, now| state.window.set_live_mode(enabled, now))
            .await;
    }

    /// Returns the new live mode.
    pub async fn toggle_live_mode(&self) -> bool {
        self.transition(|state, now| {
            let enabled = !state.window.live_mode();
            state.window.set_live_mode(enabled, now);
            enabled
        })
        .await
    }

    /// Selects a cached interval, or clears the selection with `None`. An id
    /// that is not cached clears it as well.
    pub async fn select_interval(&self, id: Option<i64>) -> Option<Interval> {
        self.transition(|state, _| {
            let found = id.and_then(|id| state.intervals.find(id)).cloned();
            state.selected_id = found.as_ref().map(|interval| interval.id);
            found
        })
        .await
    }

    pub async fn set_label_color(&self, label: &str, color: &str) -> bool {
        let updated = self.client.set_interval_color(label, color).await;
        if updated {
            self.refresh().await;
        }
        updated
    }

    pub async fn delete_intervals(&self, ids: &[i64]) -> bool {
        let deleted = self.client.delete_intervals(ids).await;
        if deleted {
            self.transition(|state, _| {
                if state.selected_id.is_some_and(|id| ids.contains(&id)) {
                    state.selected_id = None;
                }
            })
            .await;
            self.refresh().await;
        }
        deleted
    }

    pub async fn search(&self, params: SearchParams) -> SearchResult {
        self.client.search(params).await
    }

    async fn shift_query_days(&self, days: i64) {
        self.transition(|state, _| {
            let shifted = shift_days(&state.window.query_range(), days);
            state.window.set_query_range(shifted);
        })
        .await;
        self.refresh().await;
    }

    /// Runs one synchronous step under the state lock, publishes the result,
    /// then starts or stops the sync loop to match the new state.
    async fn transition<T>(&self, step: impl FnOnce(&mut TimelineState, i64) -> T) -> T {
        let now = self.clock.now_ms();
        let result = {
            let mut state = self.state.lock().await;
            let result = step(&mut state, now);
            self.publish(&state);
            result
        };
        self.reconcile_sync().await;
        result
    }

    fn publish(&self, state: &TimelineState) {
        self.updates.send_replace(state.snapshot());
    }

    async fn reconcile_sync(&self) {
        // Sync lock first, then state: the tick itself only takes the state lock.
        let mut sync = self.sync.lock().await;
        let should_run = {
            let state = self.state.lock().await;
            state.mounted && state.window.live_mode()
        };

        match (should_run, sync.is_some()) {
            (true, false) => {
                let controller = self.clone();
                *sync = Some(LiveSync::spawn(self.sync_interval, move |token| {
                    let controller = controller.clone();
                    async move { controller.sync_tick(token).await }
                }));
            }
            (false, true) => {
                if let Some(running) = sync.take() {
                    running.stop().await;
                }
            }
            _ => {}
        }
    }

    async fn sync_tick(&self, token: CancellationToken) {
        let (generation, range) = {
            let mut state = self.state.lock().await;
            if state.loading {
                // A user fetch is in flight and will bring fresh data.
                let now = self.clock.now_ms();
                if state.window.follow_now(now) {
                    self.publish(&state);
                }
                return;
            }
            (state.issued_generation, state.window.query_range())
        };

        let intervals = self.client.fetch_all(range).await;

        let mut state = self.state.lock().await;
        if token.is_cancelled() || generation != state.issued_generation {
            log_debug!("discarding live sync result");
            return;
        }
        state.intervals = intervals;
        state.window.follow_now(self.clock.now_ms());
        self.publish(&state);
    }
}

fn opening_window(now: i64, live: bool) -> TimeWindow {
    let mut window = TimeWindow::new(day_range(now), now);
    if !live {
        window.set_live_mode(false, now);
    }
    window
}
