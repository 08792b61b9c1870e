//! Interval data models shared by the repository, the window engine and the UI.

use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const SECOND_MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum IntervalCategory {
    AppActivity,
    Status,
    ManualLog,
}

impl IntervalCategory {
    pub const ALL: [IntervalCategory; 3] = [
        IntervalCategory::AppActivity,
        IntervalCategory::Status,
        IntervalCategory::ManualLog,
    ];

    /// Name stored in the `category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalCategory::AppActivity => "AppTrackItem",
            IntervalCategory::Status => "StatusTrackItem",
            IntervalCategory::ManualLog => "LogTrackItem",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AppTrackItem" => Some(IntervalCategory::AppActivity),
            "StatusTrackItem" => Some(IntervalCategory::Status),
            "LogTrackItem" => Some(IntervalCategory::ManualLog),
            _ => None,
        }
    }
}

/// Label carried by status intervals while the machine is in use.
pub const STATUS_ONLINE: &str = "ONLINE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub id: i64,
    pub category: IntervalCategory,
    pub label: String,
    pub secondary_label: String,
    pub source_url: Option<String>,
    pub domain: Option<String>,
    pub color_override: Option<String>,
    pub begin_ms: i64,
    pub end_ms: i64,
}

impl Interval {
    pub fn duration_ms(&self) -> i64 {
        (self.end_ms - self.begin_ms).max(0)
    }

    pub fn is_well_formed(&self) -> bool {
        self.begin_ms <= self.end_ms
    }
}

/// Input for intervals created from the UI (manual task logs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInterval {
    pub category: IntervalCategory,
    pub label: String,
    pub secondary_label: String,
    pub source_url: Option<String>,
    pub domain: Option<String>,
    pub color_override: Option<String>,
    pub begin_ms: i64,
    pub end_ms: i64,
}

/// Closed millisecond range with a strictly positive duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Both ends must be instants chrono can represent.
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if end <= start {
            bail!("invalid time range: end ({end}) must be after start ({start})");
        }
        if !is_representable(start) || !is_representable(end) {
            bail!("invalid time range: {start}..{end} is outside the representable calendar");
        }
        if end.checked_sub(start).is_none() {
            bail!("invalid time range: {start}..{end} is too wide");
        }
        Ok(Self { start, end })
    }

    /// Range of `duration_ms` whose midpoint is `center`. Durations below one
    /// millisecond are widened to one.
    pub fn centered_on(center: i64, duration_ms: i64) -> Self {
        let duration_ms = duration_ms.max(1);
        let start = center.saturating_sub(duration_ms / 2);
        Self::starting_at(start, duration_ms)
    }

    /// Range of `duration_ms` beginning at `start`, widened to one millisecond
    /// at minimum. Pinned to the top of the `i64` scale when it would overflow.
    pub fn starting_at(start: i64, duration_ms: i64) -> Self {
        let duration_ms = duration_ms.max(1);
        match start.checked_add(duration_ms) {
            Some(end) => Self { start, end },
            None => Self {
                start: i64::MAX - duration_ms,
                end: i64::MAX,
            },
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }

    pub fn midpoint(&self) -> i64 {
        self.start.saturating_add(self.duration() / 2)
    }

    /// Moves both ends by `delta_ms`, stopping at the ends of the `i64` scale
    /// without changing the duration.
    pub fn shifted_by(&self, delta_ms: i64) -> Self {
        let duration = self.duration();
        let start = self
            .start
            .saturating_add(delta_ms)
            .clamp(i64::MIN, i64::MAX - duration);
        Self {
            start,
            end: start + duration,
        }
    }

    pub fn contains_range(&self, other: &TimeRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Whether `[begin, end]` intersects this range with a non-empty overlap.
    pub fn overlaps(&self, begin: i64, end: i64) -> bool {
        end > self.start && begin < self.end
    }

    /// Translates this range until it lies inside `bounds`, keeping its
    /// duration. `None` when `bounds` is narrower than this range.
    pub fn shifted_into(&self, bounds: &TimeRange) -> Option<Self> {
        if self.duration() > bounds.duration() {
            return None;
        }
        if self.start < bounds.start {
            Some(Self::starting_at(bounds.start, self.duration()))
        } else if self.end > bounds.end {
            Some(Self::starting_at(bounds.end - self.duration(), self.duration()))
        } else {
            Some(*self)
        }
    }

    /// Percent offset of `instant` along this range.
    pub fn percent_of(&self, instant: i64) -> f64 {
        (instant as f64 - self.start as f64) / self.duration() as f64 * 100.0
    }
}

fn is_representable(instant_ms: i64) -> bool {
    Utc.timestamp_millis_opt(instant_ms).single().is_some()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub from: i64,
    pub to: i64,
    pub category: Option<IntervalCategory>,
    pub text: Option<String>,
    #[serde(default = "SearchParams::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl SearchParams {
    pub const DEFAULT_LIMIT: i64 = 50;

    fn default_limit() -> i64 {
        Self::DEFAULT_LIMIT
    }

    pub fn new(from: i64, to: i64) -> Self {
        Self {
            from,
            to,
            category: None,
            text: None,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub items: Vec<Interval>,
    pub total: i64,
    pub total_duration: i64,
}
