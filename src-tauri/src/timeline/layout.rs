use serde::Serialize;

use crate::models::{Interval, TimeRange};

use super::format::format_duration;

/// Narrowest width handed to the UI so instant events stay clickable.
pub const MIN_WIDTH_PERCENT: f64 = 0.5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackGeometry {
    pub interval_id: i64,
    pub label: String,
    pub secondary_label: String,
    pub color: String,
    pub left_percent: f64,
    pub width_percent: f64,
    pub duration_label: String,
}

/// Screen geometry for every interval overlapping `visible`, clipped to it.
pub fn layout_track(intervals: &[Interval], visible: &TimeRange) -> Vec<TrackGeometry> {
    intervals
        .iter()
        .filter(|interval| visible.overlaps(interval.begin_ms, interval.end_ms))
        .map(|interval| {
            let start = interval.begin_ms.max(visible.start());
            let end = interval.end_ms.min(visible.end());
            let width = (end - start) as f64 / visible.duration() as f64 * 100.0;

            TrackGeometry {
                interval_id: interval.id,
                label: interval.label.clone(),
                secondary_label: interval.secondary_label.clone(),
                color: resolve_color(interval),
                left_percent: visible.percent_of(start),
                width_percent: width.max(MIN_WIDTH_PERCENT),
                duration_label: format_duration(interval.duration_ms()),
            }
        })
        .collect()
}

pub fn resolve_color(interval: &Interval) -> String {
    match interval.color_override.as_deref() {
        Some(color) if !color.is_empty() => color.to_string(),
        _ => label_color(&interval.label),
    }
}

/// Stable color for a label: the same label maps to the same hue in every
/// session.
pub fn label_color(label: &str) -> String {
    let hash = label.chars().fold(0i32, |hash, ch| {
        (ch as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    let hue = hash.rem_euclid(360);
    format!("hsl({hue}, 65%, 55%)")
}
