use serde::Deserialize;
use tauri::State;

use crate::{
    db::Database,
    models::{Interval, IntervalCategory, NewInterval, SearchParams, SearchResult, TimeRange},
    settings::TimelineSettings,
    timeline::{TimelineController, TimelineView},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> TimelineController<Database> {
    state.timeline.clone()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualLogInput {
    pub label: String,
    #[serde(default)]
    pub secondary_label: String,
    pub color: Option<String>,
    pub begin_ms: i64,
    pub end_ms: i64,
}

#[tauri::command]
pub async fn get_timeline_view(state: State<'_, AppState>) -> Result<TimelineView, String> {
    Ok(controller_from_state(&state).view().await)
}

#[tauri::command]
pub async fn zoom_in(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.zoom_in().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn zoom_out(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.zoom_out().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn reset_zoom(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.reset_zoom().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn pan_left(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.pan_left().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn pan_right(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.pan_right().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn handle_wheel(
    state: State<'_, AppState>,
    delta_primary: f64,
    delta_secondary: f64,
) -> Result<TimelineView, String> {
    if !delta_primary.is_finite() || !delta_secondary.is_finite() {
        return Err("wheel deltas must be finite".into());
    }
    let controller = controller_from_state(&state);
    controller.handle_wheel(delta_primary, delta_secondary).await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn set_live_mode(
    state: State<'_, AppState>,
    enabled: bool,
) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.set_live_mode(enabled).await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn toggle_live_mode(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.toggle_live_mode().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn set_query_range(
    state: State<'_, AppState>,
    from: i64,
    to: i64,
) -> Result<TimelineView, String> {
    let range = TimeRange::new(from, to).map_err(|e| e.to_string())?;
    let controller = controller_from_state(&state);
    controller.set_query_range(range).await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn previous_day(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.previous_day().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn next_day(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.next_day().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn go_to_today(state: State<'_, AppState>) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.go_to_today().await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn select_interval(
    state: State<'_, AppState>,
    interval_id: Option<i64>,
) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    controller.select_interval(interval_id).await;
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn search_intervals(
    state: State<'_, AppState>,
    params: SearchParams,
) -> Result<SearchResult, String> {
    if params.to <= params.from {
        return Err("search range must end after it starts".into());
    }
    Ok(controller_from_state(&state).search(params).await)
}

#[tauri::command]
pub async fn update_interval_color(
    state: State<'_, AppState>,
    label: String,
    color: String,
) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    if !controller.set_label_color(&label, &color).await {
        return Err(format!("failed to update color for '{label}'"));
    }
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn delete_intervals(
    state: State<'_, AppState>,
    interval_ids: Vec<i64>,
) -> Result<TimelineView, String> {
    let controller = controller_from_state(&state);
    if !controller.delete_intervals(&interval_ids).await {
        return Err(format!("failed to delete {} intervals", interval_ids.len()));
    }
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn create_manual_log(
    state: State<'_, AppState>,
    input: ManualLogInput,
) -> Result<Interval, String> {
    if input.label.trim().is_empty() {
        return Err("label is required".into());
    }

    let interval = state
        .db
        .insert_interval(NewInterval {
            category: IntervalCategory::ManualLog,
            label: input.label,
            secondary_label: input.secondary_label,
            source_url: None,
            domain: None,
            color_override: input.color,
            begin_ms: input.begin_ms,
            end_ms: input.end_ms,
        })
        .await
        .map_err(|e| e.to_string())?;

    controller_from_state(&state).refresh().await;
    Ok(interval)
}

#[tauri::command]
pub fn get_timeline_settings(state: State<'_, AppState>) -> Result<TimelineSettings, String> {
    Ok(state.settings.timeline())
}

/// Stored for the next launch; the running sync loop keeps its interval.
#[tauri::command]
pub fn set_timeline_settings(
    state: State<'_, AppState>,
    settings: TimelineSettings,
) -> Result<(), String> {
    state
        .settings
        .update_timeline(settings)
        .map_err(|e| e.to_string())
}
