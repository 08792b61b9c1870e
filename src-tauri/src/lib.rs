pub mod db;
pub mod models;
pub mod settings;
pub mod timeline;
mod utils;

#[cfg(feature = "desktop")]
mod commands;

pub use utils::init_logging;

#[cfg(feature = "desktop")]
pub(crate) struct AppState {
    pub(crate) db: db::Database,
    pub(crate) timeline: timeline::TimelineController<db::Database>,
    pub(crate) settings: settings::SettingsStore,
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;

    use crate::commands::{
        create_manual_log, delete_intervals, get_timeline_settings, get_timeline_view,
        go_to_today, handle_wheel, next_day, pan_left, pan_right, previous_day, reset_zoom,
        search_intervals, select_interval, set_live_mode, set_query_range,
        set_timeline_settings, toggle_live_mode, update_interval_color, zoom_in, zoom_out,
    };
    use tauri::{Emitter, Manager, RunEvent};

    use crate::{
        db::Database,
        settings::SettingsStore,
        timeline::{SystemClock, TimelineController, TimelineView},
    };

    init_logging();
    log::info!("Timlens starting up...");

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let database = Database::new(app_data_dir.join("timlens.sqlite3"))?;
                let settings_store = SettingsStore::new(app_data_dir.join("settings.json"))?;

                let controller = TimelineController::new(
                    Arc::new(database.clone()),
                    Arc::new(SystemClock),
                    &settings_store.timeline(),
                );

                // Every snapshot reaches the webview as a render-ready view.
                let mut updates = controller.subscribe();
                let app_handle = app.handle().clone();
                tauri::async_runtime::spawn(async move {
                    while updates.changed().await.is_ok() {
                        let view = TimelineView::from_snapshot(&updates.borrow_and_update());
                        if let Err(err) = app_handle.emit("timeline-updated", view) {
                            log::warn!("failed to emit timeline-updated: {err}");
                        }
                    }
                });

                tauri::async_runtime::block_on(controller.mount());

                app.manage(AppState {
                    db: database,
                    timeline: controller,
                    settings: settings_store,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_timeline_view,
            zoom_in,
            zoom_out,
            reset_zoom,
            pan_left,
            pan_right,
            handle_wheel,
            set_live_mode,
            toggle_live_mode,
            set_query_range,
            previous_day,
            next_day,
            go_to_today,
            select_interval,
            search_intervals,
            update_interval_color,
            delete_intervals,
            create_manual_log,
            get_timeline_settings,
            set_timeline_settings,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| {
        if let RunEvent::Exit = event {
            let controller = app_handle.state::<AppState>().timeline.clone();
            tauri::async_runtime::block_on(controller.unmount());
        }
    });
}
