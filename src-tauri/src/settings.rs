use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

/// Overrides `sync_interval_ms` without touching the settings file.
pub const SYNC_INTERVAL_ENV: &str = "TIMLENS_SYNC_INTERVAL_MS";

const MIN_SYNC_INTERVAL_MS: u64 = 250;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineSettings {
    pub sync_interval_ms: u64,
    pub live_on_mount: bool,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            sync_interval_ms: 5_000,
            live_on_mount: true,
        }
    }
}

impl TimelineSettings {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms.max(MIN_SYNC_INTERVAL_MS))
    }

    fn with_env_override(mut self, value: Option<String>) -> Self {
        if let Some(ms) = value.and_then(|raw| raw.trim().parse::<u64>().ok()) {
            self.sync_interval_ms = ms;
        }
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    timeline: TimelineSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Loads `path`, falling back to defaults when the file is missing or
    /// unreadable as JSON.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Stored timeline settings with the environment override applied.
    pub fn timeline(&self) -> TimelineSettings {
        self.stored_timeline()
            .with_env_override(std::env::var(SYNC_INTERVAL_ENV).ok())
    }

    pub fn update_timeline(&self, settings: TimelineSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.timeline = settings;
        self.persist(&guard)
    }

    fn stored_timeline(&self) -> TimelineSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .timeline
            .clone()
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "timlens-settings-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir.join("settings.json")
    }

    #[test]
    fn missing_file_loads_defaults() {
        let store = SettingsStore::new(scratch_path("missing")).unwrap();
        assert_eq!(store.stored_timeline(), TimelineSettings::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let path = scratch_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.stored_timeline(), TimelineSettings::default());
    }

    #[test]
    fn updates_persist_across_reloads() {
        let path = scratch_path("persist");
        let store = SettingsStore::new(path.clone()).unwrap();
        let settings = TimelineSettings {
            sync_interval_ms: 2_000,
            live_on_mount: false,
        };
        store.update_timeline(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.stored_timeline(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = scratch_path("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "timeline": { "liveOnMount": false } }"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        let timeline = store.stored_timeline();
        assert!(!timeline.live_on_mount);
        assert_eq!(timeline.sync_interval_ms, 5_000);
    }

    #[test]
    fn env_override_replaces_interval() {
        let settings = TimelineSettings::default().with_env_override(Some("1500".into()));
        assert_eq!(settings.sync_interval(), Duration::from_millis(1_500));

        let ignored = TimelineSettings::default().with_env_override(Some("soon".into()));
        assert_eq!(ignored.sync_interval_ms, 5_000);
    }

    #[test]
    fn interval_has_a_floor() {
        let settings = TimelineSettings {
            sync_interval_ms: 0,
            live_on_mount: true,
        };
        assert_eq!(settings.sync_interval(), Duration::from_millis(250));
    }
}
