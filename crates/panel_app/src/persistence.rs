use std::time::Duration;

use panel_engine::{EngineSettings, StorageDir, DEFAULT_SERVER_URL};
use panel_logging::{panel_error, panel_info, panel_warn, LogDestination};
use serde::{Deserialize, Serialize};

const SETTINGS_FILENAME: &str = "panel.ron";

/// Client settings kept next to the instance id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub server_url: String,
    pub log_destination: String,
    pub log_level: String,
    pub connect_timeout_secs: u64,
    pub reply_timeout_secs: u64,
    pub chunk_delay_ms: u64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            log_destination: "file".to_string(),
            log_level: "info".to_string(),
            connect_timeout_secs: engine.connect_timeout.as_secs(),
            reply_timeout_secs: engine.reply_timeout.as_secs(),
            chunk_delay_ms: engine.chunk_delay.as_millis() as u64,
        }
    }
}

impl PanelSettings {
    pub fn log_destination(&self) -> LogDestination {
        LogDestination::parse(&self.log_destination).unwrap_or_default()
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            server_url: self.server_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            reply_timeout: Duration::from_secs(self.reply_timeout_secs.max(1)),
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
            ..EngineSettings::default()
        }
    }
}

/// Reads `panel.ron`; a missing or unreadable file yields the defaults.
///
/// Runs before the logger is up, so problems are returned as notes for the
/// caller to log once it is.
pub(crate) fn load_settings(storage: &StorageDir) -> (PanelSettings, Option<String>) {
    let content = match storage.read_string(SETTINGS_FILENAME) {
        Ok(Some(text)) => text,
        Ok(None) => return (PanelSettings::default(), None),
        Err(err) => {
            return (
                PanelSettings::default(),
                Some(format!("Failed to read settings from {:?}: {}", storage.path(), err)),
            )
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => (settings, None),
        Err(err) => (
            PanelSettings::default(),
            Some(format!("Failed to parse {SETTINGS_FILENAME}: {err}")),
        ),
    }
}

/// Writes the settings file if there is none yet, so users have something to edit.
pub(crate) fn save_default_settings(storage: &StorageDir, settings: &PanelSettings) {
    match storage.read_string(SETTINGS_FILENAME) {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(err) => {
            panel_warn!("Failed to check for {}: {}", SETTINGS_FILENAME, err);
            return;
        }
    }

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(settings, pretty) {
        Ok(text) => text,
        Err(err) => {
            panel_error!("Failed to serialize settings: {}", err);
            return;
        }
    };

    match storage.write_atomic(SETTINGS_FILENAME, &content) {
        Ok(path) => panel_info!("Wrote default settings to {:?}", path),
        Err(err) => panel_error!("Failed to write settings to {:?}: {}", storage.path(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().expect("tempdir");
        let storage = StorageDir::new(dir.path());

        let (settings, note) = load_settings(&storage);

        assert_eq!(settings, PanelSettings::default());
        assert_eq!(settings.server_url, "ws://127.0.0.1:4567/ws");
        assert!(note.is_none());
    }

    #[test]
    fn written_defaults_load_back_and_are_not_overwritten() {
        let dir = tempdir().expect("tempdir");
        let storage = StorageDir::new(dir.path());
        storage.ensure().expect("ensure");

        let mut settings = PanelSettings::default();
        settings.server_url = "ws://panel.local:4567/ws".to_string();
        save_default_settings(&storage, &settings);
        save_default_settings(&storage, &PanelSettings::default());

        let (loaded, note) = load_settings(&storage);
        assert_eq!(loaded.server_url, "ws://panel.local:4567/ws");
        assert!(note.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("tempdir");
        let storage = StorageDir::new(dir.path());
        storage.ensure().expect("ensure");
        storage
            .write_atomic(SETTINGS_FILENAME, "(reply_timeout_secs: 5, log_destination: \"both\")")
            .expect("write");

        let (loaded, _) = load_settings(&storage);

        assert_eq!(loaded.reply_timeout_secs, 5);
        assert_eq!(loaded.log_destination(), LogDestination::Both);
        assert_eq!(loaded.engine_settings().reply_timeout, Duration::from_secs(5));
        assert_eq!(loaded.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn garbage_is_reported_and_ignored() {
        let dir = tempdir().expect("tempdir");
        let storage = StorageDir::new(dir.path());
        storage.ensure().expect("ensure");
        storage.write_atomic(SETTINGS_FILENAME, "not ron at all {").expect("write");

        let (loaded, note) = load_settings(&storage);

        assert_eq!(loaded, PanelSettings::default());
        assert!(note.expect("note").starts_with("Failed to parse panel.ron"));
    }
}
