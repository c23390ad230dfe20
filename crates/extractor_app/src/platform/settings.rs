//! Settings loaded from a RON file.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```ron
//! (
//!     webhook_url: "https://hooks.example.com/webhook/extract",
//!     api_token: Some("..."),
//! )
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use extractor_engine::{ClientSettings, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SETTINGS_FILENAME: &str = "extractor.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Workflow webhook for crawl, search and Reddit jobs.
    pub webhook_url: String,
    /// Workflow webhook for free-form maps requests.
    pub maps_webhook_url: String,
    pub api_base: String,
    pub actor_id: String,
    pub api_token: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub poll_wait_secs: u64,
    pub progress_tick_millis: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:5678/webhook/extract".to_string(),
            maps_webhook_url: "http://localhost:5678/webhook/maps".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            actor_id: "compass~crawler-google-places".to_string(),
            api_token: None,
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            poll_wait_secs: 29,
            progress_tick_millis: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

impl Settings {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            api_base: self.api_base.clone(),
            api_token: self.api_token.clone(),
            poll_wait: Duration::from_secs(self.poll_wait_secs),
            progress_tick: Duration::from_millis(self.progress_tick_millis.max(1)),
        }
    }

    /// Endpoint that starts a crawler run.
    pub fn start_run_url(&self) -> String {
        format!(
            "{}/acts/{}/runs",
            self.api_base.trim_end_matches('/'),
            self.actor_id
        )
    }
}

/// Reads `explicit` if given, otherwise `./extractor.ron` when it exists,
/// otherwise returns the defaults. A missing explicit file is an error.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(SETTINGS_FILENAME), false),
    };

    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {
            engine_debug!("No settings file at {:?}, using defaults", path);
            return Ok(Settings::default());
        }
        Err(source) => return Err(SettingsError::Read { path, source }),
    };

    let settings = ron::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.clone(),
        source,
    })?;
    engine_info!("Loaded settings from {:?}", path);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.ron");
        fs::write(
            &path,
            r#"(webhook_url: "https://hooks.example.com/x", api_token: Some("secret"), poll_wait_secs: 5)"#,
        )
        .unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(
            settings,
            Settings {
                webhook_url: "https://hooks.example.com/x".into(),
                api_token: Some("secret".into()),
                poll_wait_secs: 5,
                ..Settings::default()
            }
        );
        assert_eq!(settings.client_settings().poll_wait, Duration::from_secs(5));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_settings(Some(&dir.path().join("absent.ron"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn malformed_file_reports_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.ron");
        fs::write(&path, "(webhook_url: 42").unwrap();
        let err = load_settings(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn start_url_joins_base_and_actor() {
        let settings = Settings {
            api_base: "https://api.example.com/v2/".into(),
            ..Settings::default()
        };
        assert_eq!(
            settings.start_run_url(),
            "https://api.example.com/v2/acts/compass~crawler-google-places/runs"
        );
    }
}
