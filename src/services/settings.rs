use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{AppResult, ConfigError};
use crate::services::controller::DebounceConfig;

/// Persisted controller options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Quiet period in milliseconds (must be >= 0, default 300)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: i64,
    /// Clear results immediately on blank input instead of running the operation
    #[serde(default = "default_true")]
    pub skip_empty_query: bool,
    /// Drop superseded in-flight operations on the executor
    #[serde(default = "default_true")]
    pub abort_superseded: bool,
}

fn default_delay_ms() -> i64 {
    DebounceConfig::DEFAULT_DELAY_MS
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            skip_empty_query: true,
            abort_superseded: true,
        }
    }
}

impl Settings {
    pub fn debounce_config(&self) -> Result<DebounceConfig, ConfigError> {
        Ok(DebounceConfig::from_millis(self.delay_ms, self.skip_empty_query)?
            .with_abort_superseded(self.abort_superseded))
    }

    /// Parse a TOML override profile. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> AppResult<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load_toml(path: &Utf8Path) -> AppResult<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

/// Settings bound to a JSON file on disk
pub struct SettingsManager {
    settings: Settings,
    path: Option<Utf8PathBuf>,
}

impl SettingsManager {
    /// Load from the platform config dir, falling back to defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(path),
            None => Self {
                settings: Settings::default(),
                path: None,
            },
        }
    }

    /// Load from an explicit file. Unreadable or malformed files yield defaults.
    pub fn load_from(path: Utf8PathBuf) -> Self {
        let settings = match fs::read_to_string(&path) {
            Ok(source) => serde_json::from_str(&source).unwrap_or_else(|err| {
                warn!(%path, %err, "ignoring malformed settings");
                Settings::default()
            }),
            Err(_) => {
                debug!(%path, "no settings file, using defaults");
                Settings::default()
            }
        };

        Self {
            settings,
            path: Some(path),
        }
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Apply `f`, validate, then persist. Invalid edits are rolled back.
    pub fn update<F>(&mut self, f: F) -> AppResult<()>
    where
        F: FnOnce(&mut Settings),
    {
        let mut next = self.settings.clone();
        f(&mut next);
        next.debounce_config()?;
        self.settings = next;
        self.save()
    }

    fn save(&self) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let parent = path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        fs::create_dir_all(parent)?;

        let json = serde_json::to_string_pretty(&self.settings)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!(%path, "settings saved");
        Ok(())
    }

    fn settings_path() -> Option<Utf8PathBuf> {
        ProjectDirs::from("dev", "lull", "lull")
            .and_then(|dirs| Utf8PathBuf::try_from(dirs.config_dir().join("settings.json")).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::time::Duration;

    fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().join(name)).unwrap()
    }

    #[test]
    fn defaults_match_controller_defaults() {
        let config = Settings::default().debounce_config().unwrap();
        assert_eq!(config, DebounceConfig::default());
    }

    #[test]
    fn toml_profile_fills_missing_keys() {
        let settings = Settings::from_toml_str("delay_ms = 0\n").unwrap();
        assert_eq!(settings.delay_ms, 0);
        assert!(settings.skip_empty_query);

        let config = settings.debounce_config().unwrap();
        assert_eq!(config.delay, Duration::ZERO);
    }

    #[test]
    fn negative_delay_fails_validation() {
        let settings =
            Settings::from_toml_str("delay_ms = -20\nskip_empty_query = false\n").unwrap();
        assert_eq!(
            settings.debounce_config(),
            Err(ConfigError::NegativeDelay(-20))
        );
    }

    #[test]
    fn bad_toml_is_an_error() {
        let err = Settings::from_toml_str("delay_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, AppError::Toml(_)));
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "nested/settings.json");

        let mut manager = SettingsManager::load_from(path.clone());
        assert_eq!(manager.get(), &Settings::default());

        manager
            .update(|s| {
                s.delay_ms = 120;
                s.skip_empty_query = false;
            })
            .unwrap();

        let reloaded = SettingsManager::load_from(path);
        assert_eq!(reloaded.get().delay_ms, 120);
        assert!(!reloaded.get().skip_empty_query);
    }

    #[test]
    fn invalid_update_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = SettingsManager::load_from(temp_path(&dir, "settings.json"));

        let err = manager.update(|s| s.delay_ms = -1).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::NegativeDelay(-1))));
        assert_eq!(manager.get().delay_ms, DebounceConfig::DEFAULT_DELAY_MS);
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "settings.json");
        fs::write(&path, "{ not json").unwrap();

        let manager = SettingsManager::load_from(path);
        assert_eq!(manager.get(), &Settings::default());
    }
}
