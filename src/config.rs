use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::session::SessionConfig;
use crate::timer::DEFAULT_SECONDS_PER_QUESTION;

/// Persisted defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub seconds_per_question: u64,
    pub report_url: Option<String>,
    pub log_results: bool,
    pub lock_window: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            report_url: None,
            log_results: false,
            lock_window: true,
        }
    }
}

/// Values given on the command line; `None`/`false` defers to the config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub seconds_per_question: Option<u64>,
    pub report_url: Option<String>,
    pub log_results: bool,
    pub no_lock_window: bool,
}

/// Settings in effect for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub session: SessionConfig,
    pub report_url: Option<String>,
    pub log_results: bool,
    pub lock_window: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Config::default().resolve(&Overrides::default())
    }
}

impl Config {
    pub fn resolve(&self, overrides: &Overrides) -> RuntimeSettings {
        let seconds_per_question = overrides
            .seconds_per_question
            .unwrap_or(self.seconds_per_question)
            .max(1);
        let report_url = overrides
            .report_url
            .clone()
            .or_else(|| self.report_url.clone())
            .filter(|url| !url.trim().is_empty());

        RuntimeSettings {
            session: SessionConfig {
                seconds_per_question,
            },
            report_url,
            log_results: overrides.log_results || self.log_results,
            lock_window: self.lock_window && !overrides.no_lock_window,
        }
    }
}

impl From<&RuntimeSettings> for Config {
    fn from(rs: &RuntimeSettings) -> Self {
        Self {
            seconds_per_question: rs.session.seconds_per_question,
            report_url: rs.report_url.clone(),
            log_results: rs.log_results,
            lock_window: rs.lock_window,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
            log::warn!("ignoring unreadable config at {}", self.path.display());
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            seconds_per_question: 90,
            report_url: Some("https://example.com/report".into()),
            log_results: true,
            lock_window: false,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_or_corrupt_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "seconds_per_question": 30 }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.seconds_per_question, 30);
        assert!(cfg.lock_window);
        assert_eq!(cfg.report_url, None);
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = Config {
            seconds_per_question: 90,
            report_url: Some("https://a.example/report".into()),
            log_results: false,
            lock_window: true,
        };
        let overrides = Overrides {
            seconds_per_question: Some(45),
            report_url: Some("https://b.example/report".into()),
            log_results: true,
            no_lock_window: true,
        };

        let rs = cfg.resolve(&overrides);
        assert_eq!(rs.session.seconds_per_question, 45);
        assert_eq!(rs.report_url.as_deref(), Some("https://b.example/report"));
        assert!(rs.log_results);
        assert!(!rs.lock_window);
    }

    #[test]
    fn resolve_clamps_and_filters() {
        let cfg = Config {
            report_url: Some("   ".into()),
            ..Config::default()
        };
        let rs = cfg.resolve(&Overrides {
            seconds_per_question: Some(0),
            ..Overrides::default()
        });

        assert_eq!(rs.session.seconds_per_question, 1);
        assert_eq!(rs.report_url, None);
    }

    #[test]
    fn runtime_settings_roundtrip_into_config() {
        let rs = RuntimeSettings::default();
        assert_eq!(Config::from(&rs), Config::default());
    }
}
