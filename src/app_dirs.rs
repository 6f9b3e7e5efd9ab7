use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "proctor";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("proctor_config.json"))
    }

    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("proctor.log"))
            .unwrap_or_else(|| PathBuf::from("proctor.log"))
    }

    pub fn results_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("results.csv"))
            .unwrap_or_else(|| PathBuf::from("proctor_results.csv"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_have_expected_file_names() {
        assert!(AppDirs::config_path().ends_with("config.json"));
        assert!(AppDirs::log_path().ends_with("proctor.log"));
        assert!(AppDirs::results_path()
            .file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with("results.csv")));
    }
}
