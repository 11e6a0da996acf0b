//! core::paths
//!
//! Per-user locations for configuration and logs.
//!
//! # Storage Layout
//!
//! Everything lives under `~/.pipeline-helpers/`:
//! - `config.toml` - User configuration (canonical location)
//! - `logs/pipeline-helpers-YYYYMMDD.log` - One log file per day
//!
//! # Example
//!
//! ```
//! use pipeline_helpers::core::paths::HelperPaths;
//! use chrono::NaiveDate;
//! use std::path::PathBuf;
//!
//! let paths = HelperPaths::new(PathBuf::from("/home/me"));
//! let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
//! assert_eq!(
//!     paths.log_file_for(&paths.logs_dir(), day),
//!     PathBuf::from("/home/me/.pipeline-helpers/logs/pipeline-helpers-20240309.log")
//! );
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::core::config::ConfigError;

/// Directory name under the home directory.
pub const APP_DIR: &str = ".pipeline-helpers";

/// Prefix of every log file name.
pub const LOG_FILE_PREFIX: &str = "pipeline-helpers";

/// Per-user path routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperPaths {
    home: PathBuf,
}

impl HelperPaths {
    /// Route paths under an explicit home directory.
    pub fn new(home: PathBuf) -> Self {
        Self { home }
    }

    /// Route paths under the current user's home directory.
    pub fn from_home_dir() -> Result<Self, ConfigError> {
        dirs::home_dir().map(Self::new).ok_or(ConfigError::NoHomeDir)
    }

    /// `~/.pipeline-helpers`
    pub fn app_dir(&self) -> PathBuf {
        self.home.join(APP_DIR)
    }

    /// `~/.pipeline-helpers/config.toml`
    pub fn config_path(&self) -> PathBuf {
        self.app_dir().join("config.toml")
    }

    /// `~/.pipeline-helpers/logs`
    pub fn logs_dir(&self) -> PathBuf {
        self.app_dir().join("logs")
    }

    /// Default workspace, `~/git`.
    pub fn default_workspace(&self) -> PathBuf {
        self.home.join("git")
    }

    /// Log file for a given day inside `dir`.
    pub fn log_file_for(&self, dir: &Path, day: NaiveDate) -> PathBuf {
        dir.join(log_file_name(day))
    }
}

/// `pipeline-helpers-YYYYMMDD.log`
pub fn log_file_name(day: NaiveDate) -> String {
    format!("{}-{}.log", LOG_FILE_PREFIX, day.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_home() {
        let paths = HelperPaths::new(PathBuf::from("/h"));
        assert_eq!(paths.app_dir(), PathBuf::from("/h/.pipeline-helpers"));
        assert_eq!(
            paths.config_path(),
            PathBuf::from("/h/.pipeline-helpers/config.toml")
        );
        assert_eq!(paths.logs_dir(), PathBuf::from("/h/.pipeline-helpers/logs"));
        assert_eq!(paths.default_workspace(), PathBuf::from("/h/git"));
    }

    #[test]
    fn log_file_is_daily() {
        let a = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(log_file_name(a), "pipeline-helpers-20250131.log");
        assert_ne!(log_file_name(a), log_file_name(b));
    }
}
