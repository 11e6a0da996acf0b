//! core::config
//!
//! Configuration loading and precedence.
//!
//! # Precedence
//!
//! Values are resolved in this order (earlier wins):
//! 1. CLI flags (applied by the command layer)
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! # Environment
//!
//! - `GIT_WORKSPACE` - workspace root
//! - `GITHUB_TOKEN` - registry bearer credential
//! - `FLY_SCRIPT` - explicit pipeline-definition script
//! - `PIPELINE_HELPERS_LOG_TO_FILE` - `0|false|no|off` disables the log file
//!
//! # Example
//!
//! ```no_run
//! use pipeline_helpers::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Workspace: {}", config.workspace().display());
//! println!("Owner: {}", config.owner());
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::naming::DEFAULT_OWNER;
use crate::core::paths::HelperPaths;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PIPELINE_HELPERS_CONFIG";
/// Environment variable for the workspace root.
pub const WORKSPACE_ENV: &str = "GIT_WORKSPACE";
/// Environment variable for the GitHub token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Environment variable naming the pipeline-definition script.
pub const FLY_SCRIPT_ENV: &str = "FLY_SCRIPT";
/// Environment variable toggling the log file.
pub const LOG_TO_FILE_ENV: &str = "PIPELINE_HELPERS_LOG_TO_FILE";

pub const DEFAULT_PARAMS_REPO: &str = "params";
pub const DEFAULT_PARAMS_BRANCH: &str = "master";
pub const DEFAULT_RELEASE_TARGET: &str = "tkgi-pipeline-upgrade";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Errors from configuration and environment checks.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,

    #[error("could not find {name} directory: {path}")]
    MissingWorkingCopy { name: String, path: PathBuf },

    #[error("{0} environment variable is not set")]
    MissingCredential(&'static str),
}

/// Environment values that take part in precedence.
///
/// Captured once at load so resolution is deterministic and testable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub workspace: Option<PathBuf>,
    pub github_token: Option<String>,
    pub fly_script: Option<PathBuf>,
    pub log_to_file: Option<bool>,
}

impl EnvOverrides {
    /// Capture overrides from the process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture overrides through an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            workspace: non_empty(WORKSPACE_ENV).map(PathBuf::from),
            github_token: non_empty(TOKEN_ENV),
            fly_script: non_empty(FLY_SCRIPT_ENV).map(PathBuf::from),
            log_to_file: non_empty(LOG_TO_FILE_ENV).map(|v| parse_flag(&v)),
        }
    }
}

/// Interpret a boolean-ish environment value. Only explicit negatives disable.
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Merged configuration from the file, the environment and defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed config file (defaults when absent)
    pub file: FileConfig,
    /// Environment overrides
    pub env: EnvOverrides,
    paths: Option<HelperPaths>,
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let paths = HelperPaths::from_home_dir().ok();
        let (file, loaded_from) = Self::load_file(paths.as_ref())?;
        file.validate()?;

        Ok(Self {
            file,
            env: EnvOverrides::from_process(),
            paths,
            loaded_from,
        })
    }

    /// Build a configuration from explicit parts.
    pub fn from_parts(file: FileConfig, env: EnvOverrides, home: Option<PathBuf>) -> Self {
        Self {
            file,
            env,
            paths: home.map(HelperPaths::new),
            loaded_from: None,
        }
    }

    fn load_file(paths: Option<&HelperPaths>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("pipeline-helpers/config.toml");
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
        }

        if let Some(paths) = paths {
            let path = paths.config_path();
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    /// Read and parse a config file.
    pub fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Workspace root holding the working copies.
    ///
    /// Defaults to `~/git`, or `./git` without a home directory.
    pub fn workspace(&self) -> PathBuf {
        self.env
            .workspace
            .clone()
            .or_else(|| self.file.workspace.clone())
            .or_else(|| self.paths.as_ref().map(HelperPaths::default_workspace))
            .unwrap_or_else(|| PathBuf::from("git"))
    }

    /// Default owning organization.
    pub fn owner(&self) -> &str {
        self.file.owner.as_deref().unwrap_or(DEFAULT_OWNER)
    }

    /// Params repository name.
    pub fn params_repo(&self) -> &str {
        self.file
            .params_repo
            .as_deref()
            .unwrap_or(DEFAULT_PARAMS_REPO)
    }

    /// Mainline branch of the params repository.
    pub fn params_branch(&self) -> &str {
        self.file
            .params_branch
            .as_deref()
            .unwrap_or(DEFAULT_PARAMS_BRANCH)
    }

    /// Concourse target for release pipelines.
    pub fn release_target(&self) -> &str {
        self.file
            .release_target
            .as_deref()
            .unwrap_or(DEFAULT_RELEASE_TARGET)
    }

    /// GitHub REST API base URL.
    pub fn github_api_url(&self) -> &str {
        self.file
            .github_api_url
            .as_deref()
            .unwrap_or(DEFAULT_GITHUB_API_URL)
    }

    /// Explicit fly executable, if configured.
    pub fn fly_path(&self) -> Option<&Path> {
        self.file.fly_path.as_deref()
    }

    /// Explicit pipeline-definition script, if set.
    pub fn fly_script(&self) -> Option<&Path> {
        self.env.fly_script.as_deref()
    }

    /// The GitHub token, or an error naming the missing variable.
    pub fn github_token(&self) -> Result<&str, ConfigError> {
        self.env
            .github_token
            .as_deref()
            .ok_or(ConfigError::MissingCredential(TOKEN_ENV))
    }

    /// Whether the daily log file is written. Defaults to `true`.
    pub fn log_to_file(&self) -> bool {
        self.env
            .log_to_file
            .or(self.file.log_to_file)
            .unwrap_or(true)
    }

    /// Directory for the daily log file.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.file
            .log_dir
            .clone()
            .or_else(|| self.paths.as_ref().map(HelperPaths::logs_dir))
    }

    /// Per-user path routing, when a home directory is known.
    pub fn paths(&self) -> Option<&HelperPaths> {
        self.paths.as_ref()
    }

    /// Path of the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_parts(FileConfig::default(), EnvOverrides::default(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> EnvOverrides {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvOverrides::from_lookup(|k| map.get(k).cloned())
    }

    mod defaults {
        use super::*;

        #[test]
        fn built_in_values() {
            let config = Config::from_parts(
                FileConfig::default(),
                EnvOverrides::default(),
                Some(PathBuf::from("/home/op")),
            );
            assert_eq!(config.workspace(), PathBuf::from("/home/op/git"));
            assert_eq!(config.owner(), DEFAULT_OWNER);
            assert_eq!(config.params_repo(), "params");
            assert_eq!(config.params_branch(), "master");
            assert_eq!(config.release_target(), "tkgi-pipeline-upgrade");
            assert_eq!(config.github_api_url(), "https://api.github.com");
            assert!(config.fly_path().is_none());
            assert!(config.log_to_file());
            assert_eq!(
                config.log_dir(),
                Some(PathBuf::from("/home/op/.pipeline-helpers/logs"))
            );
        }

        #[test]
        fn missing_token_names_variable() {
            let err = Config::default().github_token().unwrap_err();
            assert_eq!(err.to_string(), "GITHUB_TOKEN environment variable is not set");
        }
    }

    mod precedence {
        use super::*;

        #[test]
        fn env_overrides_file() {
            let file = FileConfig {
                workspace: Some(PathBuf::from("/from-file")),
                log_to_file: Some(true),
                ..Default::default()
            };
            let config = Config::from_parts(
                file,
                env(&[
                    ("GIT_WORKSPACE", "/from-env"),
                    ("PIPELINE_HELPERS_LOG_TO_FILE", "off"),
                ]),
                None,
            );
            assert_eq!(config.workspace(), PathBuf::from("/from-env"));
            assert!(!config.log_to_file());
        }

        #[test]
        fn file_overrides_default() {
            let file = FileConfig {
                workspace: Some(PathBuf::from("/from-file")),
                owner: Some("acme".into()),
                log_to_file: Some(false),
                ..Default::default()
            };
            let config = Config::from_parts(file, EnvOverrides::default(), None);
            assert_eq!(config.workspace(), PathBuf::from("/from-file"));
            assert_eq!(config.owner(), "acme");
            assert!(!config.log_to_file());
        }

        #[test]
        fn empty_env_values_are_ignored() {
            let config = Config::from_parts(
                FileConfig::default(),
                env(&[("GIT_WORKSPACE", ""), ("GITHUB_TOKEN", " ")]),
                Some(PathBuf::from("/h")),
            );
            assert_eq!(config.workspace(), PathBuf::from("/h/git"));
            assert!(config.github_token().is_err());
        }
    }

    #[test]
    fn parse_flag_only_negatives_disable() {
        for off in ["0", "false", "FALSE", "no", "off", " Off "] {
            assert!(!parse_flag(off), "{off}");
        }
        for on in ["1", "true", "yes", "anything"] {
            assert!(parse_flag(on), "{on}");
        }
    }

    #[test]
    fn read_file_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "owner = [").unwrap();
        assert!(matches!(
            Config::read_file(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn read_file_round_trips_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "params_branch = \"main\"\nfly_path = \"/opt/fly\"\n").unwrap();
        let file = Config::read_file(&path).unwrap();
        let config = Config::from_parts(file, EnvOverrides::default(), None);
        assert_eq!(config.params_branch(), "main");
        assert_eq!(config.fly_path(), Some(Path::new("/opt/fly")));
    }
}
