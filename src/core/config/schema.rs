//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Location
//!
//! Searched in order:
//! 1. `$PIPELINE_HELPERS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/pipeline-helpers/config.toml`
//! 3. `~/.pipeline-helpers/config.toml`
//!
//! # Validation
//!
//! Every key is optional. Values are checked after parsing: names must be
//! non-empty and the API URL must be http(s).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// User configuration.
///
/// # Example
///
/// ```toml
/// workspace = "/home/me/git"
/// owner = "Utilities-tkgieng"
/// params_repo = "params"
/// params_branch = "master"
/// release_target = "tkgi-pipeline-upgrade"
/// github_api_url = "https://api.github.com"
/// fly_path = "/usr/local/bin/fly"
/// log_to_file = true
/// log_dir = "/home/me/.pipeline-helpers/logs"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Directory holding the working copies
    pub workspace: Option<PathBuf>,

    /// Default owning organization
    pub owner: Option<String>,

    /// Params repository name
    pub params_repo: Option<String>,

    /// Mainline branch of the params repository
    pub params_branch: Option<String>,

    /// Concourse target that runs release pipelines
    pub release_target: Option<String>,

    /// GitHub REST API base URL
    pub github_api_url: Option<String>,

    /// Explicit path to the fly executable
    pub fly_path: Option<PathBuf>,

    /// Whether to write the daily log file
    pub log_to_file: Option<bool>,

    /// Directory for the daily log file
    pub log_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("owner", &self.owner),
            ("params_repo", &self.params_repo),
            ("params_branch", &self.params_branch),
            ("release_target", &self.release_target),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "{} cannot be empty",
                        key
                    )));
                }
            }
        }

        if let Some(url) = &self.github_api_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "github_api_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }

        Ok(())
    }
}
