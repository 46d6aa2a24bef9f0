//! Client configuration.
//!
//! # Resolution Algorithm
//!
//! The configuration file is found with the following search:
//!
//! 1. `HELPDESK_CONFIG` environment variable
//! 2. `helpdesk.toml` in the current directory
//! 3. `helpdesk.toml` in parent directories (walk up to filesystem root)
//! 4. XDG config directory (`~/.config/helpdesk/config.toml`)
//!
//! A missing file is not an error; [`HelpdeskConfig::default`] applies.
//!
//! ```toml
//! endpoint = "https://helpdesk.example.com"
//! poll_interval_secs = 120
//! request_timeout_secs = 30
//!
//! [workflow]
//! agent_may_cancel = false
//! comment_order = "newest_first"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{comments::CommentOrder, workflow::WorkflowPolicy};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HELPDESK_CONFIG";
/// File name searched for in the working directory and its parents.
pub const PROJECT_FILE: &str = "helpdesk.toml";

const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while locating or loading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error when reading a config file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error when a config file is malformed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Workflow switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Lets agents cancel tickets.
    pub agent_may_cancel: bool,
    /// Display order of ticket comments.
    pub comment_order: CommentOrder,
}

/// Contents of `helpdesk.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpdeskConfig {
    /// Backend base URL; `/api` is appended to it.
    pub endpoint: String,
    /// Background refresh period of an open ticket.
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub workflow: WorkflowSettings,
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            workflow: WorkflowSettings::default(),
        }
    }
}

impl HelpdeskConfig {
    /// Loads and validates the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if the file cannot be read, is not valid
    /// TOML, or holds an unusable value.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Finds and loads the config file starting from the current directory.
    ///
    /// Returns the defaults when no file is found.
    pub fn load_resolved() -> Result<Self, ConfigError> {
        let current = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Self::resolve_from(&current)
    }

    /// Finds and loads the config file starting from `start`.
    pub fn resolve_from(start: &Path) -> Result<Self, ConfigError> {
        match resolve_path(start) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got `{}`",
                self.endpoint
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn policy(&self) -> WorkflowPolicy {
        WorkflowPolicy::new(self.workflow.agent_may_cancel)
    }

    pub const fn comment_order(&self) -> CommentOrder {
        self.workflow.comment_order
    }
}

/// Path of the config file that applies when searching from `start`.
pub fn resolve_path(start: &Path) -> Option<PathBuf> {
    // Step 1: Environment variable override
    if let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from)
        && path.exists()
    {
        return Some(path);
    }

    // Steps 2 and 3: the start directory, then each parent
    if let Some(path) = start
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|candidate| candidate.is_file())
    {
        return Some(path);
    }

    // Step 4: XDG config directory
    xdg_config_path().filter(|path| path.is_file())
}

fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("helpdesk").join("config.toml"))
}
