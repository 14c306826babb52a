//! Connection settings loaded from a TOML file and `CONFIGHUB_*` environment
//! variables.
//!
//! Sources, lowest priority first: compiled defaults, the TOML file,
//! environment variables. A typical file:
//!
//! ```toml
//! server = "demo.confighub.com"
//! account = "ConfigHub"
//! repository = "UnitTest"
//! context = "Development;UnitTest"
//! application_name = "billing"
//!
//! [security_groups]
//! secrets = "hunter2"
//! ```
//!
//! Feed the result to [`ConfigHubBuilder::settings`](crate::ConfigHubBuilder::settings).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use confique::Config;

use crate::error::ConfigHubError;

/// File name looked up by [`Settings::discover`].
pub const SETTINGS_FILE: &str = "confighub.toml";

#[derive(Config, Debug, Clone, PartialEq)]
pub struct Settings {
    /// ConfigHub server, host with optional port, no scheme.
    #[config(default = "api.confighub.com", env = "CONFIGHUB_SERVER")]
    pub server: String,

    /// Use https. Turn off only for local test servers.
    #[config(default = true, env = "CONFIGHUB_SECURE")]
    pub secure: bool,

    /// Repository token. Mutually exclusive with account/repository.
    #[config(env = "CONFIGHUB_TOKEN")]
    pub token: Option<String>,

    /// Repository owner, for token-less access.
    #[config(env = "CONFIGHUB_ACCOUNT")]
    pub account: Option<String>,

    /// Repository name, for token-less access.
    #[config(env = "CONFIGHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Semicolon-delimited context, e.g. "Production;MyApp".
    #[config(env = "CONFIGHUB_CONTEXT")]
    pub context: Option<String>,

    /// Client application name reported to the service.
    #[config(env = "CONFIGHUB_APPLICATION_NAME")]
    pub application_name: Option<String>,

    /// Pull the configuration as of this tag.
    #[config(env = "CONFIGHUB_TAG")]
    pub tag: Option<String>,

    /// Pull the configuration as of this date (UTC, ISO 8601).
    #[config(env = "CONFIGHUB_DATE")]
    pub date: Option<String>,

    /// Ask the service to include key comments.
    #[config(default = false, env = "CONFIGHUB_INCLUDE_COMMENTS")]
    pub include_comments: bool,

    /// Ask the service to include the context of each value.
    #[config(default = false, env = "CONFIGHUB_INCLUDE_VALUE_CONTEXT")]
    pub include_value_context: bool,

    /// Request timeout in seconds.
    #[config(default = 30, env = "CONFIGHUB_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Security group name → password, used for server-side decryption.
    pub security_groups: Option<HashMap<String, String>>,
}

impl Settings {
    /// Load from an explicit TOML file plus environment.
    pub fn load(path: &Path) -> Result<Self, ConfigHubError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigHubError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content, path)
    }

    /// Load from `confighub.toml` in the platform config directory, if it
    /// exists, plus environment.
    pub fn discover() -> Result<Self, ConfigHubError> {
        match default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::builder().env().load()?),
        }
    }

    /// Parse TOML text (plus environment). Mostly useful for embedding and tests.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigHubError> {
        Self::from_toml(content, Path::new("<inline>"))
    }

    fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigHubError> {
        let layer: <Self as Config>::Layer =
            toml::from_str(content).map_err(|e| ConfigHubError::SettingsParse {
                path: origin.to_path_buf(),
                source: e,
            })?;
        Ok(Self::builder().env().preloaded(layer).load()?)
    }
}

/// Platform location of the settings file (e.g. `~/.config/confighub/confighub.toml`).
pub fn default_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "confighub")?;
    Some(dirs.config_dir().join(SETTINGS_FILE))
}
