use std::fmt;

use reqwest::Url;
use tracing::trace;

/// Check command given to services created by the bridge.
///
/// Check content arrives through passive results, the command is only a placeholder.
pub const DEFAULT_CHECK_COMMAND: &str = "hostalive";

pub const SAMPLE_CONFIG: &str = r#"{
  "url": "https://icinga2.example.com:5665",
  "username": "user",
  "password": "pass",
  "prefix": "my.specific.prefix.",
  "debug": false
}"#;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Config {
    /// Icinga2 API endpoint, must use https. May come from `ICINGA_URL` instead.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Log the full Icinga2 communication
    #[serde(default)]
    pub debug: bool,

    /// Prepended to every metric name to form the service name
    pub prefix: Option<String>,

    /// Timeout for a single API call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_check_command")]
    pub check_command: String,

    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure_tls: bool,
}

fn default_timeout() -> u64 {
    10
}

fn default_check_command() -> String {
    DEFAULT_CHECK_COMMAND.to_string()
}

/// Errors in the bridge configuration. Fatal at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The endpoint is not a valid URL
    InvalidUrl(String),

    /// The endpoint uses a scheme other than https
    UnsupportedScheme(String),

    /// Username or password is empty
    MissingCredentials,

    /// The HTTP client could not be set up
    Client(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl(msg) => write!(f, "error in parsing host url: {}", msg),
            ConfigError::UnsupportedScheme(scheme) => {
                write!(f, "unknown scheme '{}' in host url, only https is supported", scheme)
            }
            ConfigError::MissingCredentials => write!(f, "API username and password are required"),
            ConfigError::Client(msg) => write!(f, "failed to set up HTTP client: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Parse and validate the endpoint URL.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        if url.scheme() != "https" {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }

        Ok(url)
    }

    /// Check everything needed before any metric is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;

        if self.username.is_empty() || self.password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }

        Ok(())
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or_default()
    }

    /// Override settings from `ICINGA_*` environment variables.
    pub fn apply_env(mut self) -> Self {
        if let Some(url) = crate::util::get_url() {
            self.url = url;
        }
        if let Some(username) = crate::util::get_username() {
            self.username = username;
        }
        if let Some(password) = crate::util::get_password() {
            self.password = password;
        }
        if let Some(debug) = crate::util::get_debug() {
            self.debug = debug;
        }
        self
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config: &Config| trace!("loaded config for {}", config.url))
}
