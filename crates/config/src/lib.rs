use config_rs::{Config as ConfigBuilder, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every environment variable this tool reads
pub const ENV_PREFIX: &str = "ARIZE";

pub const DEFAULT_PROJECT_NAME: &str = "claude-code";
pub const DEFAULT_OTLP_ENDPOINT: &str = "https://otlp.arize.com:443";
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while assembling the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or both credentials are unset or empty
    #[error("ARIZE_API_KEY and ARIZE_SPACE_ID required")]
    MissingCredentials,

    /// The export would time out before it started
    #[error("ARIZE_EXPORT_TIMEOUT_SECS must be greater than 0")]
    ZeroTimeout,

    /// A variable was present but could not be interpreted
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config_rs::ConfigError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for a single forwarding run
///
/// Built once at start-up and handed to the exporter by reference.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Bearer credential (ARIZE_API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// Tenant identifier sent as `space_id` metadata (ARIZE_SPACE_ID)
    #[serde(default)]
    pub space_id: String,

    /// Value of the injected `arize.project.name` attribute (ARIZE_PROJECT_NAME)
    #[serde(default = "default_project_name")]
    pub project_name: String,

    /// Collector URL (ARIZE_OTLP_ENDPOINT); `https` enables TLS
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,

    /// Upper bound for the export call in seconds (ARIZE_EXPORT_TIMEOUT_SECS)
    #[serde(default = "default_export_timeout_secs")]
    pub export_timeout_secs: u64,
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

fn default_otlp_endpoint() -> String {
    DEFAULT_OTLP_ENDPOINT.to_string()
}

fn default_export_timeout_secs() -> u64 {
    DEFAULT_EXPORT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            space_id: String::new(),
            project_name: default_project_name(),
            otlp_endpoint: default_otlp_endpoint(),
            export_timeout_secs: default_export_timeout_secs(),
        }
    }
}

// The API key never reaches logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("space_id", &self.space_id)
            .field("project_name", &self.project_name)
            .field("otlp_endpoint", &self.otlp_endpoint)
            .field("export_timeout_secs", &self.export_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Layering:
    /// 1. Default values
    /// 2. `ARIZE_*` environment variables
    ///
    /// Credentials are not checked here; call [`Config::validate`] before
    /// exporting.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment. Keys use the same `ARIZE_*` names.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let config = ConfigBuilder::builder()
            .set_default("project_name", DEFAULT_PROJECT_NAME)?
            .set_default("otlp_endpoint", DEFAULT_OTLP_ENDPOINT)?
            .set_default("export_timeout_secs", DEFAULT_EXPORT_TIMEOUT_SECS)?
            .add_source(Environment::with_prefix(ENV_PREFIX).source(vars))
            .build()?;

        let mut app_config: Config = config.try_deserialize()?;

        // An empty optional value falls back to its default
        if app_config.project_name.is_empty() {
            app_config.project_name = default_project_name();
        }
        if app_config.otlp_endpoint.is_empty() {
            app_config.otlp_endpoint = default_otlp_endpoint();
        }

        Ok(app_config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() || self.space_id.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        if self.export_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }
}
