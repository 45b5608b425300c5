//! Configuration System
//!
//! Handles loading configuration from files and environment variables,
//! the table of named backend environments, and the persisted environment
//! selection (the only state this client keeps between runs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment used when nothing else is configured
pub const DEFAULT_ENVIRONMENT: &str = "local";

/// Base URL of the default environment
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default = "default_environments")]
    pub environments: BTreeMap<String, EnvironmentConfig>,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Key into `environments`
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Explicit base URL, bypasses the environment table
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Simulate payment success when the checkout session cannot be created.
    /// Never enable against a production backend.
    #[serde(default)]
    pub demo_mode: bool,
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            api_url: None,
            request_timeout_secs: default_request_timeout(),
            demo_mode: false,
        }
    }
}

/// A named backend deployment target
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnvironmentConfig {
    pub name: String,
    pub api_url: String,
    #[serde(default)]
    pub icon: String,
}

fn default_environments() -> BTreeMap<String, EnvironmentConfig> {
    let mut envs = BTreeMap::new();
    envs.insert(
        "local".to_string(),
        EnvironmentConfig {
            name: "Local".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            icon: "🏠".to_string(),
        },
    );
    envs.insert(
        "vercel".to_string(),
        EnvironmentConfig {
            name: "Vercel".to_string(),
            api_url: "https://moara.vercel.app".to_string(),
            icon: "☁️".to_string(),
        },
    );
    envs.insert(
        "vercel2".to_string(),
        EnvironmentConfig {
            name: "Vercel 2".to_string(),
            api_url: "https://moaraenergiasolar.vercel.app".to_string(),
            icon: "☁️".to_string(),
        },
    );
    envs
}

/// Notification surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Seconds before a notification is dismissed automatically
    #[serde(default = "default_notification_ttl")]
    pub ttl_secs: u64,
}

fn default_notification_ttl() -> u64 {
    5
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_notification_ttl(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

/// Logical backend endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Root,
    Health,
    Faturas,
    ProcessEmail,
    Checkout,
    Webhook,
    Docs,
}

impl Endpoint {
    /// Path suffix appended to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Root => "/",
            Endpoint::Health => "/health",
            Endpoint::Faturas => "/faturas/",
            Endpoint::ProcessEmail => "/processar_email/",
            Endpoint::Checkout => "/create-checkout-session",
            Endpoint::Webhook => "/stripe-webhook/",
            Endpoint::Docs => "/docs",
        }
    }
}

/// Summary of the active environment
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentInfo {
    pub key: String,
    pub name: String,
    pub api_url: String,
    pub icon: String,
    pub is_production: bool,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// First config file found in the default locations, or defaults
    pub fn load_default_file() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("faturas").join("config.toml")),
            Some(PathBuf::from("/etc/faturas/config.toml")),
            Some(PathBuf::from("./faturas.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config");
        Self::default()
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let mut config = Self::load_default_file();
        config.apply_env_overrides();
        config
    }

    /// Build the effective configuration: file (or defaults), then the saved
    /// environment selection, then environment variables.
    pub fn resolve(
        path: Option<&Path>,
        selection: &EnvironmentSelection,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::load_default_file(),
        };

        match selection.load() {
            Ok(Some(saved)) if config.environments.contains_key(&saved) => {
                config.backend.environment = saved;
            }
            Ok(Some(saved)) => {
                tracing::warn!("Ignoring saved environment '{}': not configured", saved);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read saved environment: {}", e),
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(env) = std::env::var("FATURAS_ENV") {
            self.backend.environment = env;
        }
        if let Ok(url) = std::env::var("FATURAS_API_URL") {
            self.backend.api_url = Some(url);
        }
        if let Ok(demo) = std::env::var("FATURAS_DEMO_MODE") {
            self.backend.demo_mode = matches!(demo.as_str(), "1" | "true" | "yes");
        }

        if let Ok(level) = std::env::var("FATURAS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("FATURAS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Active backend base URL, without trailing slash
    pub fn base_url(&self) -> String {
        let url = match &self.backend.api_url {
            Some(url) => url.as_str(),
            None => self
                .environments
                .get(&self.backend.environment)
                .map(|env| env.api_url.as_str())
                .unwrap_or(DEFAULT_API_URL),
        };
        url.trim_end_matches('/').to_string()
    }

    /// Full URL for a logical endpoint
    pub fn api_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url(), endpoint.path())
    }

    /// Select an environment for this process only
    pub fn use_environment(&mut self, key: &str) -> Result<(), ConfigError> {
        if !self.environments.contains_key(key) {
            return Err(ConfigError::UnknownEnvironment(key.to_string()));
        }
        self.backend.environment = key.to_string();
        self.backend.api_url = None;
        Ok(())
    }

    /// Select an environment and persist the choice
    pub fn switch_environment(
        &mut self,
        key: &str,
        selection: &EnvironmentSelection,
    ) -> Result<(), ConfigError> {
        self.use_environment(key)?;
        selection.save(key)?;
        tracing::info!("Environment switched to {} ({})", key, self.base_url());
        Ok(())
    }

    pub fn environment_info(&self) -> EnvironmentInfo {
        let key = self.backend.environment.clone();
        let env = self.environments.get(&key);

        EnvironmentInfo {
            name: env.map(|e| e.name.clone()).unwrap_or_else(|| key.clone()),
            icon: env.map(|e| e.icon.clone()).unwrap_or_default(),
            api_url: self.base_url(),
            is_production: key != DEFAULT_ENVIRONMENT,
            key,
        }
    }

    /// Configuration problems worth showing to the user
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.backend.api_url.is_none()
            && !self.environments.contains_key(&self.backend.environment)
        {
            issues.push(format!(
                "Environment '{}' is not configured; falling back to {}",
                self.backend.environment, DEFAULT_API_URL
            ));
        }

        if self.base_url().is_empty() {
            issues.push("Backend URL is not configured".to_string());
        }

        if self.backend.demo_mode && self.environment_info().is_production {
            issues.push("Demo mode is enabled against a non-local environment".to_string());
        }

        issues
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            environments: default_environments(),
            notifications: NotificationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Persisted environment choice
#[derive(Debug, Clone)]
pub struct EnvironmentSelection {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedSelection {
    environment: String,
    saved_at: DateTime<Utc>,
}

impl EnvironmentSelection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/faturas/state.toml`
    pub fn default_location() -> Self {
        let path = dirs::data_local_dir()
            .map(|p| p.join("faturas").join("state.toml"))
            .unwrap_or_else(|| PathBuf::from("./.faturas_state.toml"));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved environment key, `None` if nothing was saved yet
    pub fn load(&self) -> Result<Option<String>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        })?;

        let saved: SavedSelection = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            error: e.to_string(),
        })?;

        Ok(Some(saved.environment))
    }

    pub fn save(&self, environment: &str) -> Result<(), ConfigError> {
        let saved = SavedSelection {
            environment: environment.to_string(),
            saved_at: Utc::now(),
        };

        let content =
            toml::to_string(&saved).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }

        std::fs::write(&self.path, content).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Failed to serialize state: {0}")]
    Serialize(String),

    #[error("Unknown environment '{0}'")]
    UnknownEnvironment(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Faturas Configuration
#
# Environment variables override these settings:
# - FATURAS_ENV
# - FATURAS_API_URL
# - FATURAS_DEMO_MODE
# - FATURAS_LOG_LEVEL
# - FATURAS_LOG_FORMAT

[backend]
# Active environment (key of an [environments.*] table below).
# `faturas env use <key>` persists a different choice.
environment = "local"

# Explicit base URL; overrides the environment table when set
# api_url = "http://localhost:8000"

# Request timeout in seconds
request_timeout_secs = 30

# Simulate payment success when no checkout session can be created.
# For demonstrations against a local backend only.
demo_mode = false

[environments.local]
name = "Local"
api_url = "http://localhost:8000"
icon = "🏠"

[environments.vercel]
name = "Vercel"
api_url = "https://moara.vercel.app"
icon = "☁️"

[environments.vercel2]
name = "Vercel 2"
api_url = "https://moaraenergiasolar.vercel.app"
icon = "☁️"

[notifications]
# Seconds before a notification is dismissed
ttl_secs = 5

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/faturas/faturas.log"
"#
    .to_string()
}
