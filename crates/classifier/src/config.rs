//! Environment-aware configuration management

use crate::errors::{ClassifierError, Result};
use crate::session::SessionContext;
use bundlelens_insights::InsightConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Classification service endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the classification service
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Where the session is persisted; platform config dir when unset
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            timeout_seconds: 30,
            session_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    client: ClientConfig,
    insights: InsightConfig,
    logging: LoggingConfig,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
    Testing,
}

impl Environment {
    fn config_file_name(self) -> &'static str {
        match self {
            Environment::Production => "production.toml",
            Environment::Staging => "staging.toml",
            Environment::Testing => "testing.toml",
            Environment::Development => "development.toml",
        }
    }
}

/// Resolved configuration for one process
#[derive(Debug, Clone)]
pub struct ConfigManager {
    client: ClientConfig,
    insights: InsightConfig,
    logging: LoggingConfig,
    environment: Environment,
}

impl ConfigManager {
    /// Load from `config/<environment>.toml` and the process environment
    pub fn new() -> Result<Self> {
        Self::load(None, Path::new("config"), |key| env::var(key).ok())
    }

    /// Load from an explicit file, or from `<config_dir>/<environment>.toml`
    /// when `config_path` is `None`. Missing files fall back to defaults.
    pub fn load(
        config_path: Option<&Path>,
        config_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let environment = Self::detect_environment(&lookup)?;

        let path = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ClassifierError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => config_dir.join(environment.config_file_name()),
        };

        let file = if path.exists() {
            Self::load_config_from_file(&path)?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            ConfigFile::default()
        };

        let mut manager = Self {
            client: file.client,
            insights: file.insights,
            logging: file.logging,
            environment,
        };
        manager.apply_env_overrides(&lookup);
        manager.validate()?;
        Ok(manager)
    }

    pub fn client_config(&self) -> &ClientConfig {
        &self.client
    }

    pub fn insight_config(&self) -> &InsightConfig {
        &self.insights
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Session file location, if one can be determined
    pub fn session_path(&self) -> Option<PathBuf> {
        self.client
            .session_file
            .clone()
            .or_else(SessionContext::default_path)
    }

    fn detect_environment(lookup: &impl Fn(&str) -> Option<String>) -> Result<Environment> {
        let env_str = lookup("BUNDLELENS_ENV")
            .or_else(|| lookup("ENVIRONMENT"))
            .unwrap_or_else(|| "development".to_string());

        match env_str.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" | "stage" => Ok(Environment::Staging),
            "testing" | "test" => Ok(Environment::Testing),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(ClassifierError::Config(format!(
                "Unknown environment: {env_str}"
            ))),
        }
    }

    fn load_config_from_file(path: &Path) -> Result<ConfigFile> {
        let content = fs::read_to_string(path).map_err(|e| {
            ClassifierError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| ClassifierError::Config(format!("Failed to parse config file: {e}")))
    }

    fn apply_env_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("BUNDLELENS_API_URL") {
            let trimmed = value.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                self.client.api_url = trimmed.to_string();
            }
        }

        if let Some(value) = lookup("BUNDLELENS_TIMEOUT") {
            match value.trim().parse::<u64>() {
                Ok(parsed) if parsed > 0 => self.client.timeout_seconds = parsed,
                _ => warn!(value = %value, "ignoring invalid BUNDLELENS_TIMEOUT"),
            }
        }

        if let Some(value) = lookup("BUNDLELENS_SESSION_FILE") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.client.session_file = Some(PathBuf::from(trimmed));
            }
        }

        Self::override_usize(lookup, "BUNDLELENS_PREVIEW_LIMIT", &mut self.insights.preview_limit);
        Self::override_usize(
            lookup,
            "BUNDLELENS_EXPLANATION_TOP_N",
            &mut self.insights.explanation_top_n,
        );
        Self::override_usize(lookup, "BUNDLELENS_GLOBAL_TOP_N", &mut self.insights.global_top_n);

        if let Some(value) = lookup("BUNDLELENS_LOG_LEVEL") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.logging.level = trimmed.to_string();
            }
        }
    }

    fn override_usize(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut usize) {
        if let Some(value) = lookup(key) {
            match value.trim().parse::<usize>() {
                Ok(parsed) if parsed > 0 => *target = parsed,
                _ => warn!(key, value = %value, "ignoring invalid override"),
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.client.api_url.trim().is_empty() {
            return Err(ClassifierError::Config("api_url must not be empty".into()));
        }
        if self.client.timeout_seconds == 0 {
            return Err(ClassifierError::Config("timeout_seconds must be positive".into()));
        }
        self.insights
            .validate()
            .map_err(|e| ClassifierError::Config(e.to_string()))
    }
}
