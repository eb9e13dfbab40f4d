use crate::config::{validate_log_level, ConfigError, ConfigSource};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Configuration trait for application configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::invalid_value(
                "environment",
                s,
                "development, testing, or production",
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn is_testing(&self) -> bool {
        matches!(self, Environment::Testing)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::invalid_value("log_format", s, "text, pretty, or json")),
        }
    }
}

/// Application-level settings shared by providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::development()
    }

    /// Create configuration for development
    pub fn development() -> Self {
        Self {
            name: "keystone".to_string(),
            environment: Environment::Development,
            log_level: "debug".to_string(),
            log_format: LogFormat::Pretty,
        }
    }

    /// Create configuration for testing
    pub fn testing() -> Self {
        Self {
            name: "keystone".to_string(),
            environment: Environment::Testing,
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
        }
    }

    /// Create configuration for production
    pub fn production() -> Self {
        Self {
            name: "keystone".to_string(),
            environment: Environment::Production,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Logging settings derived from this configuration
    pub fn logging(&self) -> LoggingConfig {
        let base = match self.environment {
            Environment::Development => LoggingConfig::development(),
            Environment::Testing => LoggingConfig::test(),
            Environment::Production => LoggingConfig::production(),
        };

        LoggingConfig {
            level: self.log_level.clone(),
            json_format: self.log_format == LogFormat::Json,
            pretty_print: self.log_format == LogFormat::Pretty,
            ..base
        }
        .with_service(&self.name, crate::VERSION)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigTrait for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("ENVIRONMENT") {
            Ok(env_str) => env_str.parse()?,
            Err(_) => Environment::Development,
        };

        let mut config = match environment {
            Environment::Development => Self::development(),
            Environment::Testing => Self::testing(),
            Environment::Production => Self::production(),
        };

        if let Ok(name) = env::var("APP_NAME") {
            config.name = name;
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level.to_lowercase();
        }

        if let Ok(log_format) = env::var("LOG_FORMAT") {
            config.log_format = log_format.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::missing_required(
                "name",
                "APP_NAME must not be empty",
            ));
        }

        validate_log_level("log_level", &self.log_level)?;

        if self.environment.is_production() && self.log_format == LogFormat::Pretty {
            return Err(ConfigError::invalid_value(
                "log_format",
                "pretty",
                "text or json in production environment",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();

        sources.insert(
            "environment".to_string(),
            ConfigSource::from_env_or_default("ENVIRONMENT", "development"),
        );
        sources.insert(
            "name".to_string(),
            ConfigSource::from_env_or_default("APP_NAME", "keystone"),
        );
        sources.insert(
            "log_level".to_string(),
            ConfigSource::from_env_or_default("LOG_LEVEL", "based on environment"),
        );
        sources.insert(
            "log_format".to_string(),
            ConfigSource::from_env_or_default("LOG_FORMAT", "based on environment"),
        );

        sources
    }
}
