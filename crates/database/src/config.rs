use keystone_core::{AppConfigTrait, ConfigError, ConfigSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

const MEMORY: &str = ":memory:";

/// Which SQLite database to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the database file, or `:memory:`
    pub filename: String,
    /// Create the file when it does not exist
    #[serde(default = "default_create")]
    pub create: bool,
}

fn default_create() -> bool {
    true
}

impl DatabaseConfig {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            create: true,
        }
    }

    /// Private in-memory database
    pub fn memory() -> Self {
        Self::new(MEMORY)
    }

    pub fn is_memory(&self) -> bool {
        self.filename == MEMORY
    }

    /// Fail instead of creating a missing file
    pub fn must_exist(mut self) -> Self {
        self.create = false;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::memory()
    }
}

impl AppConfigTrait for DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let filename = env::var("DATABASE_FILENAME").unwrap_or_else(|_| MEMORY.to_string());

        let create = match env::var("DATABASE_CREATE") {
            Ok(value) => value.parse::<bool>().map_err(|_| {
                ConfigError::invalid_value("DATABASE_CREATE", &value, "true or false")
            })?,
            Err(_) => true,
        };

        let config = Self { filename, create };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.filename.trim().is_empty() {
            return Err(ConfigError::missing_required(
                "DATABASE_FILENAME",
                "Database filename must not be empty",
            ));
        }
        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "filename".to_string(),
            ConfigSource::from_env_or_default("DATABASE_FILENAME", MEMORY),
        );
        sources.insert(
            "create".to_string(),
            ConfigSource::from_env_or_default("DATABASE_CREATE", "true"),
        );
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("DATABASE_FILENAME");
        env::remove_var("DATABASE_CREATE");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_to_memory() {
        clear_env();

        let config = DatabaseConfig::from_env().unwrap();
        assert!(config.is_memory());
        assert!(config.create);
        assert!(config.config_sources()["filename"].is_default());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_filename() {
        clear_env();
        env::set_var("DATABASE_FILENAME", "/tmp/app.db");
        env::set_var("DATABASE_CREATE", "false");

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.filename, "/tmp/app.db");
        assert!(!config.create);
        assert!(config.config_sources()["filename"].is_env_var());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_flag() {
        clear_env();
        env::set_var("DATABASE_CREATE", "sometimes");

        assert!(DatabaseConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_empty_filename_is_invalid() {
        assert!(DatabaseConfig::new("  ").validate().is_err());
        assert!(DatabaseConfig::new("app.db").must_exist().validate().is_ok());
    }
}
