//! Configuration file parsing
//!
//! Reads optional changelog-normalize.toml configuration files. Every key
//! has a default, and the defaults produce the canonical naming scheme.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::naming::NameCategory;
use crate::normalize::{DEFAULT_VARCHAR_MAX_LENGTH, VarcharCap};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub types: TypesConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Prefix for `notNullConstraintName` and `addNotNullConstraint` names
    pub not_null_prefix: String,

    /// Prefix for primary key names
    pub primary_key_prefix: String,

    /// Prefix for unique constraint names
    pub unique_prefix: String,

    /// Prefix for `createIndex` names
    pub index_prefix: String,

    /// Prefix for foreign key names
    pub foreign_key_prefix: String,

    /// Value every rotation counter starts from. The first synthetic name
    /// uses one more than this.
    pub initial_counter: u64,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            not_null_prefix: NameCategory::NotNull.default_prefix().to_string(),
            primary_key_prefix: NameCategory::PrimaryKey.default_prefix().to_string(),
            unique_prefix: NameCategory::UniqueIndex.default_prefix().to_string(),
            index_prefix: NameCategory::Index.default_prefix().to_string(),
            foreign_key_prefix: NameCategory::ForeignKey.default_prefix().to_string(),
            initial_counter: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TypesConfig {
    /// Longest `VARCHAR(n)` kept as written
    #[serde(default = "default_varchar_max_length")]
    pub varchar_max_length: i64,
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            varchar_max_length: default_varchar_max_length(),
        }
    }
}

impl TypesConfig {
    pub fn varchar_cap(&self) -> VarcharCap {
        VarcharCap::new(self.varchar_max_length)
    }
}

fn default_varchar_max_length() -> i64 {
    DEFAULT_VARCHAR_MAX_LENGTH
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        let prefixes = [
            ("not_null_prefix", &self.naming.not_null_prefix),
            ("primary_key_prefix", &self.naming.primary_key_prefix),
            ("unique_prefix", &self.naming.unique_prefix),
            ("index_prefix", &self.naming.index_prefix),
            ("foreign_key_prefix", &self.naming.foreign_key_prefix),
        ];
        for (key, value) in prefixes {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "naming.{} must not be empty",
                    key
                )));
            }
        }
        if self.types.varchar_max_length <= 0 {
            return Err(ConfigError::Validation(format!(
                "invalid varchar_max_length {}. Must be greater than 0",
                self.types.varchar_max_length
            )));
        }
        Ok(())
    }
}
