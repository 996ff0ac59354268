//! Composer configuration.
//!
//! The composer needs three settings: the schema every table reference is
//! qualified with, whether malformed input is rejected or bound as a plain
//! parameter, and the keyword a batch cell may use to ask for a column default.
//!
//! # Environment Variables
//!
//! - `TAGSQL_SCHEMA` - schema name (default: `public`)
//! - `TAGSQL_MODE` - `strict` or `permissive` (default: `strict`)
//! - `TAGSQL_DEFAULT_KEYWORD` - batch default keyword (default: `DEFAULT`)
//!
//! # TOML
//!
//! ```rust
//! use tagsql_query::{ComposeMode, ComposerConfig};
//!
//! let config = ComposerConfig::from_toml(r#"
//!     [composer]
//!     schema = "market"
//!     mode = "permissive"
//! "#).unwrap();
//!
//! assert_eq!(config.schema, "market");
//! assert_eq!(config.mode, ComposeMode::Permissive);
//! assert_eq!(config.default_keyword, "DEFAULT");
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::QueryError;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment variable holds an unusable value.
    #[error("Invalid environment variable '{name}': {message}")]
    InvalidEnvValue { name: String, message: String },

    /// A setting failed validation.
    #[error("Invalid setting '{key}': {message}")]
    InvalidSetting { key: String, message: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for QueryError {
    fn from(err: ConfigError) -> Self {
        QueryError::configuration(err.to_string()).with_source(err)
    }
}

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;
}

/// Default environment source using std::env.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a HashMap.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create a new map-based environment source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// How the composer treats malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeMode {
    /// Reject ragged or empty batches, misplaced tables and unsafe batch cells.
    #[default]
    Strict,
    /// Bind malformed input as an ordinary parameter instead of failing.
    Permissive,
}

impl ComposeMode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "permissive" => Some(Self::Permissive),
            _ => None,
        }
    }

    /// Check if this is strict mode.
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl fmt::Display for ComposeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Permissive => write!(f, "permissive"),
        }
    }
}

/// Settings for a [`Composer`](crate::Composer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Schema prefixed onto every table reference.
    pub schema: String,
    /// Malformed-input policy.
    pub mode: ComposeMode,
    /// Raw batch cell that stands for the column default.
    pub default_keyword: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            mode: ComposeMode::Strict,
            default_keyword: "DEFAULT".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    composer: ComposerConfig,
}

impl ComposerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Set the mode.
    pub fn mode(mut self, mode: ComposeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for permissive mode.
    pub fn permissive(self) -> Self {
        self.mode(ComposeMode::Permissive)
    }

    /// Set the batch default keyword.
    pub fn default_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.default_keyword = keyword.into();
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_source(&StdEnvSource)
    }

    /// Load from an environment source, falling back to defaults.
    pub fn from_env_source<S: EnvSource + ?Sized>(source: &S) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(schema) = source.get("TAGSQL_SCHEMA") {
            config.schema = schema;
        }
        if let Some(mode) = source.get("TAGSQL_MODE") {
            config.mode = ComposeMode::parse(&mode).ok_or_else(|| ConfigError::InvalidEnvValue {
                name: "TAGSQL_MODE".to_string(),
                message: format!("expected 'strict' or 'permissive', got '{}'", mode),
            })?;
        }
        if let Some(keyword) = source.get("TAGSQL_DEFAULT_KEYWORD") {
            config.default_keyword = keyword;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load the `[composer]` table of a TOML document.
    pub fn from_toml(input: &str) -> ConfigResult<Self> {
        let file: ConfigFile = toml::from_str(input)?;
        file.composer.validate()?;
        Ok(file.composer)
    }

    /// Check the settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.schema.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "schema".to_string(),
                message: "schema name cannot be empty".to_string(),
            });
        }
        if self.schema.contains('\0') {
            return Err(ConfigError::InvalidSetting {
                key: "schema".to_string(),
                message: "schema name cannot contain NUL".to_string(),
            });
        }
        if self.default_keyword.is_empty()
            || !self.default_keyword.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ConfigError::InvalidSetting {
                key: "default_keyword".to_string(),
                message: format!("'{}' is not a bare SQL keyword", self.default_keyword),
            });
        }
        Ok(())
    }
}
