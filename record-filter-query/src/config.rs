//! Compiler configuration.
//!
//! Configuration can be built in code or loaded from the environment:
//!
//! - `RECORD_FILTER_PLACEHOLDER`: `question` (default) or `dollar`/`postgres`
//! - `RECORD_FILTER_QUOTE_TABLES`: `true` (default) or `false`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FilterError, FilterResult};
use crate::sql::PlaceholderStyle;

/// Environment variable selecting the placeholder style.
pub const PLACEHOLDER_VAR: &str = "RECORD_FILTER_PLACEHOLDER";
/// Environment variable toggling quoted table names in conditions.
pub const QUOTE_TABLES_VAR: &str = "RECORD_FILTER_QUOTE_TABLES";

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;

    /// Check if a variable exists.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
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

/// How filters are compiled to SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Placeholder syntax for bind values.
    pub placeholders: PlaceholderStyle,
    /// Quote table names in conditions and join clauses (`"posts".id`).
    pub quote_tables: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            placeholders: PlaceholderStyle::Question,
            quote_tables: true,
        }
    }
}

impl CompilerConfig {
    /// Configuration for PostgreSQL-style `$n` placeholders.
    pub fn postgres() -> Self {
        Self::default().placeholders(PlaceholderStyle::Dollar)
    }

    /// Set the placeholder style.
    pub fn placeholders(mut self, style: PlaceholderStyle) -> Self {
        self.placeholders = style;
        self
    }

    /// Set whether table names are quoted.
    pub fn quote_tables(mut self, quote: bool) -> Self {
        self.quote_tables = quote;
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> FilterResult<Self> {
        Self::from_source(&StdEnvSource)
    }

    /// Load configuration from an environment source.
    ///
    /// Unset variables keep their defaults.
    pub fn from_source(source: &impl EnvSource) -> FilterResult<Self> {
        let mut config = Self::default();

        if let Some(value) = source.get(PLACEHOLDER_VAR) {
            config.placeholders = match value.trim().to_ascii_lowercase().as_str() {
                "question" | "?" => PlaceholderStyle::Question,
                "dollar" | "postgres" | "postgresql" => PlaceholderStyle::Dollar,
                _ => return Err(FilterError::invalid_config(PLACEHOLDER_VAR, value)),
            };
        }

        if let Some(value) = source.get(QUOTE_TABLES_VAR) {
            config.quote_tables = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(FilterError::invalid_config(QUOTE_TABLES_VAR, value)),
            };
        }

        info!(
            placeholders = ?config.placeholders,
            quote_tables = config.quote_tables,
            "Loaded compiler configuration"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_defaults_when_unset() {
        let config = CompilerConfig::from_source(&MapEnvSource::new()).unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.placeholders, PlaceholderStyle::Question);
        assert!(config.quote_tables);
    }

    #[test]
    fn test_reads_values() {
        let env = MapEnvSource::new()
            .set(PLACEHOLDER_VAR, "Postgres")
            .set(QUOTE_TABLES_VAR, "off");
        let config = CompilerConfig::from_source(&env).unwrap();
        assert_eq!(config, CompilerConfig::postgres().quote_tables(false));
    }

    #[test]
    fn test_invalid_values() {
        let env = MapEnvSource::new().set(PLACEHOLDER_VAR, "colon");
        let err = CompilerConfig::from_source(&env).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
        assert!(err.message.contains(PLACEHOLDER_VAR));

        let env = MapEnvSource::new().set(QUOTE_TABLES_VAR, "maybe");
        assert!(CompilerConfig::from_source(&env).is_err());
    }
}
