//! # Configuration
//!
//! Application configuration loaded once at startup.
//!
//! ## Environment Variables
//! ```text
//! GREENGROCER_DB_PATH           ./greengrocer.db
//! GREENGROCER_MAX_CONNECTIONS   5
//! GREENGROCER_RUN_MIGRATIONS    true
//! GREENGROCER_STORE_NAME        Fresh Harvest Greengrocers
//! GREENGROCER_CURRENCY_SYMBOL   $
//! ```
//! Unset variables take the default. A variable that is set but does not
//! parse is an error rather than a silent fallback.

use std::path::PathBuf;

use greengrocer_core::Money;
use greengrocer_db::DbConfig;
use serde::Serialize;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "GREENGROCER_DB_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "GREENGROCER_MAX_CONNECTIONS";
pub const ENV_RUN_MIGRATIONS: &str = "GREENGROCER_RUN_MIGRATIONS";
pub const ENV_STORE_NAME: &str = "GREENGROCER_STORE_NAME";
pub const ENV_CURRENCY_SYMBOL: &str = "GREENGROCER_CURRENCY_SYMBOL";

/// Configuration load failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub run_migrations: bool,

    /// Display only.
    pub store_name: String,

    /// Display only.
    pub currency_symbol: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("./greengrocer.db"),
            max_connections: 5,
            run_migrations: true,
            store_name: "Fresh Harvest Greengrocers".to_string(),
            currency_symbol: "$".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's
    /// value if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(value) = lookup(ENV_MAX_CONNECTIONS) {
            config.max_connections = match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                Ok(_) => return Err(invalid(ENV_MAX_CONNECTIONS, &value, "must be at least 1")),
                Err(e) => return Err(invalid(ENV_MAX_CONNECTIONS, &value, &e.to_string())),
            };
        }

        if let Some(value) = lookup(ENV_RUN_MIGRATIONS) {
            config.run_migrations = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid(ENV_RUN_MIGRATIONS, &value, "expected true or false")),
            };
        }

        if let Some(name) = lookup(ENV_STORE_NAME) {
            config.store_name = name;
        }

        if let Some(symbol) = lookup(ENV_CURRENCY_SYMBOL) {
            config.currency_symbol = symbol;
        }

        Ok(config)
    }

    /// The database settings this configuration asks for.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .run_migrations(self.run_migrations)
    }

    /// Formats an amount with the configured symbol, e.g. `$12.34`.
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.abs();
        format!("{}{}{}.{:02}", sign, self.currency_symbol, cents / 100, cents % 100)
    }
}

fn invalid(var: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./greengrocer.db"));
        assert_eq!(config.max_connections, 5);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_DB_PATH, "/tmp/shop.db"),
            (ENV_MAX_CONNECTIONS, "2"),
            (ENV_RUN_MIGRATIONS, "no"),
            (ENV_STORE_NAME, "Veggie Box"),
            (ENV_CURRENCY_SYMBOL, "NZ$"),
        ])
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.max_connections, 2);
        assert!(!config.run_migrations);
        assert_eq!(config.store_name, "Veggie Box");
        assert_eq!(config.format_currency(Money::from_cents(350)), "NZ$3.50");
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(load(&[(ENV_MAX_CONNECTIONS, "many")]).is_err());
        assert!(load(&[(ENV_MAX_CONNECTIONS, "0")]).is_err());
        let err = load(&[(ENV_RUN_MIGRATIONS, "maybe")]).unwrap_err();
        assert!(err.to_string().contains(ENV_RUN_MIGRATIONS));
    }

    #[test]
    fn test_format_currency() {
        let config = AppConfig::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
        assert_eq!(config.format_currency(Money::from_cents(1)), "$0.01");
        assert_eq!(config.format_currency(Money::from_cents(-1234)), "-$12.34");
    }
}
