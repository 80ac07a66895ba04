//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Whether the store may use multi-document transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Use transactions when the store supports them.
    #[default]
    Auto,
    /// Always use per-item writes with compensation.
    Off,
}

impl TransactionMode {
    pub fn allows_transactions(&self) -> bool {
        *self == TransactionMode::Auto
    }
}

impl FromStr for TransactionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "on" | "true" => Ok(TransactionMode::Auto),
            "off" | "false" => Ok(TransactionMode::Off),
            other => Err(format!("unknown transaction mode '{other}'")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `RUN_MIGRATIONS`: apply migrations at startup (default: `true`)
/// - `STORE_TRANSACTIONS`: `auto` or `off` (default: `auto`)
/// - `SEED_FILE`: JSON file of products and customers loaded at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub store_transactions: TransactionMode,
    pub seed_file: Option<PathBuf>,
    /// `KEY=value` pairs that failed to parse and were replaced by defaults.
    /// Logged once tracing is up.
    pub ignored_vars: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut ignored = Vec::new();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", &mut ignored).unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse_var(&lookup, "LOG_FORMAT", &mut ignored)
                .unwrap_or(defaults.log_format),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", &mut ignored)
                .unwrap_or(defaults.database_max_connections),
            run_migrations: parse_var(&lookup, "RUN_MIGRATIONS", &mut ignored)
                .unwrap_or(defaults.run_migrations),
            store_transactions: parse_var(&lookup, "STORE_TRANSACTIONS", &mut ignored)
                .unwrap_or(defaults.store_transactions),
            seed_file: non_empty("SEED_FILE").map(PathBuf::from),
            ignored_vars: ignored,
        }
    }

    /// Warns about every value that fell back to its default.
    pub fn warn_ignored(&self) {
        for var in &self.ignored_vars {
            tracing::warn!(setting = %var, "unparsable configuration value, using default");
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    ignored: &mut Vec<String>,
) -> Option<T> {
    let value = lookup(key)?;
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        ignored.push(format!("{key}={value}"));
    }
    parsed
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            run_migrations: true,
            store_transactions: TransactionMode::Auto,
            seed_file: None,
            ignored_vars: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 10);
        assert!(config.run_migrations);
        assert_eq!(config.store_transactions, TransactionMode::Auto);
        assert!(config.seed_file.is_none());
        assert!(config.ignored_vars.is_empty());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("RUST_LOG", "debug"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/gallery"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("RUN_MIGRATIONS", "false"),
            ("STORE_TRANSACTIONS", "off"),
            ("SEED_FILE", "seed.json"),
        ]));

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/gallery")
        );
        assert_eq!(config.database_max_connections, 4);
        assert!(!config.run_migrations);
        assert_eq!(config.store_transactions, TransactionMode::Off);
        assert!(!config.store_transactions.allows_transactions());
        assert_eq!(config.seed_file, Some(PathBuf::from("seed.json")));
        assert!(config.ignored_vars.is_empty());
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("LOG_FORMAT", "xml"),
            ("STORE_TRANSACTIONS", "sometimes"),
            ("DATABASE_URL", "  "),
        ]));

        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.store_transactions, TransactionMode::Auto);
        assert!(config.database_url.is_none());
        assert_eq!(
            config.ignored_vars,
            vec![
                "PORT=not-a-port".to_string(),
                "LOG_FORMAT=xml".to_string(),
                "STORE_TRANSACTIONS=sometimes".to_string(),
            ]
        );
    }

    #[test]
    fn test_transaction_mode_typo_is_reported() {
        let config = Config::from_lookup(lookup(&[("STORE_TRANSACTIONS", "of")]));

        assert_eq!(config.store_transactions, TransactionMode::Auto);
        assert_eq!(config.ignored_vars, vec!["STORE_TRANSACTIONS=of".to_string()]);
    }
}
