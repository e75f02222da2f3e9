use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when the config file or environment overrides cannot be parsed.
#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(String);

/// Top-level config (querydesk.toml + QUERYDESK_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuerydeskConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub workbench: WorkbenchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbenchConfig {
    /// Upper bound on SQL statements running at once. Queries abandoned by a
    /// scheduler timeout keep their slot until SQLite actually returns, so
    /// this also caps the abandoned-query backlog.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight_queries: usize,
    /// Populate the demo `customer` table on startup.
    #[serde(default)]
    pub seed_demo: bool,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            max_in_flight_queries: default_max_in_flight(),
            seed_demo: false,
        }
    }
}

impl QuerydeskConfig {
    /// Load config from `config_path` (or the default location) merged with
    /// `QUERYDESK_*` environment overrides, e.g. `QUERYDESK_DATABASE_PATH`.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: QuerydeskConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("QUERYDESK_").split("_"))
            .extract()
            .map_err(|e| ConfigError(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.querydesk/querydesk.toml", home)
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.querydesk/querydesk.db", home)
}

fn default_max_in_flight() -> usize {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = QuerydeskConfig::default();
        assert!(config.database.path.ends_with("querydesk.db"));
        assert_eq!(config.workbench.max_in_flight_queries, 8);
        assert!(!config.workbench.seed_demo);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: QuerydeskConfig = Figment::new()
            .merge(Toml::string("[database]\npath = \"/tmp/qd.db\"\n"))
            .extract()
            .unwrap();
        assert_eq!(config.database.path, "/tmp/qd.db");
        assert_eq!(config.workbench.max_in_flight_queries, 8);
    }
}
