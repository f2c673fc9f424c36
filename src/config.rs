//! Configuration management for pagepulse using the prefer crate.
//!
//! Precedence: built-in defaults, then a `pagepulse` config file discovered by
//! prefer, then environment variables (a `.env` file is loaded first).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default storage table name.
pub const DEFAULT_TABLE_NAME: &str = "Insights";
/// Default PageSpeed request timeout in seconds.
pub const DEFAULT_PAGESPEED_TIMEOUT_SECS: u64 = 60;
/// Insight endpoint request timeout in seconds.
pub const DEFAULT_INSIGHT_TIMEOUT_SECS: u64 = 30;
/// URL analysed when a performance request names none.
pub const DEFAULT_TARGET_URL: &str = "https://example.com/";
/// PageSpeed Insights v5 endpoint.
pub const PAGESPEED_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Which store backs the insights table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(StorageBackend::Sqlite),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Storage table name.
    pub table_name: String,
    /// Store backend.
    pub storage: StorageBackend,
    /// Insight analysis endpoint. Unset means the insight fetcher cannot run.
    pub insight_endpoint: Option<String>,
    /// Insight request timeout in seconds.
    pub insight_timeout: u64,
    /// PageSpeed Insights endpoint.
    pub pagespeed_endpoint: String,
    /// Optional PageSpeed API key.
    pub pagespeed_api_key: Option<String>,
    /// PageSpeed request timeout in seconds.
    pub pagespeed_timeout: u64,
    /// Fallback URL for performance runs.
    pub target_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("pagepulse");

        Self {
            data_dir,
            database_filename: "pagepulse.db".to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            storage: StorageBackend::default(),
            insight_endpoint: None,
            insight_timeout: DEFAULT_INSIGHT_TIMEOUT_SECS,
            pagespeed_endpoint: PAGESPEED_ENDPOINT.to_string(),
            pagespeed_api_key: None,
            pagespeed_timeout: DEFAULT_PAGESPEED_TIMEOUT_SECS,
            target_url: DEFAULT_TARGET_URL.to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the full path to the database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    pub fn insight_timeout(&self) -> Duration {
        Duration::from_secs(self.insight_timeout)
    }

    pub fn pagespeed_timeout(&self) -> Duration {
        Duration::from_secs(self.pagespeed_timeout)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    /// Overlay recognised environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get("INSIGHT_API_ENDPOINT") {
            self.insight_endpoint = Some(endpoint);
        }
        if let Some(table) = get("INSIGHTS_TABLE_NAME") {
            self.table_name = table;
        }
        if let Some(key) = get("PAGESPEED_API_KEY") {
            self.pagespeed_api_key = Some(key);
        }
        if let Some(timeout) = get("PAGESPEED_TIMEOUT_SECONDS") {
            match timeout.trim().parse() {
                Ok(secs) => self.pagespeed_timeout = secs,
                Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid PAGESPEED_TIMEOUT_SECONDS"),
            }
        }
        if let Some(url) = get("TARGET_URL") {
            self.target_url = url;
        }
        if let Some(dir) = get("PAGEPULSE_DATA_DIR") {
            self.data_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
        if let Some(storage) = get("PAGEPULSE_STORAGE") {
            match StorageBackend::parse(&storage) {
                Some(backend) => self.storage = backend,
                None => tracing::warn!(value = %storage, "Ignoring unknown PAGEPULSE_STORAGE"),
            }
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (tilde expanded).
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default)]
    pub database: Option<String>,
    /// Storage table name.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Store backend: "sqlite" or "memory".
    #[serde(default)]
    pub storage: Option<String>,
    /// Insight analysis endpoint.
    #[serde(default)]
    pub insight_endpoint: Option<String>,
    /// PageSpeed API key.
    #[serde(default)]
    pub pagespeed_api_key: Option<String>,
    /// PageSpeed request timeout in seconds.
    #[serde(default)]
    pub pagespeed_timeout: Option<u64>,
    /// Fallback URL for performance runs.
    #[serde(default)]
    pub target_url: Option<String>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers pagepulse config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("pagepulse").await {
            Ok(pref_config) => Config {
                data_dir: pref_config.get("data_dir").ok(),
                database: pref_config.get("database").ok(),
                table_name: pref_config.get("table_name").ok(),
                storage: pref_config.get("storage").ok(),
                insight_endpoint: pref_config.get("insight_endpoint").ok(),
                pagespeed_api_key: pref_config.get("pagespeed_api_key").ok(),
                pagespeed_timeout: pref_config.get("pagespeed_timeout").ok(),
                target_url: pref_config.get("target_url").ok(),
            },
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref dir) = self.data_dir {
            let path = shellexpand::tilde(dir);
            settings.data_dir = PathBuf::from(path.as_ref());
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref table) = self.table_name {
            settings.table_name = table.clone();
        }
        if let Some(backend) = self.storage.as_deref().and_then(StorageBackend::parse) {
            settings.storage = backend;
        }
        if let Some(ref endpoint) = self.insight_endpoint {
            settings.insight_endpoint = Some(endpoint.clone());
        }
        if let Some(ref key) = self.pagespeed_api_key {
            settings.pagespeed_api_key = Some(key.clone());
        }
        if let Some(timeout) = self.pagespeed_timeout {
            settings.pagespeed_timeout = timeout;
        }
        if let Some(ref url) = self.target_url {
            settings.target_url = url.clone();
        }
    }
}

/// Load settings: defaults, config file, then environment.
pub async fn load_settings() -> Settings {
    let _ = dotenvy::dotenv();
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings.apply_env();
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.table_name, "Insights");
        assert_eq!(settings.pagespeed_timeout, 60);
        assert_eq!(settings.insight_timeout(), Duration::from_secs(30));
        assert_eq!(settings.target_url, "https://example.com/");
        assert_eq!(settings.storage, StorageBackend::Sqlite);
        assert!(settings.insight_endpoint.is_none());
        assert!(settings.pagespeed_api_key.is_none());
        assert!(settings.database_path().ends_with("pagepulse.db"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("INSIGHT_API_ENDPOINT", "https://insight.test/run"),
            ("INSIGHTS_TABLE_NAME", "Scores"),
            ("PAGESPEED_API_KEY", "secret"),
            ("PAGESPEED_TIMEOUT_SECONDS", "15"),
            ("TARGET_URL", "https://target.test/"),
            ("PAGEPULSE_STORAGE", "memory"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(settings.insight_endpoint.as_deref(), Some("https://insight.test/run"));
        assert_eq!(settings.table_name, "Scores");
        assert_eq!(settings.pagespeed_api_key.as_deref(), Some("secret"));
        assert_eq!(settings.pagespeed_timeout(), Duration::from_secs(15));
        assert_eq!(settings.target_url, "https://target.test/");
        assert_eq!(settings.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_invalid_and_empty_env_values_are_ignored() {
        let mut settings = Settings::default();
        settings.apply_vars(|k| match k {
            "PAGESPEED_TIMEOUT_SECONDS" => Some("soon".to_string()),
            "PAGESPEED_API_KEY" => Some("  ".to_string()),
            "PAGEPULSE_STORAGE" => Some("dynamo".to_string()),
            _ => None,
        });
        assert_eq!(settings.pagespeed_timeout, 60);
        assert!(settings.pagespeed_api_key.is_none());
        assert_eq!(settings.storage, StorageBackend::Sqlite);
    }

    #[test]
    fn test_config_file_values_apply() {
        let config = Config {
            database: Some("scores.db".to_string()),
            table_name: Some("History".to_string()),
            storage: Some("Memory".to_string()),
            pagespeed_timeout: Some(5),
            ..Default::default()
        };
        let mut settings = Settings::with_data_dir(PathBuf::from("/tmp/pp"));
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.database_path(), PathBuf::from("/tmp/pp/scores.db"));
        assert_eq!(settings.table_name, "History");
        assert_eq!(settings.storage, StorageBackend::Memory);
        assert_eq!(settings.pagespeed_timeout, 5);
    }
}
