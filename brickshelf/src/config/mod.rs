mod file_config;

pub use file_config::FileConfig;

use crate::catalog_client::DEFAULT_API_BASE_URL;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Database file used when neither the CLI nor the config file name one.
pub const DEFAULT_DB_FILE: &str = "brickshelf.db";
pub const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub request_timeout_sec: u64,
    pub log_level: LogLevel,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            api_key: None,
            api_base_url: None,
            request_timeout_sec: DEFAULT_REQUEST_TIMEOUT_SEC,
            log_level: LogLevel::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Fallback credential, used when none is stored in the database.
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub request_timeout_sec: u64,
    pub log_level: LogLevel,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let api_key = file
            .api_key
            .or_else(|| cli.api_key.clone())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let api_base_url = file
            .api_base_url
            .or_else(|| cli.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            bail!("api_base_url must be an http(s) URL, got {}", api_base_url);
        }

        let request_timeout_sec = file
            .request_timeout_sec
            .unwrap_or(cli.request_timeout_sec);
        if request_timeout_sec == 0 {
            bail!("request_timeout_sec must be greater than 0");
        }

        let log_level = file
            .log_level
            .and_then(|s| parse_log_level(&s))
            .unwrap_or(cli.log_level);

        Ok(AppConfig {
            db_path,
            api_key,
            api_base_url,
            request_timeout_sec,
            log_level,
        })
    }
}

fn parse_log_level(s: &str) -> Option<LogLevel> {
    LogLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("off"), Some(LogLevel::Off));
        // Case insensitive
        assert_eq!(parse_log_level("DEBUG"), Some(LogLevel::Debug));
        // Invalid
        assert!(parse_log_level("verbose").is_none());
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();

        assert_eq!(config.db_path, PathBuf::from("brickshelf.db"));
        assert_eq!(config.api_key, None);
        assert_eq!(config.api_base_url, "https://rebrickable.com/api/v3/lego");
        assert_eq!(config.request_timeout_sec, 30);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(temp_dir.path().join("sets.db")),
            api_key: Some(" cli-key ".to_string()),
            api_base_url: Some("http://localhost:9000/lego".to_string()),
            request_timeout_sec: 5,
            log_level: LogLevel::Debug,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_path, temp_dir.path().join("sets.db"));
        assert_eq!(config.api_key.as_deref(), Some("cli-key"));
        assert_eq!(config.api_base_url, "http://localhost:9000/lego");
        assert_eq!(config.request_timeout_sec, 5);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/should/be/overridden.db")),
            api_key: Some("cli-key".to_string()),
            request_timeout_sec: 5,
            log_level: LogLevel::Error,
            ..Default::default()
        };

        let file_config = FileConfig {
            db_path: Some(temp_dir.path().join("toml.db").to_string_lossy().to_string()),
            api_key: Some("toml-key".to_string()),
            log_level: Some("trace".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.db_path, temp_dir.path().join("toml.db"));
        assert_eq!(config.api_key.as_deref(), Some("toml-key"));
        assert_eq!(config.log_level, LogLevel::Trace);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.request_timeout_sec, 5);
    }

    #[test]
    fn test_resolve_blank_api_key_is_none() {
        let cli = CliConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_resolve_invalid_log_level_falls_back_to_cli() {
        let file_config = FileConfig {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&CliConfig::default(), Some(file_config)).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_resolve_zero_timeout_error() {
        let file_config = FileConfig {
            request_timeout_sec: Some(0),
            ..Default::default()
        };
        let result = AppConfig::resolve(&CliConfig::default(), Some(file_config));
        assert!(result.unwrap_err().to_string().contains("greater than 0"));
    }

    #[test]
    fn test_resolve_non_http_base_url_error() {
        let cli = CliConfig {
            api_base_url: Some("ftp://rebrickable.com".to_string()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("http(s)"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/nonexistent/path/that/should/not/exist/sets.db")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_path_is_directory_error() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("is a directory"));
    }
}
