use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use shelf_db::DbConfig;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SHELF_ENV";
const CONFIG_DIR_ENV: &str = "SHELF_CONFIG_DIR";
const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cors: CorsSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    ///
    /// Fails when no database URL is configured.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("SHELF")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parse_environment(&environment)?;

        if settings.database.url.is_none() {
            settings.database.url = std::env::var(DATABASE_URL_ENV)
                .ok()
                .filter(|url| !url.trim().is_empty());
        }
        if settings.database.url.is_none() {
            return Err(anyhow!(
                "{} is not set; a database connection string is required",
                DATABASE_URL_ENV
            ));
        }

        Ok(settings)
    }
}

fn parse_environment(value: &str) -> anyhow::Result<Environment> {
    match value {
        "local" => Ok(Environment::Local),
        "staging" => Ok(Environment::Staging),
        "production" => Ok(Environment::Production),
        other => Err(anyhow!(
            "unsupported environment '{}'; expected local/staging/production",
            other
        )),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8000
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "DatabaseSettings::default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl DatabaseSettings {
    fn default_max_connections() -> u32 {
        5
    }

    fn default_acquire_timeout_ms() -> u64 {
        5000
    }

    /// Build the pool configuration; errors when no URL is set.
    pub fn db_config(&self) -> anyhow::Result<DbConfig> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| anyhow!("database url is not configured"))?;

        Ok(DbConfig {
            url,
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
        })
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: Self::default_max_connections(),
            acquire_timeout_ms: Self::default_acquire_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    #[serde(default = "CorsSettings::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl CorsSettings {
    fn default_allowed_origins() -> Vec<String> {
        vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
        ]
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: Self::default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_cors_allows_dev_origins() {
        let settings = Settings::default();
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
    }

    #[test]
    fn db_config_requires_url() {
        let mut settings = Settings::default();
        assert!(settings.database.db_config().is_err());

        settings.database.url = Some("sqlite::memory:".to_string());
        let config = settings.database.db_config().unwrap();
        assert_eq!(config.url, "sqlite::memory:");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert!(parse_environment("qa").is_err());
        assert_eq!(parse_environment("staging").unwrap(), Environment::Staging);
    }
}
