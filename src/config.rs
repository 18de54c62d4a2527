//! Service configuration: an optional TOML file with environment
//! variable overrides on top.
//!
//! Every field has a default, so a missing `studylog.toml` just means
//! "run with defaults". The JWT secret is the one setting with no
//! default; startup fails without it.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_FILE: &str = "studylog.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("studylog.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: 7 * 24 * 60 * 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Read `studylog.toml` if present, apply environment overrides, and
    /// validate the result.
    pub fn load() -> Result<Self> {
        let mut config = if std::path::Path::new(CONFIG_FILE).exists() {
            let text = std::fs::read_to_string(CONFIG_FILE)
                .with_context(|| format!("failed to read {CONFIG_FILE}"))?;
            Self::from_toml(&text)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document into a config
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config file")
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("STUDYLOG_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Ok(path) = std::env::var("STUDYLOG_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(secret) = std::env::var("STUDYLOG_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Ok(ttl) = std::env::var("STUDYLOG_TOKEN_TTL_SECS") {
            self.auth.token_ttl_secs = ttl
                .parse()
                .context("STUDYLOG_TOKEN_TTL_SECS must be an integer")?;
        }
        if let Ok(cost) = std::env::var("STUDYLOG_BCRYPT_COST") {
            self.auth.bcrypt_cost = cost
                .parse()
                .context("STUDYLOG_BCRYPT_COST must be an integer")?;
        }
        if let Ok(level) = std::env::var("STUDYLOG_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<()> {
        match &self.auth.jwt_secret {
            None => bail!("jwt secret not set; provide auth.jwt_secret or STUDYLOG_JWT_SECRET"),
            Some(s) if s.is_empty() => bail!("jwt secret must not be empty"),
            Some(_) => {}
        }
        if self.auth.token_ttl_secs <= 0 {
            bail!("auth.token_ttl_secs must be positive");
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            bail!("auth.bcrypt_cost must be between 4 and 31");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.database.path, PathBuf::from("studylog.db"));
        assert_eq!(config.auth.token_ttl_secs, 604_800);
        assert_eq!(config.logging.level, "info");
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [auth]
            jwt_secret = "s3cret"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_toml() {
        let config = Config::from_toml(
            r#"
            [server]
            bind_addr = "127.0.0.1:8080"

            [database]
            path = "/var/lib/studylog/data.db"

            [auth]
            jwt_secret = "s3cret"
            token_ttl_secs = 3600
            bcrypt_cost = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(
            config.database.path,
            PathBuf::from("/var/lib/studylog/data.db")
        );
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.bcrypt_cost, 10);
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("s3cret".to_string());

        config.auth.token_ttl_secs = 0;
        assert!(config.validate().is_err());

        config.auth.token_ttl_secs = 3600;
        config.auth.bcrypt_cost = 3;
        assert!(config.validate().is_err());

        config.auth.bcrypt_cost = 12;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_toml_rejected() {
        assert!(Config::from_toml("[server\nbind_addr = 3").is_err());
    }
}
