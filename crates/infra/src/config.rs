//! Application configuration, read from environment variables.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use crate::accounts::{DEFAULT_REMEMBER_TTL_DAYS, DEFAULT_SESSION_TTL_MINUTES};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 10;
const DEV_SECRET_KEY: &str = "dev-SECRET_KEY-not-for-production";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in {1} environment")]
    Missing(&'static str, String),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Deployment environment: development | staging | production
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Other(String),
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "development" => Environment::Development,
            other => Environment::Other(other.to_string()),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Other(name) => name,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    /// PostgreSQL connection URL; `None` selects the in-memory backend.
    pub database_url: Option<String>,
    pub max_db_connections: u32,
    /// Session cookie signing key.
    pub secret_key: String,
    pub session_ttl: Duration,
    pub remember_ttl: Duration,
    pub seed_demo_data: bool,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("environment", &self.environment)
            .field("bind_addr", &self.bind_addr)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("max_db_connections", &self.max_db_connections)
            .field("session_ttl", &self.session_ttl)
            .field("remember_ttl", &self.remember_ttl)
            .field("seed_demo_data", &self.seed_demo_data)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Development defaults with an in-memory backend and no demo data.
    pub fn for_tests() -> Self {
        Self {
            environment: Environment::Development,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: None,
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            secret_key: "test-secret".to_string(),
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            remember_ttl: Duration::days(DEFAULT_REMEMBER_TTL_DAYS),
            seed_demo_data: false,
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = Environment::parse(&lookup("ENVIRONMENT").unwrap_or_default());

        let bind_addr = lookup("BIND_ADDR")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let secret_key = match lookup("SECRET_KEY").filter(|s| !s.is_empty()) {
            Some(key) => key,
            None if environment.is_development() => {
                tracing::warn!("SECRET_KEY not set; using insecure dev default");
                DEV_SECRET_KEY.to_string()
            }
            None => {
                return Err(ConfigError::Missing(
                    "SECRET_KEY",
                    environment.as_str().to_string(),
                ));
            }
        };

        let session_minutes = parse_number(
            &lookup,
            "SESSION_TTL_MINUTES",
            DEFAULT_SESSION_TTL_MINUTES,
        )?;
        let session_ttl = Duration::try_minutes(session_minutes).ok_or(ConfigError::Invalid {
            name: "SESSION_TTL_MINUTES",
            reason: "out of range".to_string(),
        })?;
        let remember_days = parse_number(&lookup, "REMEMBER_TTL_DAYS", DEFAULT_REMEMBER_TTL_DAYS)?;
        let remember_ttl = Duration::try_days(remember_days).ok_or(ConfigError::Invalid {
            name: "REMEMBER_TTL_DAYS",
            reason: "out of range".to_string(),
        })?;
        let max_db_connections =
            parse_number(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS)?;

        let seed_demo_data = match lookup("SEED_DEMO_DATA") {
            Some(raw) => parse_flag("SEED_DEMO_DATA", &raw)?,
            None => environment.is_development(),
        };

        Ok(Self {
            environment,
            bind_addr,
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            max_db_connections,
            secret_key,
            session_ttl,
            remember_ttl,
            seed_demo_data,
        })
    }
}

/// Parse a positive number, falling back to `default` when unset.
fn parse_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: core::str::FromStr + PartialOrd + Default,
    T::Err: core::fmt::Display,
{
    let Some(raw) = lookup(name).filter(|s| !s.trim().is_empty()) else {
        return Ok(default);
    };
    let value = raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
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
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn development_defaults() {
        let cfg = load(&[]).unwrap();
        assert!(cfg.environment.is_development());
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.secret_key, DEV_SECRET_KEY);
        assert_eq!(cfg.session_ttl, Duration::minutes(720));
        assert_eq!(cfg.remember_ttl, Duration::days(30));
        assert!(cfg.seed_demo_data);
    }

    #[test]
    fn production_requires_secret_key() {
        let err = load(&[("ENVIRONMENT", "production")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing("SECRET_KEY", "production".to_string())
        );

        let err = load(&[("ENVIRONMENT", "production"), ("SECRET_KEY", "")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SECRET_KEY", _)));

        let cfg = load(&[("ENVIRONMENT", "production"), ("SECRET_KEY", "s3cret")]).unwrap();
        assert_eq!(cfg.secret_key, "s3cret");
        assert!(!cfg.seed_demo_data);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = load(&[("SESSION_TTL_MINUTES", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SESSION_TTL_MINUTES", .. }));

        let err = load(&[("REMEMBER_TTL_DAYS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "REMEMBER_TTL_DAYS", .. }));

        let cfg = load(&[("SESSION_TTL_MINUTES", " 15 ")]).unwrap();
        assert_eq!(cfg.session_ttl, Duration::minutes(15));
    }

    #[test]
    fn flags_and_database_url() {
        let cfg = load(&[
            ("SEED_DEMO_DATA", "off"),
            ("DATABASE_URL", "postgres://epm@localhost/epm"),
        ])
        .unwrap();
        assert!(!cfg.seed_demo_data);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://epm@localhost/epm"));

        assert!(load(&[("SEED_DEMO_DATA", "maybe")]).is_err());
    }

    #[test]
    fn debug_output_omits_secrets() {
        let cfg = load(&[
            ("SECRET_KEY", "very-secret"),
            ("DATABASE_URL", "postgres://user:pw@db/epm"),
        ])
        .unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("pw@db"));
    }
}
