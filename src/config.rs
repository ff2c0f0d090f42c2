//! Runtime configuration, read from the environment (and `.env` via dotenvy).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_JWT_SECRET: &str = "mysecretkey";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected `pretty` or `json`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub demo_user: String,
    pub demo_password: String,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Loads `.env` if present, then reads `CATALOG_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ttl_minutes: u64 = parse_or(&lookup, "CATALOG_TOKEN_TTL_MINUTES", 15)?;
        let ttl_secs = ttl_minutes.checked_mul(60).ok_or_else(|| ConfigError::Invalid {
            key: "CATALOG_TOKEN_TTL_MINUTES",
            value: ttl_minutes.to_string(),
            reason: "token lifetime does not fit in seconds".to_string(),
        })?;
        let bcrypt_cost: u32 = parse_or(&lookup, "CATALOG_BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "CATALOG_BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "bcrypt cost must be between 4 and 31".to_string(),
            });
        }

        Ok(Self {
            bind_addr: parse_or(&lookup, "CATALOG_BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            db_path: lookup("CATALOG_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("catalog_data")),
            jwt_secret: lookup("CATALOG_JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            token_ttl: Duration::from_secs(ttl_secs),
            bcrypt_cost,
            demo_user: lookup("CATALOG_DEMO_USER").unwrap_or_else(|| "user1".to_string()),
            demo_password: lookup("CATALOG_DEMO_PASSWORD").unwrap_or_else(|| "password123".to_string()),
            log_format: parse_or(&lookup, "CATALOG_LOG_FORMAT", LogFormat::Pretty)?,
            log_dir: lookup("CATALOG_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.token_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.demo_user, "user1");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CATALOG_BIND_ADDR", "127.0.0.1:9100"),
            ("CATALOG_TOKEN_TTL_MINUTES", "30"),
            ("CATALOG_BCRYPT_COST", "4"),
            ("CATALOG_LOG_FORMAT", "JSON"),
            ("CATALOG_LOG_DIR", "/var/log/catalog"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.token_ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/catalog")));
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup_from(&[("CATALOG_TOKEN_TTL_MINUTES", "soon")])).unwrap_err();
        assert!(err.to_string().contains("CATALOG_TOKEN_TTL_MINUTES"));

        let err = Config::from_lookup(lookup_from(&[("CATALOG_TOKEN_TTL_MINUTES", "307445734561825861")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "CATALOG_TOKEN_TTL_MINUTES", .. }
        ));

        assert!(Config::from_lookup(lookup_from(&[("CATALOG_BCRYPT_COST", "2")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CATALOG_LOG_FORMAT", "xml")])).is_err());
    }
}
