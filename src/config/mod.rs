//! Configuration layer: typed settings with layered precedence (file → env).

use std::num::NonZeroU32;
use std::str::FromStr;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vetrina";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::INFO;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_OP_TIMEOUT_MS: u64 = 250;
const DEFAULT_TOTAL_COUNT_TTL_SECS: u64 = 60;

/// Fully-resolved deployment settings after precedence resolution and
/// validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub op_timeout_ms: u64,
    pub total_count_ttl_secs: u64,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    logging: RawLogging,
    database: RawDatabase,
    cache: RawCache,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogging {
    level: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCache {
    op_timeout_ms: Option<u64>,
    total_count_ttl_secs: Option<u64>,
}

/// Load settings using the configured precedence: `config/default` and
/// `vetrina` files when present, then `VETRINA__`-prefixed environment.
pub fn load() -> Result<Settings, LoadError> {
    let raw: RawSettings = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false))
        .add_source(Environment::with_prefix("VETRINA").separator("__"))
        .build()?
        .try_deserialize()?;

    Settings::from_raw(raw)
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let level = match raw.logging.level {
            None => DEFAULT_LOG_LEVEL,
            Some(value) => LevelFilter::from_str(&value).map_err(|_| {
                LoadError::invalid("logging.level", format!("unrecognized level `{value}`"))
            })?,
        };

        let format = match raw.logging.format.as_deref() {
            None | Some("compact") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(LoadError::invalid(
                    "logging.format",
                    format!("expected `compact` or `json`, got `{other}`"),
                ));
            }
        };

        let max_connections = NonZeroU32::new(
            raw.database
                .max_connections
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
        )
        .ok_or_else(|| LoadError::invalid("database.max_connections", "must be greater than zero"))?;

        let op_timeout_ms = raw.cache.op_timeout_ms.unwrap_or(DEFAULT_OP_TIMEOUT_MS);
        if op_timeout_ms == 0 {
            return Err(LoadError::invalid(
                "cache.op_timeout_ms",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            logging: LoggingSettings { level, format },
            database: DatabaseSettings {
                url: raw.database.url,
                max_connections,
            },
            cache: CacheSettings {
                op_timeout_ms,
                total_count_ttl_secs: raw
                    .cache
                    .total_count_ttl_secs
                    .unwrap_or(DEFAULT_TOTAL_COUNT_TTL_SECS),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_raw_is_empty() {
        let settings = Settings::from_raw(RawSettings::default()).expect("defaults");
        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert_eq!(settings.logging.format, LogFormat::Compact);
        assert!(settings.database.url.is_none());
        assert_eq!(settings.database.max_connections.get(), 8);
        assert_eq!(settings.cache.op_timeout_ms, 250);
        assert_eq!(settings.cache.total_count_ttl_secs, 60);
    }

    #[test]
    fn json_log_format_is_accepted() {
        let raw = RawSettings {
            logging: RawLogging {
                level: Some("debug".to_string()),
                format: Some("json".to_string()),
            },
            ..Default::default()
        };
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let raw = RawSettings {
            logging: RawLogging {
                level: Some("loud".to_string()),
                format: None,
            },
            ..Default::default()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key: "logging.level", .. })
        ));
    }

    #[test]
    fn zero_max_connections_is_rejected() {
        let raw = RawSettings {
            database: RawDatabase {
                url: None,
                max_connections: Some(0),
            },
            ..Default::default()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key: "database.max_connections", .. })
        ));
    }

    #[test]
    fn zero_op_timeout_is_rejected() {
        let raw = RawSettings {
            cache: RawCache {
                op_timeout_ms: Some(0),
                total_count_ttl_secs: None,
            },
            ..Default::default()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key: "cache.op_timeout_ms", .. })
        ));
    }
}
