use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

use crate::pattern::SMART_PREFIX_MIN_CHARS;

const SECRETS_DIR: &str = "/run/secrets";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_connect_timeout: Duration,
    pub collation_locale: String,
    pub smart_prefix_min_chars: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_database: "marketplace".to_string(),
            mongo_connect_timeout: Duration::from_millis(2000),
            collation_locale: "es".to_string(),
            smart_prefix_min_chars: SMART_PREFIX_MIN_CHARS,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mongo_uri = lookup("MONGO_URI")
            .or_else(|| read_secret("MONGO_URI"))
            .unwrap_or_else(|| {
                info!("MONGO_URI not set, using default");
                defaults.mongo_uri.clone()
            });

        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", defaults.port)?,
            mongo_uri,
            mongo_database: try_load(&lookup, "MONGO_DATABASE", defaults.mongo_database)?,
            mongo_connect_timeout: Duration::from_millis(try_load(
                &lookup,
                "MONGO_CONNECT_TIMEOUT_MS",
                defaults.mongo_connect_timeout.as_millis() as u64,
            )?),
            collation_locale: try_load(
                &lookup,
                "SEARCH_COLLATION_LOCALE",
                defaults.collation_locale,
            )?,
            smart_prefix_min_chars: try_load(
                &lookup,
                "SEARCH_SMART_PREFIX_MIN_CHARS",
                defaults.smart_prefix_min_chars,
            )?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(value) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };

    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }
    })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("{SECRETS_DIR}/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Config::load_from(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("RUST_PORT", "9000"),
            ("MONGO_URI", "mongodb://db:27017"),
            ("MONGO_DATABASE", "tienda"),
            ("MONGO_CONNECT_TIMEOUT_MS", "500"),
            ("SEARCH_COLLATION_LOCALE", "pt"),
            ("SEARCH_SMART_PREFIX_MIN_CHARS", "4"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, ,http://b.test"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.mongo_uri, "mongodb://db:27017");
        assert_eq!(config.mongo_database, "tienda");
        assert_eq!(config.mongo_connect_timeout, Duration::from_millis(500));
        assert_eq!(config.collation_locale, "pt");
        assert_eq!(config.smart_prefix_min_chars, 4);
        assert_eq!(config.cors_allowed_origins, ["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = load(&[("MONGO_URI", "mongodb://db"), ("RUST_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "RUST_PORT", .. }));
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[("MONGO_URI", "mongodb://localhost:27017")]).unwrap();
        assert_eq!(config, Config::default());
    }
}
