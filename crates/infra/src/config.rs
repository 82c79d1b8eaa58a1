//! Configuration loading and representation.
//!
//! Everything is read from environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `USE_PERSISTENT_STORES` | `false` | `true` selects PostgreSQL |
//! | `DATABASE_URL` | none | required when persistent stores are on |
//! | `DATABASE_MAX_CONNECTIONS` | `10` | pool size |

use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which entity store backs the managers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: raw_addr.clone(),
            reason: e.to_string(),
        })?;

        let persistent = lookup("USE_PERSISTENT_STORES")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let store = if persistent {
            let database_url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                    key: "DATABASE_MAX_CONNECTIONS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
                None => DEFAULT_MAX_CONNECTIONS,
            };
            StoreBackend::Postgres {
                database_url,
                max_connections,
            }
        } else {
            StoreBackend::InMemory
        };

        Ok(Self { bind_addr, store })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_in_memory() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store, StoreBackend::InMemory);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn persistent_requires_database_url() {
        let err = AppConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "true")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn persistent_reads_pool_settings() {
        let config = AppConfig::from_lookup(lookup(&[
            ("USE_PERSISTENT_STORES", "TRUE"),
            ("DATABASE_URL", "postgres://localhost/market"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ]))
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/market".to_string(),
                max_connections: 4,
            }
        );
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let err = AppConfig::from_lookup(lookup(&[("BIND_ADDR", "not-an-addr")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BIND_ADDR", .. }));
    }
}
