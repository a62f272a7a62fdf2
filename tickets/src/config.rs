//! Configuration management for the ticket store.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::locks::DEFAULT_STRIPES;
use crate::reducer::AuthPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend configuration
    pub storage: StorageConfig,
    /// Authorization configuration
    pub auth: AuthConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Which key-value backend holds ticket records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on restart
    Memory,
    /// Snapshot file on local disk
    File,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "file" | "disk" => Ok(Self::File),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend kind (default: memory)
    pub backend: StorageBackend,
    /// Snapshot path for the file backend (default: `tickets.db`)
    pub path: PathBuf,
    /// Number of per-key lock stripes (default: 64)
    pub lock_stripes: usize,
}

/// Authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Only the seller may revoke or delete a ticket (default: true)
    pub require_seller_auth: bool,
}

impl AuthConfig {
    /// The reducer policy this configuration selects
    #[must_use]
    pub const fn policy(&self) -> AuthPolicy {
        AuthPolicy {
            require_seller_auth: self.require_seller_auth,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (trace, debug, info, warn, error, or `EnvFilter` syntax)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Used by [`Config::from_env`] and by tests that should not touch the
    /// process environment.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            storage: StorageConfig {
                backend: lookup("TICKET_STORE_BACKEND")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(StorageBackend::Memory),
                path: lookup("TICKET_STORE_PATH")
                    .map_or_else(|| PathBuf::from("tickets.db"), PathBuf::from),
                lock_stripes: lookup("TICKET_STORE_LOCK_STRIPES")
                    .and_then(|s| s.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_STRIPES),
            },
            auth: AuthConfig {
                require_seller_auth: lookup("TICKET_STORE_REQUIRE_SELLER_AUTH")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
            logging: LoggingConfig {
                log_level: lookup("RUST_LOG")
                    .unwrap_or_else(|| "info,ticket_store=debug".to_string()),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
