//! Server configuration from the environment.
//!
//! HOST (default 0.0.0.0), PORT (default 8080), DATA_DIR (JSON file store; in-memory when unset),
//! SAVE_RETRIES (default 3).

use std::path::PathBuf;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub save_retries: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: None,
            save_retries: 3,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            data_dir: lookup("DATA_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            save_retries: parse_or("SAVE_RETRIES", lookup("SAVE_RETRIES"), defaults.save_retries),
        }
    }
}

fn parse_or<T: std::str::FromStr + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}
