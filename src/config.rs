use std::{env, net::SocketAddr};

use thiserror::Error;

use crate::domain::CatalogProfile;

pub const DEFAULT_PORT: u16 = 10_000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub profile: CatalogProfile,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("CATALOG_PROFILE must be one of: structured, plain")]
    InvalidProfile,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_port = non_empty("PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);
        let profile = non_empty("CATALOG_PROFILE")
            .map(|value| {
                value
                    .parse::<CatalogProfile>()
                    .map_err(|_| ConfigError::InvalidProfile)
            })
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            bind_addr,
            bind_port,
            profile,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parse_defaults() {
        let config = from_pairs(&[]).expect("config should parse");
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.bind_port, 10_000);
        assert_eq!(config.profile, CatalogProfile::Structured);
        assert_eq!(
            config.bind_socket().expect("socket"),
            "0.0.0.0:10000".parse::<SocketAddr>().expect("addr")
        );
    }

    #[test]
    fn port_override() {
        let config = from_pairs(&[("PORT", "8080")]).expect("config should parse");
        assert_eq!(config.bind_port, 8080);
    }

    #[test]
    fn blank_port_uses_default() {
        let config = from_pairs(&[("PORT", "  ")]).expect("config should parse");
        assert_eq!(config.bind_port, DEFAULT_PORT);
    }

    #[test]
    fn invalid_port_fails() {
        let err = from_pairs(&[("PORT", "70000")]).expect_err("expected invalid port");
        assert!(matches!(err, ConfigError::InvalidPort));
    }

    #[test]
    fn plain_profile_parses() {
        let config = from_pairs(&[("CATALOG_PROFILE", "plain")]).expect("config should parse");
        assert_eq!(config.profile, CatalogProfile::Plain);
    }

    #[test]
    fn unknown_profile_fails() {
        let err = from_pairs(&[("CATALOG_PROFILE", "verbose")]).expect_err("expected invalid profile");
        assert!(matches!(err, ConfigError::InvalidProfile));
    }

    #[test]
    fn invalid_bind_addr_fails() {
        let err = from_pairs(&[("BIND_ADDR", "not an address")]).expect_err("expected invalid socket");
        assert!(matches!(err, ConfigError::InvalidSocket));
    }
}
