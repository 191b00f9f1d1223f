//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use blackjack::{
    discovery::DiscoverySettings, messages::NAME_LEN, server::ServerSettings,
    session::SessionSettings,
};

/// Values given on the command line. They win over the environment.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub name: Option<String>,
    pub bind: Option<SocketAddr>,
    pub max_sessions: Option<usize>,
    pub no_discovery: bool,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name announced in Offers
    pub server_name: String,
    /// TCP bind address
    pub bind: SocketAddr,
    /// Concurrent session limit (clamped to [1, 20] by the server)
    pub max_sessions: usize,
    /// Per-read timeout, `None` when disabled
    pub read_timeout: Option<Duration>,
    /// Offer destination
    pub broadcast_addr: SocketAddr,
    /// Offer period
    pub broadcast_interval: Duration,
    /// Whether Offers are broadcast at all
    pub discovery: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_lookup<F>(overrides: CliOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerSettings::default();
        let discovery_defaults = DiscoverySettings::default();

        let server_name = match overrides.name {
            Some(name) => name,
            None => lookup("BJ_SERVER_NAME").unwrap_or(defaults.server_name),
        };
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env_or(&lookup, "BJ_BIND", defaults.bind)?,
        };
        let max_sessions = match overrides.max_sessions {
            Some(max_sessions) => max_sessions,
            None => parse_env_or(&lookup, "BJ_MAX_SESSIONS", defaults.max_sessions)?,
        };

        let default_timeout = defaults
            .session
            .read_timeout
            .map_or(0, |timeout| timeout.as_secs());
        let read_timeout = match parse_env_or(&lookup, "BJ_READ_TIMEOUT_SECS", default_timeout)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let broadcast_addr = parse_env_or(&lookup, "BJ_BROADCAST_ADDR", discovery_defaults.target)?;
        let default_interval = u64::try_from(discovery_defaults.interval.as_millis()).unwrap_or(1000);
        let broadcast_interval = Duration::from_millis(parse_env_or(
            &lookup,
            "BJ_BROADCAST_INTERVAL_MS",
            default_interval,
        )?);
        let discovery = !overrides.no_discovery && parse_env_or(&lookup, "BJ_DISCOVERY", true)?;

        Ok(Self {
            server_name,
            bind,
            max_sessions,
            read_timeout,
            broadcast_addr,
            broadcast_interval,
            discovery,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "BJ_SERVER_NAME".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.server_name.len() > NAME_LEN {
            tracing::warn!(
                "server name is longer than {NAME_LEN} bytes and will be truncated in offers"
            );
        }

        if self.discovery && self.broadcast_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "BJ_BROADCAST_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.discovery && self.broadcast_addr.port() == 0 {
            return Err(ConfigError::Invalid {
                var: "BJ_BROADCAST_ADDR".to_string(),
                reason: "Port must not be 0".to_string(),
            });
        }

        Ok(())
    }

    /// Library settings for [`blackjack::server::Server::bind`].
    #[must_use]
    pub fn into_settings(self) -> ServerSettings {
        let discovery = self.discovery.then_some(DiscoverySettings {
            target: self.broadcast_addr,
            interval: self.broadcast_interval,
            ..DiscoverySettings::default()
        });
        ServerSettings {
            server_name: self.server_name,
            bind: self.bind,
            max_sessions: self.max_sessions,
            session: SessionSettings {
                read_timeout: self.read_timeout,
            },
            discovery,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot parse environment variable {var}={value:?}")]
    Unparsable { var: String, value: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an environment variable with default fallback when unset
fn parse_env_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Unparsable {
            var: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(CliOverrides::default(), lookup_from(&[])).unwrap();
        assert_eq!(config.server_name, "CyberCasino_7");
        assert_eq!(config.bind.to_string(), "0.0.0.0:0");
        assert_eq!(config.max_sessions, 5);
        assert_eq!(config.read_timeout, Some(Duration::from_secs(3000)));
        assert_eq!(config.broadcast_addr.to_string(), "255.255.255.255:13122");
        assert_eq!(config.broadcast_interval, Duration::from_secs(1));
        assert!(config.discovery);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_values() {
        let lookup = lookup_from(&[
            ("BJ_SERVER_NAME", "Table Nine"),
            ("BJ_BIND", "127.0.0.1:7000"),
            ("BJ_MAX_SESSIONS", "12"),
            ("BJ_READ_TIMEOUT_SECS", "0"),
            ("BJ_BROADCAST_ADDR", "192.168.1.255:13122"),
            ("BJ_BROADCAST_INTERVAL_MS", "250"),
            ("BJ_DISCOVERY", "false"),
        ]);
        let config = ServerConfig::from_lookup(CliOverrides::default(), lookup).unwrap();
        assert_eq!(config.server_name, "Table Nine");
        assert_eq!(config.bind.port(), 7000);
        assert_eq!(config.max_sessions, 12);
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.broadcast_interval, Duration::from_millis(250));
        assert!(!config.discovery);

        let settings = config.into_settings();
        assert!(settings.discovery.is_none());
        assert_eq!(settings.session.read_timeout, None);
    }

    #[test]
    fn test_cli_overrides_win() {
        let lookup = lookup_from(&[("BJ_SERVER_NAME", "FromEnv"), ("BJ_MAX_SESSIONS", "3")]);
        let overrides = CliOverrides {
            name: Some("FromCli".to_string()),
            bind: Some("127.0.0.1:9999".parse().unwrap()),
            max_sessions: Some(8),
            no_discovery: true,
        };
        let config = ServerConfig::from_lookup(overrides, lookup).unwrap();
        assert_eq!(config.server_name, "FromCli");
        assert_eq!(config.bind.port(), 9999);
        assert_eq!(config.max_sessions, 8);
        assert!(!config.discovery);
    }

    #[test]
    fn test_unparsable_value() {
        let lookup = lookup_from(&[("BJ_MAX_SESSIONS", "lots")]);
        let err = ServerConfig::from_lookup(CliOverrides::default(), lookup).unwrap_err();
        assert!(matches!(err, ConfigError::Unparsable { ref var, .. } if var == "BJ_MAX_SESSIONS"));
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn test_config_validation_empty_name() {
        let lookup = lookup_from(&[("BJ_SERVER_NAME", "  ")]);
        let config = ServerConfig::from_lookup(CliOverrides::default(), lookup).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("BJ_SERVER_NAME"));
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let lookup = lookup_from(&[("BJ_BROADCAST_INTERVAL_MS", "0")]);
        let config = ServerConfig::from_lookup(CliOverrides::default(), lookup).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));

        let overrides = CliOverrides {
            no_discovery: true,
            ..CliOverrides::default()
        };
        let lookup = lookup_from(&[("BJ_BROADCAST_INTERVAL_MS", "0")]);
        let config = ServerConfig::from_lookup(overrides, lookup).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_into_settings_carries_discovery() {
        let config = ServerConfig::from_lookup(CliOverrides::default(), lookup_from(&[])).unwrap();
        let settings = config.into_settings();
        let discovery = settings.discovery.unwrap();
        assert_eq!(discovery.target.port(), 13122);
        assert_eq!(settings.server_name, "CyberCasino_7");
    }
}
