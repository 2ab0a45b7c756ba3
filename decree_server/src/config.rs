//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Room defaults configuration
    pub room_defaults: RoomDefaultsConfig,
    /// How often the idle-room sweep runs
    pub sweep_interval: Duration,
}

/// Default room configuration
#[derive(Debug, Clone)]
pub struct RoomDefaultsConfig {
    /// Maximum players per room
    pub max_players: usize,
    /// Maximum concurrently open rooms
    pub max_rooms: usize,
    /// Minutes of inactivity before a room is swept
    pub idle_timeout_minutes: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a set variable fails to parse or validation fails.
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(|| {
                "127.0.0.1:6969"
                    .parse()
                    .expect("default bind address is valid")
            });

        let room_defaults = RoomDefaultsConfig {
            max_players: parse_env_or("ROOM_MAX_PLAYERS", 8),
            max_rooms: parse_env_or("MAX_ROOMS", 1000),
            idle_timeout_minutes: parse_env_or("ROOM_IDLE_TIMEOUT_MINUTES", 30),
        };

        let sweep_interval_secs: u64 = parse_env_or("ROOM_SWEEP_INTERVAL_SECS", 60);

        let config = ServerConfig {
            bind,
            room_defaults,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room_defaults.max_players < 2 {
            return Err(ConfigError::Invalid {
                var: "ROOM_MAX_PLAYERS".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if self.room_defaults.max_players > 23 {
            return Err(ConfigError::Invalid {
                var: "ROOM_MAX_PLAYERS".to_string(),
                reason: "Must be at most 23 (max players with a 52-card deck)".to_string(),
            });
        }

        if self.room_defaults.max_rooms == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_ROOMS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.room_defaults.idle_timeout_minutes == 0 {
            return Err(ConfigError::Invalid {
                var: "ROOM_IDLE_TIMEOUT_MINUTES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "ROOM_MAX_PLAYERS".to_string(),
            reason: "too small".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ROOM_MAX_PLAYERS"));
        assert!(msg.contains("too small"));
    }

    #[test]
    fn test_config_validation_max_players_too_low() {
        let config = ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            room_defaults: RoomDefaultsConfig {
                max_players: 1,
                max_rooms: 10,
                idle_timeout_minutes: 30,
            },
            sweep_interval: Duration::from_secs(60),
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_max_players_too_high() {
        let config = ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            room_defaults: RoomDefaultsConfig {
                max_players: 24,
                max_rooms: 10,
                idle_timeout_minutes: 30,
            },
            sweep_interval: Duration::from_secs(60),
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_defaults_are_valid() {
        let config = ServerConfig {
            bind: "127.0.0.1:6969".parse().unwrap(),
            room_defaults: RoomDefaultsConfig {
                max_players: 8,
                max_rooms: 1000,
                idle_timeout_minutes: 30,
            },
            sweep_interval: Duration::from_secs(60),
        };
        assert!(config.validate().is_ok());
    }
}
