use std::env;
use std::time::Duration;

use crate::{RelayError, RelayResult};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ping_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT` and `PING_INTERVAL_SECS`, falling back to defaults for unset keys.
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            if host.trim().is_empty() {
                return Err(RelayError::Config {
                    key: "HOST",
                    reason: "host cannot be empty".to_string(),
                });
            }
            config.host = host.trim().to_string();
        }

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().map_err(|e| RelayError::Config {
                key: "PORT",
                reason: format!("{}", e),
            })?;
        }

        if let Some(secs) = lookup("PING_INTERVAL_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| RelayError::Config {
                key: "PING_INTERVAL_SECS",
                reason: format!("{}", e),
            })?;
            if secs == 0 {
                return Err(RelayError::Config {
                    key: "PING_INTERVAL_SECS",
                    reason: "interval must be at least one second".to_string(),
                });
            }
            config.ping_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
