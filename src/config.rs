use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::time::Duration;
use crate::{Result, SeriesError};

/// Length of the default range query window: the last 24 hours.
pub const DEFAULT_QUERY_WINDOW_SECS: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How far back a range query reaches when `start` is omitted.
    pub query_window_secs: i64,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            query_window_secs: DEFAULT_QUERY_WINDOW_SECS,
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Default::default()
        }
    }

    /// Reads `HOST`, `PORT`, `QUERY_WINDOW_SECS` and `ENABLE_CORS`, falling back
    /// to the defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            query_window_secs: parse_var("QUERY_WINDOW_SECS", defaults.query_window_secs)?,
            enable_cors: parse_var("ENABLE_CORS", defaults.enable_cors)?,
        })
    }

    pub fn with_query_window_secs(mut self, secs: i64) -> Self {
        self.query_window_secs = secs;
        self
    }

    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    pub fn query_window(&self) -> Duration {
        Duration::seconds(self.query_window_secs)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| SeriesError::Config(format!("invalid bind address {}:{}: {}", self.host, self.port, e)))
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| SeriesError::Config(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(default),
    }
}
