//! Server configuration loaded from environment variables.
//!
//! Every variable is namespaced by a caller-chosen prefix so several
//! services can share one environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `<PREFIX>_WEB_API_HOST` | `0.0.0.0:8080` |
//! | `<PREFIX>_WEB_READ_TIMEOUT` | `5s` |
//! | `<PREFIX>_WEB_SHUTDOWN_TIMEOUT` | `5s` |
//!
//! Durations take a `ms`, `s` or `m` suffix; a bare number means seconds.
//! A `.env` file in the working directory is loaded first, if present.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub api_host: SocketAddr,
    pub read_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Reads the configuration for `prefix` (e.g. `"YOURSERVICE"`).
    pub fn from_env(prefix: &str) -> Result<Self, Error> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(prefix, |name| env::var(name).ok())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();
        let var = |key: &str| {
            let name = format!("{prefix}_WEB_{key}");
            lookup(&name).filter(|v| !v.trim().is_empty()).map(|v| (name, v))
        };

        let api_host = match var("API_HOST") {
            Some((name, v)) => v
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("{name}={v:?}: {e}")))?,
            None => defaults.api_host,
        };

        let duration = |key: &str, default: Duration| match var(key) {
            Some((name, v)) => parse_duration(&v)
                .ok_or_else(|| Error::Config(format!("{name}={v:?}: expected a duration like 500ms, 5s or 1m"))),
            None => Ok(default),
        };

        Ok(Self {
            api_host,
            read_timeout: duration("READ_TIMEOUT", defaults.read_timeout)?,
            shutdown_timeout: duration("SHUTDOWN_TIMEOUT", defaults.shutdown_timeout)?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: SocketAddr::from(([0, 0, 0, 0], 8080)),
            read_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse().ok().map(Duration::from_millis);
    }
    if let Some(secs) = s.strip_suffix('s') {
        return secs.trim().parse().ok().map(Duration::from_secs);
    }
    if let Some(mins) = s.strip_suffix('m') {
        return mins.trim().parse::<u64>().ok()?.checked_mul(60).map(Duration::from_secs);
    }
    s.parse().ok().map(Duration::from_secs)
}
