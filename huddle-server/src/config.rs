//! Server configuration.
//!
//! Loaded from `HUDDLE_*` environment variables. The TURN credential is
//! redacted in Debug output.

use huddle_core::model::IceServerConfig;
use huddle_core::utils::default_ice_servers;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

pub const DEFAULT_LIVENESS_SECS: u64 = 30;

pub const MAX_LIVENESS_SECS: u64 = 3600;

pub const DEFAULT_FETCH_LIMIT: u32 = 100;

pub const DEFAULT_MAX_FETCH_LIMIT: u32 = 500;

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Smallest payload cap that still fits a realistic ICE candidate.
pub const MIN_PAYLOAD_BYTES: usize = 256;

pub const DEFAULT_ROOM_IDLE_SECS: u64 = 3600;

pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 60;

#[derive(Clone, PartialEq, Eq)]
pub struct TurnConfig {
    pub url: String,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Clone)]
pub struct Config {
    /// Listen address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Participants silent for longer than this are no longer present.
    pub liveness_secs: u64,

    /// Upper bound on `limit` for signal fetches.
    pub max_fetch_limit: u32,

    /// Upper bound on the serialized size of a signal payload.
    pub max_payload_bytes: usize,

    /// Rooms with no activity for this long and nobody present are dropped.
    pub room_idle_secs: u64,

    pub prune_interval_secs: u64,

    /// STUN urls handed to clients. Empty means the public default set.
    pub stun_urls: Vec<String>,

    pub turn: Option<TurnConfig>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("liveness_secs", &self.liveness_secs)
            .field("max_fetch_limit", &self.max_fetch_limit)
            .field("max_payload_bytes", &self.max_payload_bytes)
            .field("room_idle_secs", &self.room_idle_secs)
            .field("prune_interval_secs", &self.prune_interval_secs)
            .field("stun_urls", &self.stun_urls)
            .field("turn_url", &self.turn.as_ref().map(|t| &t.url))
            .field(
                "turn_credential",
                &self.turn.as_ref().and_then(|t| t.credential.as_ref()).map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            liveness_secs: DEFAULT_LIVENESS_SECS,
            max_fetch_limit: DEFAULT_MAX_FETCH_LIMIT,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            room_idle_secs: DEFAULT_ROOM_IDLE_SECS,
            prune_interval_secs: DEFAULT_PRUNE_INTERVAL_SECS,
            stun_urls: Vec::new(),
            turn: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid liveness window: {0}")]
    InvalidLiveness(String),

    #[error("Invalid fetch limit: {0}")]
    InvalidFetchLimit(String),

    #[error("Invalid payload limit: {0}")]
    InvalidPayloadLimit(String),

    #[error("Invalid pruning configuration: {0}")]
    InvalidPruning(String),

    #[error("Invalid TURN configuration: {0}")]
    InvalidTurn(String),
}

fn parse_number<N: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: N,
    err: fn(String) -> ConfigError,
) -> Result<N, ConfigError>
where
    N::Err: fmt::Display,
{
    match vars.get(key) {
        Some(value) => value.trim().parse().map_err(|e| {
            err(format!(
                "{} must be a valid positive integer, got '{}': {}",
                key, value, e
            ))
        }),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("HUDDLE_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let liveness_secs = parse_number(
            vars,
            "HUDDLE_LIVENESS_SECS",
            DEFAULT_LIVENESS_SECS,
            ConfigError::InvalidLiveness,
        )?;
        if liveness_secs == 0 || liveness_secs > MAX_LIVENESS_SECS {
            return Err(ConfigError::InvalidLiveness(format!(
                "HUDDLE_LIVENESS_SECS must be between 1 and {}, got {}",
                MAX_LIVENESS_SECS, liveness_secs
            )));
        }

        let max_fetch_limit = parse_number(
            vars,
            "HUDDLE_MAX_FETCH_LIMIT",
            DEFAULT_MAX_FETCH_LIMIT,
            ConfigError::InvalidFetchLimit,
        )?;
        if max_fetch_limit == 0 {
            return Err(ConfigError::InvalidFetchLimit(
                "HUDDLE_MAX_FETCH_LIMIT must be greater than 0".to_string(),
            ));
        }

        let max_payload_bytes = parse_number(
            vars,
            "HUDDLE_MAX_PAYLOAD_BYTES",
            DEFAULT_MAX_PAYLOAD_BYTES,
            ConfigError::InvalidPayloadLimit,
        )?;
        if max_payload_bytes < MIN_PAYLOAD_BYTES {
            return Err(ConfigError::InvalidPayloadLimit(format!(
                "HUDDLE_MAX_PAYLOAD_BYTES must be at least {}, got {}",
                MIN_PAYLOAD_BYTES, max_payload_bytes
            )));
        }

        let room_idle_secs = parse_number(
            vars,
            "HUDDLE_ROOM_IDLE_SECS",
            DEFAULT_ROOM_IDLE_SECS,
            ConfigError::InvalidPruning,
        )?;
        let prune_interval_secs = parse_number(
            vars,
            "HUDDLE_PRUNE_INTERVAL_SECS",
            DEFAULT_PRUNE_INTERVAL_SECS,
            ConfigError::InvalidPruning,
        )?;
        if room_idle_secs == 0 || prune_interval_secs == 0 {
            return Err(ConfigError::InvalidPruning(
                "HUDDLE_ROOM_IDLE_SECS and HUDDLE_PRUNE_INTERVAL_SECS must be greater than 0"
                    .to_string(),
            ));
        }

        let stun_urls = vars
            .get("HUDDLE_STUN_URLS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let turn = match vars.get("HUDDLE_TURN_URL").map(|u| u.trim()) {
            Some(url) if !url.is_empty() => {
                if !(url.starts_with("turn:") || url.starts_with("turns:")) {
                    return Err(ConfigError::InvalidTurn(format!(
                        "HUDDLE_TURN_URL must start with turn: or turns:, got '{}'",
                        url
                    )));
                }
                Some(TurnConfig {
                    url: url.to_string(),
                    username: vars.get("HUDDLE_TURN_USERNAME").cloned(),
                    credential: vars.get("HUDDLE_TURN_CREDENTIAL").cloned(),
                })
            }
            _ => None,
        };

        Ok(Config {
            bind_address,
            liveness_secs,
            max_fetch_limit,
            max_payload_bytes,
            room_idle_secs,
            prune_interval_secs,
            stun_urls,
            turn,
        })
    }

    pub fn liveness(&self) -> Duration {
        Duration::from_secs(self.liveness_secs)
    }

    pub fn room_idle(&self) -> Duration {
        Duration::from_secs(self.room_idle_secs)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs)
    }

    /// STUN entry (configured or default) followed by the TURN entry, if any.
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = if self.stun_urls.is_empty() {
            default_ice_servers()
        } else {
            vec![IceServerConfig {
                urls: self.stun_urls.clone(),
                username: None,
                credential: None,
            }]
        };
        if let Some(turn) = &self.turn {
            servers.push(IceServerConfig {
                urls: vec![turn.url.clone()],
                username: turn.username.clone(),
                credential: turn.credential.clone(),
            });
        }
        servers
    }
}
