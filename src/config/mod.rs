//! Client configuration.
//!
//! Every value has a documented default and can be overridden either through
//! the builder setters or through environment variables (see [`ClientConfig::from_env`]).

mod endpoint;

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub use endpoint::{ClusterEndpoint, join_endpoints, parse_endpoints};

use crate::error::ConfigError;

/// Environment keys read by [`ClientConfig::from_env`].
pub mod keys {
    pub const REMOTE_CACHE_ADD: &str = "REMOTE_CACHE_ADD";
    pub const CACHE_EXP_TIMEOUT: &str = "CACHE_EXP_TIMEOUT";
    pub const SLOW_CLIENT_QUEUE_LIMIT: &str = "SLOW_CLIENT_QUEUE_LIMIT";
    pub const IDLE_CON_TIMEOUT: &str = "IDLE_CON_TIMEOUT";
    pub const JOIN_TIMEOUT: &str = "JOIN_TIMEOUT";
    pub const WORKER_BLOCKED_TIMEOUT: &str = "WORKER_BLOCKED_TIMEOUT";
    pub const WORKER_BLOCKED_ACTION: &str = "WORKER_BLOCKED_ACTION";
}

pub const DEFAULT_ENDPOINTS: &str = "127.0.0.1:47500..47509";
pub const DEFAULT_CACHE_EXPIRY_MINUTES: u64 = 30;
pub const DEFAULT_SLOW_CLIENT_QUEUE_LIMIT: u32 = 1000;
pub const DEFAULT_IDLE_CONNECTION_TIMEOUT_MS: u64 = 10 * 60_000;
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_WORKER_BLOCKED_TIMEOUT_MS: u64 = 6_000_000;

/// Longest accepted region expiry (100 years). The backing store refuses
/// idle timeouts beyond 1000 years.
pub const MAX_CACHE_EXPIRY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// What the client does when the cluster reports a blocked internal worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerBlockedAction {
    /// Log and keep serving; the failing call still returns an error.
    #[default]
    Ignore,
    /// Treat it as fatal and stop the client.
    Stop,
}

impl FromStr for WorkerBlockedAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "stop" => Ok(Self::Stop),
            _ => Err(ConfigError::InvalidValue {
                key: keys::WORKER_BLOCKED_ACTION,
                value: s.to_string(),
            }),
        }
    }
}

/// Detection of hung cluster workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    pub worker_blocked_timeout: Duration,
    pub action: WorkerBlockedAction,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            worker_blocked_timeout: Duration::from_millis(DEFAULT_WORKER_BLOCKED_TIMEOUT_MS),
            action: WorkerBlockedAction::Ignore,
        }
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Discovery seeds used to locate cluster members.
    pub endpoints: Vec<ClusterEndpoint>,

    /// Idle expiry applied to every region entry.
    /// Each read or write resets the clock.
    pub cache_expiry: Duration,

    /// Outbound messages buffered for a peer before it is treated as unresponsive.
    pub slow_client_queue_limit: u32,

    pub idle_connection_timeout: Duration,

    /// Upper bound on the membership handshake at startup.
    pub join_timeout: Duration,

    pub failure_policy: FailurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![ClusterEndpoint::local_default()],
            cache_expiry: Duration::from_secs(DEFAULT_CACHE_EXPIRY_MINUTES * 60),
            slow_client_queue_limit: DEFAULT_SLOW_CLIENT_QUEUE_LIMIT,
            idle_connection_timeout: Duration::from_millis(DEFAULT_IDLE_CONNECTION_TIMEOUT_MS),
            join_timeout: Duration::from_millis(DEFAULT_JOIN_TIMEOUT_MS),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create a config with the given comma-separated seed list and default policy.
    pub fn with_endpoints(list: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoints: parse_endpoints(list)?,
            ..Default::default()
        })
    }

    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// Missing keys fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoints = lookup(keys::REMOTE_CACHE_ADD)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINTS.to_string());

        let expiry_minutes = parse_key(
            &lookup,
            keys::CACHE_EXP_TIMEOUT,
            DEFAULT_CACHE_EXPIRY_MINUTES,
        )?;
        let action = match lookup(keys::WORKER_BLOCKED_ACTION) {
            Some(raw) => raw.parse()?,
            None => WorkerBlockedAction::default(),
        };

        let config = Self {
            endpoints: parse_endpoints(&endpoints)?,
            cache_expiry: Duration::from_secs(expiry_minutes.saturating_mul(60)),
            slow_client_queue_limit: parse_key(
                &lookup,
                keys::SLOW_CLIENT_QUEUE_LIMIT,
                DEFAULT_SLOW_CLIENT_QUEUE_LIMIT,
            )?,
            idle_connection_timeout: Duration::from_millis(parse_key(
                &lookup,
                keys::IDLE_CON_TIMEOUT,
                DEFAULT_IDLE_CONNECTION_TIMEOUT_MS,
            )?),
            join_timeout: Duration::from_millis(parse_key(
                &lookup,
                keys::JOIN_TIMEOUT,
                DEFAULT_JOIN_TIMEOUT_MS,
            )?),
            failure_policy: FailurePolicy {
                worker_blocked_timeout: Duration::from_millis(parse_key(
                    &lookup,
                    keys::WORKER_BLOCKED_TIMEOUT,
                    DEFAULT_WORKER_BLOCKED_TIMEOUT_MS,
                )?),
                action,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that every policy value is positive, the expiry is within
    /// [`MAX_CACHE_EXPIRY`], and at least one seed is set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        if self.cache_expiry > MAX_CACHE_EXPIRY {
            return Err(ConfigError::TooLarge {
                key: keys::CACHE_EXP_TIMEOUT,
                max: MAX_CACHE_EXPIRY,
            });
        }
        let checks = [
            (keys::CACHE_EXP_TIMEOUT, self.cache_expiry.is_zero()),
            (
                keys::SLOW_CLIENT_QUEUE_LIMIT,
                self.slow_client_queue_limit == 0,
            ),
            (keys::IDLE_CON_TIMEOUT, self.idle_connection_timeout.is_zero()),
            (keys::JOIN_TIMEOUT, self.join_timeout.is_zero()),
            (
                keys::WORKER_BLOCKED_TIMEOUT,
                self.failure_policy.worker_blocked_timeout.is_zero(),
            ),
        ];
        match checks.iter().find(|(_, bad)| *bad) {
            Some((key, _)) => Err(ConfigError::NotPositive { key: *key }),
            None => Ok(()),
        }
    }

    /// Set the discovery seeds (builder pattern).
    #[must_use]
    pub fn endpoints(mut self, endpoints: Vec<ClusterEndpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the idle expiry for region entries.
    #[must_use]
    pub fn cache_expiry(mut self, expiry: Duration) -> Self {
        self.cache_expiry = expiry;
        self
    }

    #[must_use]
    pub fn slow_client_queue_limit(mut self, limit: u32) -> Self {
        self.slow_client_queue_limit = limit;
        self
    }

    #[must_use]
    pub fn idle_connection_timeout(mut self, timeout: Duration) -> Self {
        self.idle_connection_timeout = timeout;
        self
    }

    /// Set the maximum time allowed to join the cluster.
    #[must_use]
    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

fn parse_key<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value: raw })
        }
        _ => Ok(default),
    }
}
