//! Client configuration.
//!
//! Everything here is fixed once the client is built: there are no
//! per-request overrides for timeouts, pooling or retries.

use std::time::Duration;

use crate::modules::interceptors::RetryPolicy;

/// Connect/write/read timeouts applied to every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub connect: Duration,
    pub write: Duration,
    pub read: Duration,
}

impl TimeoutConfig {
    /// Upper bound for a whole exchange.
    ///
    /// reqwest has no dedicated write timeout, so the write budget is folded
    /// into the overall request deadline.
    pub fn total(&self) -> Duration {
        self.connect + self.write + self.read
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(60),
            write: Duration::from_secs(60),
            read: Duration::from_secs(100),
        }
    }
}

/// Shared connection pool bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 32,
            idle_timeout: Duration::from_secs(5),
        }
    }
}

/// Top-level configuration consumed by [`crate::RequestsBuilder`].
#[derive(Debug, Clone)]
pub struct RequestsConfig {
    pub timeouts: TimeoutConfig,
    pub pool: PoolConfig,
    pub retry: RetryPolicy,
    /// Headers injected into every request unless the caller sets them.
    pub default_headers: Vec<(String, String)>,
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            pool: PoolConfig::default(),
            retry: RetryPolicy::default(),
            default_headers: default_headers(),
        }
    }
}

fn default_headers() -> Vec<(String, String)> {
    vec![
        ("User-Agent".into(), format!("requests-rs/{}", crate::VERSION)),
        ("Accept".into(), "*/*".into()),
        ("Accept-Language".into(), "zh-CN,zh;q=0.9,en;q=0.8".into()),
        ("Connection".into(), "keep-alive".into()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shared_client() {
        let config = RequestsConfig::default();
        assert_eq!(config.timeouts.connect, Duration::from_secs(60));
        assert_eq!(config.timeouts.read, Duration::from_secs(100));
        assert_eq!(config.timeouts.total(), Duration::from_secs(220));
        assert_eq!(config.pool.max_idle_per_host, 32);
        assert_eq!(config.pool.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.default_headers.iter().any(|(name, _)| name == "User-Agent"));
    }
}
