//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration with runtime values.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port to listen on.
    pub listen: SocketAddr,
    /// Origins allowed by CORS on the non-payment routes.
    pub allowed_origins: Vec<String>,
    /// Per-client limit on the non-payment routes.
    pub rate_limit: RateLimitConfig,
}

/// Requests allowed per client IP within a window.
///
/// A client may burst up to `max_requests`; afterwards one request is
/// replenished every `window / max_requests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    /// Interval after which one more request is allowed. `None` when either
    /// bound is zero.
    pub fn replenish_interval(&self) -> Option<Duration> {
        if self.max_requests == 0 {
            return None;
        }
        Some(self.window / self.max_requests).filter(|d| !d.is_zero())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_replenishes_every_nine_seconds() {
        let limit = RateLimitConfig::default();
        assert_eq!(limit.replenish_interval(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn test_zero_bounds_have_no_interval() {
        let no_requests = RateLimitConfig {
            max_requests: 0,
            window: Duration::from_secs(60),
        };
        let no_window = RateLimitConfig {
            max_requests: 10,
            window: Duration::ZERO,
        };
        assert_eq!(no_requests.replenish_interval(), None);
        assert_eq!(no_window.replenish_interval(), None);
    }
}
